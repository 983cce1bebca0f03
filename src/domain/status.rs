// Asset status severity classes

/// Visual category derived from a free-text status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Warning,
    Danger,
    Neutral,
}

const OPERATIONAL: &str = "ใช้งานได้";
const DAMAGED: &str = "ชำรุด";
const DEGRADED: &str = "เสื่อมสภาพ";
const REPAIR: &str = "ซ่อม";

impl Severity {
    /// Substring match on the trimmed, lower-cased status. Checked in order:
    /// operational, then damaged/degraded, then repair.
    pub fn classify(status: &str) -> Self {
        let status = status.trim().to_lowercase();
        if status.is_empty() {
            return Severity::Neutral;
        }

        if status.contains(OPERATIONAL) {
            Severity::Success
        } else if status.contains(DAMAGED) || status.contains(DEGRADED) {
            Severity::Danger
        } else if status.contains(REPAIR) {
            Severity::Warning
        } else {
            Severity::Neutral
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
            Severity::Neutral => "neutral",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Success => "ใช้งานได้",
            Severity::Warning => "ส่งซ่อม",
            Severity::Danger => "ชำรุด/เสื่อมสภาพ",
            Severity::Neutral => "ไม่ระบุ",
        }
    }

    pub const ALL: [Severity; 4] = [
        Severity::Success,
        Severity::Warning,
        Severity::Danger,
        Severity::Neutral,
    ];
}

/// Per-severity counts shown as dashboard tiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeveritySummary {
    pub success: usize,
    pub warning: usize,
    pub danger: usize,
    pub neutral: usize,
}

impl SeveritySummary {
    pub fn from_statuses<'a>(statuses: impl IntoIterator<Item = &'a str>) -> Self {
        let mut summary = Self::default();
        for status in statuses {
            match Severity::classify(status) {
                Severity::Success => summary.success += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Danger => summary.danger += 1,
                Severity::Neutral => summary.neutral += 1,
            }
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Success => self.success,
            Severity::Warning => self.warning,
            Severity::Danger => self.danger,
            Severity::Neutral => self.neutral,
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.warning + self.danger + self.neutral
    }
}
