// Cell value formatter - raw cells to HTML fragments plus their visible text
use crate::domain::status::Severity;
use crate::domain::table::{CellValue, DateLiteral};
use crate::domain::view::{ColumnKind, ColumnSpec};
use crate::infrastructure::config::DisplaySettings;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

/// Display settings the formatter needs.
#[derive(Debug, Clone)]
pub struct FormatContext {
    pub qr_endpoint: String,
    pub qr_size: String,
    pub offset: FixedOffset,
    pub rooms: Vec<String>,
    pub statuses: Vec<String>,
}

impl FormatContext {
    pub fn from_settings(settings: &DisplaySettings) -> Self {
        let hours = settings.utc_offset_hours;
        let offset = hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                tracing::warn!("Invalid UTC offset {}h, using UTC", hours);
                Utc.fix()
            });

        Self {
            qr_endpoint: settings.qr_endpoint.clone(),
            qr_size: settings.qr_size.clone(),
            offset,
            rooms: settings.rooms.clone(),
            statuses: settings.statuses.clone(),
        }
    }
}

/// A formatted cell: markup for the table and the text a reader sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    pub text: String,
}

impl Rendered {
    fn text(text: String) -> Self {
        Self {
            html: escape_html(&text),
            text,
        }
    }
}

const EMPTY: &str = "-";

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Format one cell for `column`. Never fails: anything that cannot be
/// decoded is shown as its escaped raw text.
pub fn format_cell(ctx: &FormatContext, column: &ColumnSpec, value: Option<&CellValue>, locator: u32) -> Rendered {
    let raw = value.map(CellValue::as_text).unwrap_or_default();

    match column.kind {
        ColumnKind::Text => Rendered::text(raw),
        ColumnKind::Date => Rendered::text(format_date(ctx, value, &raw)),
        ColumnKind::Time => Rendered::text(format_time(ctx, value, &raw)),
        ColumnKind::Status => status_badge(&raw),
        ColumnKind::StatusSelect => select_control(&ctx.statuses, column, &raw, locator),
        ColumnKind::RoomSelect => select_control(&ctx.rooms, column, &raw, locator),
        ColumnKind::Qr => qr_image(ctx, &raw),
    }
}

fn embedded_literal(value: Option<&CellValue>, raw: &str) -> Option<DateLiteral> {
    match value {
        Some(CellValue::Date(d)) => Some(*d),
        _ => DateLiteral::find(raw),
    }
}

/// `DD/MM/YYYY` from a date literal, an RFC 3339 timestamp or `YYYY-MM-DD`.
pub fn format_date(ctx: &FormatContext, value: Option<&CellValue>, raw: &str) -> String {
    if raw.trim().is_empty() {
        return EMPTY.to_string();
    }
    if let Some(literal) = embedded_literal(value, raw) {
        return literal.display_date();
    }

    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.with_timezone(&ctx.offset).format("%d/%m/%Y").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.format("%d/%m/%Y").to_string();
    }

    raw.to_string()
}

/// `HH:MM` from a date literal, an RFC 3339 timestamp or a bare time.
pub fn format_time(ctx: &FormatContext, value: Option<&CellValue>, raw: &str) -> String {
    if raw.trim().is_empty() {
        return EMPTY.to_string();
    }
    if let Some(literal) = embedded_literal(value, raw) {
        return literal.display_time();
    }

    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.with_timezone(&ctx.offset).format("%H:%M").to_string();
    }
    if let Ok(time) = NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
    {
        return time.format("%H:%M").to_string();
    }

    raw.to_string()
}

fn status_badge(raw: &str) -> Rendered {
    let severity = Severity::classify(raw);
    let label = if raw.trim().is_empty() { EMPTY } else { raw.trim() };
    Rendered {
        html: format!(
            r#"<span class="badge badge-{}">{}</span>"#,
            severity.css_class(),
            escape_html(label)
        ),
        text: raw.trim().to_string(),
    }
}

/// A select over a fixed enumeration. A current value outside the
/// enumeration is kept as the selected first option.
fn select_control(choices: &[String], column: &ColumnSpec, raw: &str, locator: u32) -> Rendered {
    let current = raw.trim();
    let mut options = String::new();

    if !current.is_empty() && !choices.iter().any(|c| c == current) {
        options.push_str(&format!(
            r#"<option value="{0}" selected>{0}</option>"#,
            escape_html(current)
        ));
    } else if current.is_empty() {
        options.push_str(r#"<option value="" selected>-</option>"#);
    }

    for choice in choices {
        let selected = if choice == current { " selected" } else { "" };
        options.push_str(&format!(
            r#"<option value="{0}"{1}>{0}</option>"#,
            escape_html(choice),
            selected
        ));
    }

    Rendered {
        html: format!(
            r#"<select class="cell-select" data-row="{}" data-column="{}">{}</select>"#,
            locator,
            escape_html(&column.key),
            options
        ),
        text: current.to_string(),
    }
}

fn qr_image(ctx: &FormatContext, raw: &str) -> Rendered {
    let value = raw.trim();
    if value.is_empty() {
        return Rendered::text(EMPTY.to_string());
    }

    let src = format!(
        "{}?size={}&data={}",
        ctx.qr_endpoint,
        urlencoding::encode(&ctx.qr_size),
        urlencoding::encode(value)
    );
    Rendered {
        html: format!(
            r#"<img class="qr" src="{}" alt="QR {}" loading="lazy">"#,
            escape_html(&src),
            escape_html(value)
        ),
        text: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> FormatContext {
        FormatContext::from_settings(&DisplaySettings::default())
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn format(kind: ColumnKind, value: &CellValue) -> Rendered {
        format_cell(&ctx(), &ColumnSpec::new("col", kind), Some(value), 7)
    }

    #[test]
    fn test_text_is_escaped() {
        let rendered = format(ColumnKind::Text, &text(r#"<b>"A&B's"</b>"#));
        assert_eq!(rendered.html, "&lt;b&gt;&quot;A&amp;B&#39;s&quot;&lt;/b&gt;");
        assert_eq!(rendered.text, r#"<b>"A&B's"</b>"#);
    }

    #[test]
    fn test_date_literal_decodes() {
        assert_eq!(format(ColumnKind::Date, &text("Date(2024,0,5)")).text, "05/01/2024");
        let literal = DateLiteral::find("Date(2024,0,5,13,4,0)").unwrap();
        assert_eq!(format(ColumnKind::Time, &CellValue::Date(literal)).text, "13:04");
    }

    #[test]
    fn test_generic_dates_use_display_offset() {
        // 17:30 UTC is 00:30 the next day at UTC+7
        let iso = text("2024-01-04T17:30:00.000Z");
        assert_eq!(format(ColumnKind::Date, &iso).text, "05/01/2024");
        assert_eq!(format(ColumnKind::Time, &iso).text, "00:30");
        assert_eq!(format(ColumnKind::Date, &text("2024-03-09")).text, "09/03/2024");
        assert_eq!(format(ColumnKind::Time, &text("08:15:00")).text, "08:15");
    }

    #[test]
    fn test_invalid_offset_falls_back_to_utc() {
        for hours in [30, i32::MAX] {
            let ctx = FormatContext::from_settings(&DisplaySettings {
                utc_offset_hours: hours,
                ..DisplaySettings::default()
            });
            assert_eq!(ctx.offset, Utc.fix());
        }
        assert_eq!(ctx().offset.local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn test_unrecognised_dates_pass_through() {
        assert_eq!(format(ColumnKind::Date, &text("sometime <soon>")).html, "sometime &lt;soon&gt;");
        assert_eq!(format(ColumnKind::Date, &text("")).text, "-");
        assert_eq!(format(ColumnKind::Date, &text("Date(2024,4294967295,1)")).text, "Date(2024,4294967295,1)");
        assert_eq!(format(ColumnKind::Time, &text("Date(2024,4294967295,1)")).text, "Date(2024,4294967295,1)");
        assert_eq!(format(ColumnKind::Time, &CellValue::Null).text, "-");
        assert_eq!(format_cell(&ctx(), &ColumnSpec::new("d", ColumnKind::Date), None, 0).text, "-");
    }

    #[test]
    fn test_status_badges() {
        assert!(format(ColumnKind::Status, &text("ชำรุด")).html.contains("badge-danger"));
        assert!(format(ColumnKind::Status, &text("ใช้งานได้")).html.contains("badge-success"));
        assert!(format(ColumnKind::Status, &text("ส่งซ่อม")).html.contains("badge-warning"));
        assert!(format(ColumnKind::Status, &text("")).html.contains("badge-neutral"));
    }

    #[test]
    fn test_status_select_marks_current_choice() {
        let rendered = format(ColumnKind::StatusSelect, &text("ชำรุด"));
        assert!(rendered.html.contains(r#"data-row="7""#));
        assert!(rendered.html.contains(r#"<option value="ชำรุด" selected>"#));
        assert_eq!(rendered.html.matches("selected").count(), 1);
        assert_eq!(rendered.text, "ชำรุด");
    }

    #[test]
    fn test_room_select_keeps_unknown_value() {
        let rendered = format(ColumnKind::RoomSelect, &text("Annex"));
        assert!(rendered.html.starts_with(r#"<select class="cell-select""#));
        assert!(rendered.html.contains(r#"<option value="Annex" selected>Annex</option>"#));
    }

    #[test]
    fn test_qr_image() {
        let rendered = format(ColumnKind::Qr, &text("C 100"));
        assert!(rendered.html.contains("create-qr-code/?size=120x120&amp;data=C%20100"));
        assert!(rendered.text.is_empty());
        assert_eq!(format(ColumnKind::Qr, &text(" ")).html, "-");
    }
}
