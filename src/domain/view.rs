// View definitions - which sheet each page reads and how its columns render
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Dashboard,
    Wait,
    List,
    User,
    History,
}

impl View {
    pub const ALL: [View; 5] = [View::Dashboard, View::Wait, View::List, View::User, View::History];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Wait => "wait",
            View::List => "list",
            View::User => "user",
            View::History => "history",
        }
    }

    pub fn admin_only(&self) -> bool {
        matches!(self, View::User)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        View::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unknown view: {}", s))
    }
}

/// Response envelope a sheet is read through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    #[default]
    JsonArray,
    WrappedTable,
}

/// Semantic type of a column, deciding how its cells render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    #[default]
    Text,
    Date,
    Time,
    Status,
    StatusSelect,
    RoomSelect,
    Qr,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnSpec {
    pub key: String,
    pub label: Option<String>,
    #[serde(default)]
    pub kind: ColumnKind,
    /// Row key the value is read from, when it differs from `key`.
    pub source: Option<String>,
}

impl ColumnSpec {
    pub fn new(key: &str, kind: ColumnKind) -> Self {
        Self {
            key: key.to_string(),
            label: None,
            kind,
            source: None,
        }
    }

    pub fn value_key(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.key)
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    /// Copy each selected row into the log sheet, then delete it from the source.
    Move,
    Delete,
    /// Add items parsed from free text, one per line.
    Add,
    AddUser,
}

impl BulkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::Move => "move",
            BulkAction::Delete => "delete",
            BulkAction::Add => "add",
            BulkAction::AddUser => "add_user",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BulkAction::Move => "ย้ายไปบันทึก",
            BulkAction::Delete => "ลบที่เลือก",
            BulkAction::Add => "เพิ่มรายการ",
            BulkAction::AddUser => "เพิ่มผู้ใช้",
        }
    }

    /// Whether the action works on the current row selection.
    pub fn uses_selection(&self) -> bool {
        matches!(self, BulkAction::Move | BulkAction::Delete)
    }
}

impl FromStr for BulkAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "move" => Ok(BulkAction::Move),
            "delete" => Ok(BulkAction::Delete),
            "add" => Ok(BulkAction::Add),
            "add_user" => Ok(BulkAction::AddUser),
            other => Err(format!("unknown bulk action: {}", other)),
        }
    }
}

/// Explicit schema for one view: where it reads from and what it shows.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ViewSchema {
    pub view: View,
    pub title: String,
    pub sheet: String,
    #[serde(default)]
    pub source: SourceKind,
    /// Query string for wrapped-table sources.
    pub query: Option<String>,
    /// Positional field names for wrapped-table sources, whose data rows
    /// carry no column names.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Identifier column; rows where it is blank are not displayed.
    pub primary: String,
    /// Column holding the asset name, used by history lookups.
    pub name_column: Option<String>,
    #[serde(default)]
    pub bulk_actions: Vec<BulkAction>,
    /// Render a per-row link to the asset history view.
    #[serde(default)]
    pub history_link: bool,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

impl ViewSchema {
    pub fn column(&self, key: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Column of the given kind, if the schema declares one.
    pub fn column_of_kind(&self, kind: ColumnKind) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.kind == kind)
    }

    pub fn supports(&self, action: BulkAction) -> bool {
        self.bulk_actions.contains(&action)
    }
}
