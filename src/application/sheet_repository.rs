// Repository trait for the spreadsheet-backed service
use crate::domain::error::DashboardError;
use crate::domain::view::SourceKind;
use async_trait::async_trait;

/// Where a table is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSource {
    pub sheet: String,
    pub kind: SourceKind,
    /// Table query for wrapped-table sources.
    pub query: Option<String>,
}

impl SheetSource {
    pub fn json(sheet: &str) -> Self {
        Self {
            sheet: sheet.to_string(),
            kind: SourceKind::JsonArray,
            query: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Add,
    Update,
    Delete,
    AddLog,
}

impl WriteAction {
    /// Action name understood by the service.
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteAction::Add => "add",
            WriteAction::Update => "update",
            WriteAction::Delete => "delete",
            WriteAction::AddLog => "addLog",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    pub sheet: String,
    pub action: WriteAction,
    /// Target row locator for update and delete.
    pub row: Option<u32>,
    pub fields: Vec<(String, String)>,
}

impl WriteRequest {
    pub fn add(sheet: &str, fields: Vec<(String, String)>) -> Self {
        Self {
            sheet: sheet.to_string(),
            action: WriteAction::Add,
            row: None,
            fields,
        }
    }

    pub fn add_log(sheet: &str, fields: Vec<(String, String)>) -> Self {
        Self {
            action: WriteAction::AddLog,
            ..Self::add(sheet, fields)
        }
    }

    pub fn delete(sheet: &str, row: u32) -> Self {
        Self {
            sheet: sheet.to_string(),
            action: WriteAction::Delete,
            row: Some(row),
            fields: Vec::new(),
        }
    }

    pub fn update(sheet: &str, row: u32, column: &str, value: &str) -> Self {
        Self {
            sheet: sheet.to_string(),
            action: WriteAction::Update,
            row: Some(row),
            fields: vec![
                ("column".to_string(), column.to_string()),
                ("value".to_string(), value.to_string()),
            ],
        }
    }

    /// Form body pairs: `sheet`, `action`, `row` when targeted, then fields.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("sheet".to_string(), self.sheet.clone()),
            ("action".to_string(), self.action.as_str().to_string()),
        ];
        if let Some(row) = self.row {
            pairs.push(("row".to_string(), row.to_string()));
        }
        pairs.extend(self.fields.iter().cloned());
        pairs
    }
}

/// Whatever the service sends back for a write; non-JSON replies are kept as a string.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack(pub serde_json::Value);

impl Ack {
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body)
            .map(Ack)
            .unwrap_or_else(|_| Ack(serde_json::Value::String(body.trim().to_string())))
    }
}

#[async_trait]
pub trait SheetRepository: Send + Sync {
    /// Fetch the raw response body for a source
    async fn fetch(&self, source: &SheetSource) -> Result<String, DashboardError>;

    /// Perform a single named mutation
    async fn write(&self, request: &WriteRequest) -> Result<Ack, DashboardError>;
}
