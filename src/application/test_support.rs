// In-memory sheet service for exercising the use cases
use crate::application::sheet_repository::{Ack, SheetRepository, SheetSource, WriteRequest};
use crate::domain::error::DashboardError;
use crate::domain::table::ColumnPolicy;
use crate::domain::view::{BulkAction, ColumnKind, ColumnSpec, SourceKind, View, ViewSchema};
use crate::infrastructure::config::{AppConfig, AuthSettings, DisplaySettings, ServerSettings, SheetSettings, ViewsConfig};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeSheetRepository {
    bodies: Mutex<HashMap<String, Result<String, DashboardError>>>,
    writes: Mutex<Vec<WriteRequest>>,
    /// Zero-based index of the write call that fails.
    fail_at: Option<usize>,
}

impl FakeSheetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(self, sheet: &str, body: &str) -> Self {
        self.bodies
            .lock()
            .unwrap()
            .insert(sheet.to_string(), Ok(body.to_string()));
        self
    }

    pub fn with_failure(self, sheet: &str, error: DashboardError) -> Self {
        self.bodies
            .lock()
            .unwrap()
            .insert(sheet.to_string(), Err(error));
        self
    }

    pub fn failing_write_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn writes(&self) -> Vec<WriteRequest> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl SheetRepository for FakeSheetRepository {
    async fn fetch(&self, source: &SheetSource) -> Result<String, DashboardError> {
        self.bodies
            .lock()
            .unwrap()
            .get(&source.sheet)
            .cloned()
            .unwrap_or_else(|| Err(DashboardError::Transport(format!("no sheet {}", source.sheet))))
    }

    async fn write(&self, request: &WriteRequest) -> Result<Ack, DashboardError> {
        let mut writes = self.writes.lock().unwrap();
        if self.fail_at == Some(writes.len()) {
            return Err(DashboardError::Transport("connection reset".to_string()));
        }
        writes.push(request.clone());
        Ok(Ack(serde_json::json!({ "result": "success" })))
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerSettings::default(),
        sheets: SheetSettings {
            endpoint: "http://sheets.test/exec".to_string(),
            table_query_endpoint: Some("http://sheets.test/gviz/tq".to_string()),
            login_sheet: "LOGIN".to_string(),
            log_sheet: "LOG".to_string(),
            row_id_key: "row".to_string(),
            header_offset: 2,
        },
        display: DisplaySettings {
            column_policy: ColumnPolicy::FirstRow,
            ..DisplaySettings::default()
        },
        auth: AuthSettings::default(),
    }
}

fn schema(view: View, sheet: &str, columns: Vec<ColumnSpec>, bulk_actions: Vec<BulkAction>) -> ViewSchema {
    ViewSchema {
        view,
        title: sheet.to_string(),
        sheet: sheet.to_string(),
        source: SourceKind::JsonArray,
        query: None,
        fields: Vec::new(),
        primary: "code".to_string(),
        name_column: Some("name".to_string()),
        bulk_actions,
        history_link: false,
        columns,
    }
}

pub fn test_views() -> ViewsConfig {
    let text = |k: &str| ColumnSpec::new(k, ColumnKind::Text);

    let mut dashboard = schema(
        View::Dashboard,
        "SHOW",
        vec![text("code"), text("name"), text("location"), ColumnSpec::new("status", ColumnKind::Status)],
        Vec::new(),
    );
    dashboard.source = SourceKind::WrappedTable;
    dashboard.fields = ["code", "name", "location", "status"].iter().map(|s| s.to_string()).collect();

    let mut list = schema(
        View::List,
        "DATA",
        vec![
            text("code"),
            text("name"),
            ColumnSpec::new("location", ColumnKind::RoomSelect),
            ColumnSpec::new("status", ColumnKind::StatusSelect),
            ColumnSpec {
                source: Some("code".to_string()),
                ..ColumnSpec::new("qr", ColumnKind::Qr)
            },
        ],
        vec![BulkAction::Add, BulkAction::Delete],
    );
    list.history_link = true;

    let mut user = schema(
        View::User,
        "MEMBER",
        vec![text("ID"), text("Name"), text("Status")],
        vec![BulkAction::AddUser, BulkAction::Delete],
    );
    user.primary = "ID".to_string();
    user.name_column = None;

    ViewsConfig {
        views: vec![
            dashboard,
            schema(
                View::Wait,
                "WAIT",
                vec![text("code"), text("name"), ColumnSpec::new("status", ColumnKind::Status)],
                vec![BulkAction::Move, BulkAction::Delete],
            ),
            list,
            user,
            schema(
                View::History,
                "LOG",
                vec![ColumnSpec::new("date", ColumnKind::Date), text("code"), text("name"), text("note")],
                Vec::new(),
            ),
        ],
    }
}
