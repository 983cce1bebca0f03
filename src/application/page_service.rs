// Page service - Use cases behind each view: load, bulk actions, cell updates
use crate::application::dispatcher::{ActionDispatcher, BulkReport};
use crate::application::history_service::{self, AssetHistory};
use crate::application::sheet_repository::{Ack, WriteRequest};
use crate::domain::error::DashboardError;
use crate::domain::status::SeveritySummary;
use crate::domain::table::{Row, Table};
use crate::domain::user::Role;
use crate::domain::view::{BulkAction, ColumnKind, ColumnSpec, View, ViewSchema};
use crate::infrastructure::config::{AuthSettings, ViewsConfig};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    /// Asset identifier for the history view.
    pub asset_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageModel {
    pub schema: ViewSchema,
    pub columns: Vec<ColumnSpec>,
    /// Displayable rows with their sheet locators.
    pub rows: Vec<(u32, Row)>,
    /// Rows left out because their identifier was blank.
    pub skipped: usize,
    pub error: Option<DashboardError>,
    pub summary: Option<SeveritySummary>,
    pub history: Option<AssetHistory>,
}

impl PageModel {
    pub fn load_failed(&self) -> bool {
        self.error.as_ref().is_some_and(DashboardError::is_load_failure)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub id: String,
    pub password: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BulkCommand {
    Move(Vec<u32>),
    Delete(Vec<u32>),
    /// Free text, one `code name` item per line.
    Add(String),
    AddUser(NewUser),
}

impl BulkCommand {
    pub fn action(&self) -> BulkAction {
        match self {
            BulkCommand::Move(_) => BulkAction::Move,
            BulkCommand::Delete(_) => BulkAction::Delete,
            BulkCommand::Add(_) => BulkAction::Add,
            BulkCommand::AddUser(_) => BulkAction::AddUser,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkOutcome {
    pub report: BulkReport,
    /// Input lines or selected rows that were not acted on.
    pub skipped: usize,
}

impl BulkOutcome {
    pub fn notice(&self) -> String {
        let mut notice = match &self.report.failure {
            None => format!("ดำเนินการสำเร็จ {} รายการ", self.report.completed),
            Some((_, e)) => format!(
                "ดำเนินการสำเร็จ {} จาก {} รายการ แล้วหยุดเพราะ: {}",
                self.report.completed, self.report.attempted, e
            ),
        };
        if self.skipped > 0 {
            notice.push_str(&format!(" (ข้าม {} รายการที่ข้อมูลไม่ครบ)", self.skipped));
        }
        notice
    }
}

/// Apply a view schema to a normalized table. Declared columns are kept when
/// the table's column set carries their key; rows without an identifier are
/// dropped and counted. Locators are taken before filtering so positional
/// fallbacks still line up with the sheet.
pub fn apply_schema(table: &Table, schema: &ViewSchema, header_offset: u32) -> (Vec<ColumnSpec>, Vec<(u32, Row)>, usize) {
    let columns: Vec<ColumnSpec> = if schema.columns.is_empty() {
        table
            .columns
            .iter()
            .map(|c| ColumnSpec::new(c, ColumnKind::Text))
            .collect()
    } else if table.columns.is_empty() {
        schema.columns.clone()
    } else {
        let kept: Vec<ColumnSpec> = schema
            .columns
            .iter()
            .filter(|c| table.columns.iter().any(|t| t == c.value_key()))
            .cloned()
            .collect();
        if kept.len() < schema.columns.len() {
            tracing::warn!(
                "Sheet {} is missing {} declared column(s)",
                schema.sheet,
                schema.columns.len() - kept.len()
            );
        }
        kept
    };

    let mut rows = Vec::with_capacity(table.len());
    let mut skipped = 0;
    for (i, row) in table.rows.iter().enumerate() {
        if row.get(&schema.primary).is_none_or(|v| v.is_blank()) {
            skipped += 1;
            continue;
        }
        rows.push((row.locator(i, header_offset), row.clone()));
    }

    (columns, rows, skipped)
}

/// Split bulk-add text into `(code, name)` items. Each line splits on the
/// first tab or comma, otherwise on the first run of whitespace. Lines
/// missing either field are skipped and counted.
pub fn parse_item_lines(text: &str) -> (Vec<(String, String)>, usize) {
    let mut items = Vec::new();
    let mut skipped = 0;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let split = line
            .split_once('\t')
            .or_else(|| line.split_once(','))
            .or_else(|| line.split_once(char::is_whitespace));

        match split.map(|(code, name)| (code.trim(), name.trim())) {
            Some((code, name)) if !code.is_empty() && !name.is_empty() => {
                items.push((code.to_string(), name.to_string()));
            }
            _ => skipped += 1,
        }
    }

    (items, skipped)
}

#[derive(Clone)]
pub struct PageService {
    dispatcher: ActionDispatcher,
    views: ViewsConfig,
    log_sheet: String,
    header_offset: u32,
    auth_columns: AuthSettings,
    rooms: Vec<String>,
    statuses: Vec<String>,
}

impl PageService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dispatcher: ActionDispatcher,
        views: ViewsConfig,
        log_sheet: String,
        header_offset: u32,
        auth_columns: AuthSettings,
        rooms: Vec<String>,
        statuses: Vec<String>,
    ) -> Self {
        Self {
            dispatcher,
            views,
            log_sheet,
            header_offset,
            auth_columns,
            rooms,
            statuses,
        }
    }

    pub fn schema(&self, view: View) -> Option<&ViewSchema> {
        self.views.schema(view)
    }

    pub async fn load(&self, view: View, request: &PageRequest) -> Option<PageModel> {
        let schema = self.schema(view)?.clone();
        let outcome = self.dispatcher.read_view(&schema).await;
        if outcome.load_failed() {
            tracing::warn!("Rendering {} without data", view);
        }
        let (columns, rows, skipped) = apply_schema(&outcome.table, &schema, self.header_offset);

        let summary = match view {
            View::Dashboard => schema
                .column_of_kind(ColumnKind::Status)
                .or_else(|| schema.column_of_kind(ColumnKind::StatusSelect))
                .map(|c| {
                    let statuses: Vec<String> = rows.iter().map(|(_, r)| r.text(c.value_key())).collect();
                    SeveritySummary::from_statuses(statuses.iter().map(String::as_str))
                }),
            _ => None,
        };

        let history = match (view, request.asset_id.as_deref()) {
            (View::History, Some(id)) if !id.trim().is_empty() => {
                Some(history_service::lookup(&schema, &rows, id))
            }
            _ => None,
        };

        Some(PageModel {
            schema,
            columns,
            rows,
            skipped,
            error: outcome.error,
            summary,
            history,
        })
    }

    pub async fn run_bulk(&self, view: View, role: Role, command: BulkCommand) -> Result<BulkOutcome, DashboardError> {
        let schema = self
            .schema(view)
            .ok_or_else(|| DashboardError::ValidationFailure(format!("unknown view {}", view)))?;

        let action = command.action();
        if !schema.supports(action) || (action == BulkAction::AddUser && role != Role::Admin) {
            return Err(DashboardError::ValidationFailure(format!(
                "{} is not available on {}",
                action.as_str(),
                view
            )));
        }

        tracing::info!("Running bulk {} on {}", action.as_str(), view);

        match command {
            BulkCommand::Move(locators) => self.bulk_move(schema, &locators).await,
            BulkCommand::Delete(locators) => {
                require_selection(&locators)?;
                Ok(BulkOutcome {
                    report: self.dispatcher.bulk_delete(&schema.sheet, &locators).await,
                    skipped: 0,
                })
            }
            BulkCommand::Add(text) => {
                let (items, skipped) = parse_item_lines(&text);
                if items.is_empty() {
                    return Err(DashboardError::ValidationFailure(
                        "ไม่มีรายการที่มีทั้งรหัสและชื่อ".to_string(),
                    ));
                }
                let name_column = schema.name_column.as_deref().unwrap_or("name");
                let items = items
                    .into_iter()
                    .map(|(code, name)| vec![(schema.primary.clone(), code), (name_column.to_string(), name)])
                    .collect();
                Ok(BulkOutcome {
                    report: self.dispatcher.bulk_add(&schema.sheet, items).await,
                    skipped,
                })
            }
            BulkCommand::AddUser(user) => {
                let fields = self.user_fields(user)?;
                Ok(BulkOutcome {
                    report: self.dispatcher.bulk_add(&schema.sheet, vec![fields]).await,
                    skipped: 0,
                })
            }
        }
    }

    async fn bulk_move(&self, schema: &ViewSchema, locators: &[u32]) -> Result<BulkOutcome, DashboardError> {
        require_selection(locators)?;

        // Re-read so the log gets the current row contents.
        let outcome = self.dispatcher.read_view(schema).await;
        if let Some(e) = outcome.error.filter(DashboardError::is_load_failure) {
            return Err(e);
        }

        let mut rows = Vec::with_capacity(locators.len());
        for locator in locators {
            match outcome.table.find_by_locator(*locator, self.header_offset) {
                Some((_, row)) => {
                    let fields = row
                        .cells
                        .iter()
                        .map(|(k, v)| (k.clone(), v.as_text()))
                        .collect();
                    rows.push((*locator, fields));
                }
                None => tracing::warn!("Row {} is no longer in sheet {}", locator, schema.sheet),
            }
        }

        let skipped = locators.len() - rows.len();
        Ok(BulkOutcome {
            report: self.dispatcher.bulk_move(&schema.sheet, &self.log_sheet, &rows).await,
            skipped,
        })
    }

    fn user_fields(&self, user: NewUser) -> Result<Vec<(String, String)>, DashboardError> {
        let id = user.id.trim();
        if id.is_empty() || user.password.is_empty() {
            return Err(DashboardError::ValidationFailure(
                "กรุณากรอกรหัสผู้ใช้และรหัสผ่าน".to_string(),
            ));
        }
        let role = Role::parse(&user.role)
            .ok_or_else(|| DashboardError::ValidationFailure(format!("unknown role {}", user.role)))?;

        let columns = &self.auth_columns;
        Ok(vec![
            (columns.id_column.clone(), id.to_string()),
            (columns.password_column.clone(), user.password),
            (columns.name_column.clone(), user.name.trim().to_string()),
            (columns.role_column.clone(), role.as_str().to_string()),
        ])
    }

    /// Write one value chosen in a select control back to the sheet.
    pub async fn update_cell(&self, view: View, row: u32, column: &str, value: &str) -> Result<Ack, DashboardError> {
        let schema = self
            .schema(view)
            .ok_or_else(|| DashboardError::ValidationFailure(format!("unknown view {}", view)))?;

        let spec = schema
            .column(column)
            .filter(|c| matches!(c.kind, ColumnKind::RoomSelect | ColumnKind::StatusSelect))
            .ok_or_else(|| DashboardError::ValidationFailure(format!("{} is not editable", column)))?;

        let choices = match spec.kind {
            ColumnKind::RoomSelect => &self.rooms,
            _ => &self.statuses,
        };
        if !choices.iter().any(|c| c == value) {
            return Err(DashboardError::ValidationFailure(format!("{} is not a valid choice", value)));
        }

        self.dispatcher
            .write(&WriteRequest::update(&schema.sheet, row, spec.value_key(), value))
            .await
    }
}

fn require_selection(locators: &[u32]) -> Result<(), DashboardError> {
    if locators.is_empty() {
        return Err(DashboardError::ValidationFailure("ยังไม่ได้เลือกรายการ".to_string()));
    }
    Ok(())
}
