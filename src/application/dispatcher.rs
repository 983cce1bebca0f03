// Action dispatcher - reads tables and issues writes against the sheet service
use crate::application::sheet_repository::{Ack, SheetRepository, SheetSource, WriteRequest};
use crate::domain::error::DashboardError;
use crate::domain::table::{ColumnPolicy, Table};
use crate::domain::view::ViewSchema;
use crate::infrastructure::envelope::{normalize, NormalizeOptions};
use std::sync::Arc;

/// Result of a read. Load failures degrade to an empty table; `error` says why.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    pub table: Table,
    pub error: Option<DashboardError>,
}

impl ReadOutcome {
    pub fn load_failed(&self) -> bool {
        self.error.as_ref().is_some_and(DashboardError::is_load_failure)
    }
}

/// Progress of a sequential bulk operation. Writes before `failure` stay applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkReport {
    pub attempted: usize,
    pub completed: usize,
    pub failure: Option<(usize, DashboardError)>,
}

impl BulkReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Clone)]
pub struct ActionDispatcher {
    repository: Arc<dyn SheetRepository>,
    row_id_key: String,
    policy: ColumnPolicy,
}

impl ActionDispatcher {
    pub fn new(repository: Arc<dyn SheetRepository>, row_id_key: String, policy: ColumnPolicy) -> Self {
        Self {
            repository,
            row_id_key,
            policy,
        }
    }

    pub async fn read(&self, source: &SheetSource, fields: &[String]) -> ReadOutcome {
        let body = match self.repository.fetch(source).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Read of sheet {} failed: {}", source.sheet, e);
                return ReadOutcome {
                    table: Table::empty(),
                    error: Some(e),
                };
            }
        };

        let options = NormalizeOptions {
            row_id_key: &self.row_id_key,
            policy: self.policy,
            fields,
        };

        match normalize(source.kind, &body, &options) {
            Ok(table) if table.is_empty() => ReadOutcome {
                table,
                error: Some(DashboardError::EmptyResult),
            },
            Ok(table) => {
                tracing::debug!("Sheet {} returned {} rows", source.sheet, table.len());
                ReadOutcome { table, error: None }
            }
            Err(e) => {
                tracing::warn!("Could not normalize sheet {}: {}", source.sheet, e);
                ReadOutcome {
                    table: Table::empty(),
                    error: Some(e),
                }
            }
        }
    }

    pub async fn read_view(&self, schema: &ViewSchema) -> ReadOutcome {
        let source = SheetSource {
            sheet: schema.sheet.clone(),
            kind: schema.source,
            query: schema.query.clone(),
        };
        self.read(&source, &schema.fields).await
    }

    pub async fn write(&self, request: &WriteRequest) -> Result<Ack, DashboardError> {
        tracing::debug!(
            "Writing {} to sheet {} (row {:?})",
            request.action.as_str(),
            request.sheet,
            request.row
        );
        self.repository.write(request).await.inspect_err(|e| {
            tracing::error!(
                "Write {} on sheet {} failed: {}",
                request.action.as_str(),
                request.sheet,
                e
            );
        })
    }

    /// Issue `requests` one at a time, stopping at the first failure.
    pub async fn write_sequence(&self, requests: &[WriteRequest]) -> BulkReport {
        let mut report = BulkReport {
            attempted: requests.len(),
            ..BulkReport::default()
        };

        for (i, request) in requests.iter().enumerate() {
            match self.write(request).await {
                Ok(_) => report.completed += 1,
                Err(e) => {
                    report.failure = Some((i, e));
                    break;
                }
            }
        }

        report
    }

    /// Log every row, then delete every row, both in selection order.
    pub async fn bulk_move(
        &self,
        source_sheet: &str,
        log_sheet: &str,
        rows: &[(u32, Vec<(String, String)>)],
    ) -> BulkReport {
        let logs = rows
            .iter()
            .map(|(_, fields)| WriteRequest::add_log(log_sheet, fields.clone()));
        let deletes = rows
            .iter()
            .map(|(locator, _)| WriteRequest::delete(source_sheet, *locator));
        let requests: Vec<WriteRequest> = logs.chain(deletes).collect();

        self.write_sequence(&requests).await
    }

    pub async fn bulk_delete(&self, sheet: &str, locators: &[u32]) -> BulkReport {
        let requests: Vec<WriteRequest> = locators
            .iter()
            .map(|locator| WriteRequest::delete(sheet, *locator))
            .collect();
        self.write_sequence(&requests).await
    }

    pub async fn bulk_add(&self, sheet: &str, items: Vec<Vec<(String, String)>>) -> BulkReport {
        let requests: Vec<WriteRequest> = items
            .into_iter()
            .map(|fields| WriteRequest::add(sheet, fields))
            .collect();
        self.write_sequence(&requests).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sheet_repository::WriteAction;
    use crate::application::test_support::FakeSheetRepository;

    fn dispatcher(repo: Arc<FakeSheetRepository>) -> ActionDispatcher {
        ActionDispatcher::new(repo, "row".to_string(), ColumnPolicy::FirstRow)
    }

    fn fields(code: &str) -> Vec<(String, String)> {
        vec![("code".to_string(), code.to_string())]
    }

    #[tokio::test]
    async fn test_read_degrades_on_transport_error() {
        let repo = Arc::new(
            FakeSheetRepository::new()
                .with_failure("DATA", DashboardError::Transport("timeout".to_string())),
        );
        let outcome = dispatcher(repo).read(&SheetSource::json("DATA"), &[]).await;

        assert!(outcome.table.is_empty());
        assert!(outcome.load_failed());
    }

    #[tokio::test]
    async fn test_read_degrades_on_malformed_body() {
        let repo = Arc::new(FakeSheetRepository::new().with_body("DATA", "<html>Moved</html>"));
        let outcome = dispatcher(repo).read(&SheetSource::json("DATA"), &[]).await;

        assert!(outcome.table.is_empty());
        assert!(matches!(outcome.error, Some(DashboardError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_read_marks_empty_result() {
        let repo = Arc::new(FakeSheetRepository::new().with_body("DATA", "[]"));
        let outcome = dispatcher(repo).read(&SheetSource::json("DATA"), &[]).await;

        assert_eq!(outcome.error, Some(DashboardError::EmptyResult));
        assert!(!outcome.load_failed());
    }

    #[tokio::test]
    async fn test_bulk_move_logs_all_then_deletes_all_in_selection_order() {
        let repo = Arc::new(FakeSheetRepository::new());
        let rows = vec![(9, fields("C-9")), (3, fields("C-3")), (5, fields("C-5"))];

        let report = dispatcher(repo.clone()).bulk_move("WAIT", "LOG", &rows).await;
        assert!(report.succeeded());
        assert_eq!(report.completed, 6);

        let writes = repo.writes();
        let actions: Vec<WriteAction> = writes.iter().map(|w| w.action).collect();
        assert_eq!(
            actions,
            vec![
                WriteAction::AddLog,
                WriteAction::AddLog,
                WriteAction::AddLog,
                WriteAction::Delete,
                WriteAction::Delete,
                WriteAction::Delete,
            ]
        );
        let logged: Vec<&str> = writes[..3].iter().map(|w| w.fields[0].1.as_str()).collect();
        assert_eq!(logged, vec!["C-9", "C-3", "C-5"]);
        let deleted: Vec<Option<u32>> = writes[3..].iter().map(|w| w.row).collect();
        assert_eq!(deleted, vec![Some(9), Some(3), Some(5)]);
    }

    #[tokio::test]
    async fn test_bulk_failure_keeps_earlier_writes() {
        let repo = Arc::new(FakeSheetRepository::new().failing_write_at(2));
        let report = dispatcher(repo.clone())
            .bulk_delete("DATA", &[4, 5, 6, 7])
            .await;

        assert_eq!(report.attempted, 4);
        assert_eq!(report.completed, 2);
        assert!(matches!(report.failure, Some((2, DashboardError::Transport(_)))));
        let rows: Vec<Option<u32>> = repo.writes().iter().map(|w| w.row).collect();
        assert_eq!(rows, vec![Some(4), Some(5)]);
    }
}
