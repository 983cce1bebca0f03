// Auth service - Use case for checking credentials against the login sheet
use crate::application::dispatcher::ActionDispatcher;
use crate::application::sheet_repository::SheetSource;
use crate::domain::error::DashboardError;
use crate::domain::user::{Role, UserSession};
use crate::infrastructure::config::AuthSettings;

#[derive(Clone)]
pub struct AuthService {
    dispatcher: ActionDispatcher,
    login_sheet: String,
    columns: AuthSettings,
}

impl AuthService {
    pub fn new(dispatcher: ActionDispatcher, login_sheet: String, columns: AuthSettings) -> Self {
        Self {
            dispatcher,
            login_sheet,
            columns,
        }
    }

    pub async fn login(&self, id: &str, password: &str) -> Result<UserSession, DashboardError> {
        let id = id.trim();
        if id.is_empty() || password.is_empty() {
            return Err(DashboardError::ValidationFailure(
                "กรุณากรอกรหัสผู้ใช้และรหัสผ่าน".to_string(),
            ));
        }

        let outcome = self
            .dispatcher
            .read(&SheetSource::json(&self.login_sheet), &[])
            .await;
        if let Some(e) = outcome.error.filter(DashboardError::is_load_failure) {
            return Err(e);
        }

        let record = outcome
            .table
            .rows
            .iter()
            .find(|r| r.text(&self.columns.id_column).trim() == id && r.text(&self.columns.password_column) == password)
            .ok_or_else(|| {
                tracing::info!("Rejected login for {}", id);
                DashboardError::AuthenticationFailure("รหัสผู้ใช้หรือรหัสผ่านไม่ถูกต้อง".to_string())
            })?;

        let role = Role::parse(&record.text(&self.columns.role_column)).ok_or_else(|| {
            tracing::info!("Login for {} has no usable role", id);
            DashboardError::AuthenticationFailure("บัญชีนี้ไม่มีสิทธิ์เข้าใช้งาน".to_string())
        })?;

        let name = record.text(&self.columns.name_column);
        tracing::info!("User {} signed in as {}", id, role.as_str());

        Ok(UserSession {
            id: id.to_string(),
            name: if name.trim().is_empty() { id.to_string() } else { name },
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::FakeSheetRepository;
    use crate::domain::table::ColumnPolicy;
    use std::sync::Arc;

    const LOGIN: &str = r#"[
        {"ID":"ADMIN01","Password":"s3cret","Name":"สมชาย","Status":"admin"},
        {"ID":"U02","Password":"pw","Name":"","Status":"User"},
        {"ID":"X03","Password":"pw","Name":"x","Status":"guest"}
    ]"#;

    fn service(repo: FakeSheetRepository) -> AuthService {
        let dispatcher = ActionDispatcher::new(Arc::new(repo), "row".to_string(), ColumnPolicy::FirstRow);
        AuthService::new(dispatcher, "LOGIN".to_string(), AuthSettings::default())
    }

    #[tokio::test]
    async fn test_admin_login() {
        let session = service(FakeSheetRepository::new().with_body("LOGIN", LOGIN))
            .login("ADMIN01", "s3cret")
            .await
            .unwrap();
        assert_eq!(session.role, Role::Admin);
        assert_eq!(session.name, "สมชาย");
    }

    #[tokio::test]
    async fn test_user_without_name_falls_back_to_id() {
        let session = service(FakeSheetRepository::new().with_body("LOGIN", LOGIN))
            .login(" U02 ", "pw")
            .await
            .unwrap();
        assert_eq!(session.role, Role::User);
        assert_eq!(session.name, "U02");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_role_fail() {
        let auth = service(FakeSheetRepository::new().with_body("LOGIN", LOGIN));
        assert!(matches!(
            auth.login("ADMIN01", "wrong").await,
            Err(DashboardError::AuthenticationFailure(_))
        ));
        assert!(matches!(
            auth.login("X03", "pw").await,
            Err(DashboardError::AuthenticationFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_fields_and_unreachable_sheet() {
        let auth = service(
            FakeSheetRepository::new().with_failure("LOGIN", DashboardError::Transport("down".to_string())),
        );
        assert!(matches!(auth.login("", "pw").await, Err(DashboardError::ValidationFailure(_))));
        assert!(matches!(auth.login("ADMIN01", "s3cret").await, Err(DashboardError::Transport(_))));
    }
}
