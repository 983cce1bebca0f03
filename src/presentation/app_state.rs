// Application state for HTTP handlers
use crate::application::auth_service::AuthService;
use crate::application::dispatcher::ActionDispatcher;
use crate::application::page_service::PageService;
use crate::application::sheet_repository::SheetRepository;
use crate::infrastructure::config::{AppConfig, ViewsConfig};
use crate::infrastructure::session_store::SessionStore;
use crate::presentation::formatter::FormatContext;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub page_service: PageService,
    pub auth_service: AuthService,
    pub sessions: SessionStore,
    pub format: FormatContext,
    pub secure_cookie: bool,
}

impl AppState {
    pub fn new(config: &AppConfig, views: ViewsConfig, repository: Arc<dyn SheetRepository>) -> Self {
        let dispatcher = ActionDispatcher::new(
            repository,
            config.sheets.row_id_key.clone(),
            config.display.column_policy,
        );

        let page_service = PageService::new(
            dispatcher.clone(),
            views,
            config.sheets.log_sheet.clone(),
            config.sheets.header_offset,
            config.auth.clone(),
            config.display.rooms.clone(),
            config.display.statuses.clone(),
        );
        let auth_service = AuthService::new(dispatcher, config.sheets.login_sheet.clone(), config.auth.clone());

        Self {
            page_service,
            auth_service,
            sessions: SessionStore::new(Duration::from_secs(config.server.session_ttl_minutes.saturating_mul(60))),
            format: FormatContext::from_settings(&config.display),
            secure_cookie: config.server.secure_cookie,
        }
    }
}
