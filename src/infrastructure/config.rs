use crate::domain::table::ColumnPolicy;
use crate::domain::view::{View, ViewSchema};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub sheets: SheetSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Minutes a login session stays valid.
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: u64,
    /// Mark the session cookie `Secure`; turn off only for plain-HTTP development.
    #[serde(default = "default_secure_cookie")]
    pub secure_cookie: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            session_ttl_minutes: default_session_ttl_minutes(),
            secure_cookie: default_secure_cookie(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SheetSettings {
    /// Script service URL answering `?sheet=` reads and form-encoded writes.
    pub endpoint: String,
    /// Table-query URL for wrapped-table sources.
    pub table_query_endpoint: Option<String>,
    #[serde(default = "default_login_sheet")]
    pub login_sheet: String,
    #[serde(default = "default_log_sheet")]
    pub log_sheet: String,
    #[serde(default = "default_row_id_key")]
    pub row_id_key: String,
    #[serde(default = "default_header_offset")]
    pub header_offset: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplaySettings {
    #[serde(default = "default_qr_endpoint")]
    pub qr_endpoint: String,
    #[serde(default = "default_qr_size")]
    pub qr_size: String,
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    #[serde(default = "default_rooms")]
    pub rooms: Vec<String>,
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,
    #[serde(default)]
    pub column_policy: ColumnPolicy,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            qr_endpoint: default_qr_endpoint(),
            qr_size: default_qr_size(),
            utc_offset_hours: default_utc_offset_hours(),
            rooms: default_rooms(),
            statuses: default_statuses(),
            column_policy: ColumnPolicy::default(),
        }
    }
}

/// Column keys of the login sheet.
#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_password_column")]
    pub password_column: String,
    #[serde(default = "default_name_column")]
    pub name_column: String,
    #[serde(default = "default_role_column")]
    pub role_column: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            id_column: default_id_column(),
            password_column: default_password_column(),
            name_column: default_name_column(),
            role_column: default_role_column(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewsConfig {
    #[serde(default)]
    pub views: Vec<ViewSchema>,
}

impl ViewsConfig {
    pub fn schema(&self, view: View) -> Option<&ViewSchema> {
        self.views.iter().find(|s| s.view == view)
    }

    /// Every view needs exactly one schema and every schema a primary column.
    pub fn validate(&self) -> anyhow::Result<()> {
        for view in View::ALL {
            let count = self.views.iter().filter(|s| s.view == view).count();
            if count != 1 {
                anyhow::bail!("expected one schema for view '{}', found {}", view, count);
            }
        }
        for schema in &self.views {
            if schema.primary.trim().is_empty() {
                anyhow::bail!("view '{}' has no primary column", schema.view);
            }
        }
        Ok(())
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_session_ttl_minutes() -> u64 {
    12 * 60
}

fn default_secure_cookie() -> bool {
    true
}

fn default_login_sheet() -> String {
    "LOGIN".to_string()
}

fn default_log_sheet() -> String {
    "LOG".to_string()
}

fn default_row_id_key() -> String {
    "row".to_string()
}

fn default_header_offset() -> u32 {
    2
}

fn default_qr_endpoint() -> String {
    "https://api.qrserver.com/v1/create-qr-code/".to_string()
}

fn default_qr_size() -> String {
    "120x120".to_string()
}

fn default_utc_offset_hours() -> i32 {
    7
}

fn default_rooms() -> Vec<String> {
    ["ห้องพักครู", "ห้องคอมพิวเตอร์ 1", "ห้องคอมพิวเตอร์ 2", "ห้องสมุด", "ห้องประชุม", "คลังพัสดุ"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_statuses() -> Vec<String> {
    ["ใช้งานได้", "ชำรุด", "เสื่อมสภาพ", "ส่งซ่อม"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_id_column() -> String {
    "ID".to_string()
}

fn default_password_column() -> String {
    "Password".to_string()
}

fn default_name_column() -> String {
    "Name".to_string()
}

fn default_role_column() -> String {
    "Status".to_string()
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard"))
        .add_source(config::Environment::with_prefix("ASSET").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_views_config() -> anyhow::Result<ViewsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/views"))
        .build()?;

    let views: ViewsConfig = settings.try_deserialize()?;
    views.validate()?;
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::view::{BulkAction, ColumnKind, SourceKind};

    fn parse<T: serde::de::DeserializeOwned>(toml: &str) -> T {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_shipped_views_config_is_complete() {
        let views: ViewsConfig = parse(include_str!("../../config/views.toml"));
        views.validate().unwrap();

        let dashboard = views.schema(View::Dashboard).unwrap();
        assert_eq!(dashboard.source, SourceKind::WrappedTable);

        let wait = views.schema(View::Wait).unwrap();
        assert!(wait.supports(BulkAction::Move));

        let list = views.schema(View::List).unwrap();
        assert!(list.column_of_kind(ColumnKind::Qr).is_some());
    }

    #[test]
    fn test_app_config_defaults() {
        let config: AppConfig = parse(
            r#"
            [sheets]
            endpoint = "https://script.example/exec"
            "#,
        );
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.server.session_ttl_minutes, 720);
        assert!(config.server.secure_cookie);
        assert_eq!(config.sheets.header_offset, 2);
        assert_eq!(config.display.column_policy, ColumnPolicy::FirstRow);
        assert_eq!(config.auth.role_column, "Status");
        assert!(config.display.statuses.iter().any(|s| s == "ชำรุด"));
    }

    #[test]
    fn test_missing_view_schema_is_rejected() {
        let views = ViewsConfig { views: Vec::new() };
        assert!(views.validate().is_err());
    }
}
