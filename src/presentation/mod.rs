// Presentation layer - HTTP surface and HTML rendering
pub mod app_state;
pub mod form;
pub mod formatter;
pub mod handlers;
pub mod routes;
pub mod table_renderer;
pub mod templates;
