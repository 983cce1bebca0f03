// Application layer - Use cases over the sheet repository
pub mod auth_service;
pub mod dispatcher;
pub mod history_service;
pub mod page_service;
pub mod sheet_repository;

#[cfg(test)]
pub mod test_support;
