// Bulk form fields: ordered pairs as posted, repeated keys included
use crate::application::page_service::{BulkCommand, NewUser};
use crate::domain::error::DashboardError;
use crate::domain::view::BulkAction;
use std::collections::HashSet;

fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// Selected row locators: the click-ordered `selection` list when present,
/// otherwise the checked `row` boxes in document order. Each locator appears
/// once, at its first position.
pub fn selected_rows(pairs: &[(String, String)]) -> Vec<u32> {
    let ordered = unique(
        first(pairs, "selection")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse().ok()),
    );
    if !ordered.is_empty() {
        return ordered;
    }

    unique(
        pairs
            .iter()
            .filter(|(k, _)| k == "row")
            .filter_map(|(_, v)| v.trim().parse().ok()),
    )
}

fn unique(locators: impl Iterator<Item = u32>) -> Vec<u32> {
    let mut seen = HashSet::new();
    locators.filter(|l| seen.insert(*l)).collect()
}

pub fn bulk_command(pairs: &[(String, String)]) -> Result<BulkCommand, DashboardError> {
    let action: BulkAction = first(pairs, "action")
        .unwrap_or_default()
        .parse()
        .map_err(DashboardError::ValidationFailure)?;

    let field = |key: &str| first(pairs, key).unwrap_or_default().to_string();

    Ok(match action {
        BulkAction::Move => BulkCommand::Move(selected_rows(pairs)),
        BulkAction::Delete => BulkCommand::Delete(selected_rows(pairs)),
        BulkAction::Add => BulkCommand::Add(field("lines")),
        BulkAction::AddUser => BulkCommand::AddUser(NewUser {
            id: field("id"),
            password: field("password"),
            name: field("name"),
            role: field("role"),
        }),
    })
}
