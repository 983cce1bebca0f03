// History lookup - log rows for a single asset
use crate::domain::table::Row;
use crate::domain::view::ViewSchema;

#[derive(Debug, Clone, PartialEq)]
pub struct AssetHistory {
    pub asset_id: String,
    /// Name taken from the first matching log row.
    pub asset_name: Option<String>,
    pub rows: Vec<(u32, Row)>,
}

/// Keep rows whose identifier column equals `asset_id` exactly (after
/// trimming both sides), in source order.
pub fn lookup(schema: &ViewSchema, rows: &[(u32, Row)], asset_id: &str) -> AssetHistory {
    let asset_id = asset_id.trim();
    let matches: Vec<(u32, Row)> = rows
        .iter()
        .filter(|(_, row)| row.text(&schema.primary).trim() == asset_id)
        .cloned()
        .collect();

    let asset_name = schema.name_column.as_deref().and_then(|column| {
        matches
            .first()
            .map(|(_, row)| row.text(column))
            .filter(|name| !name.trim().is_empty())
    });

    tracing::debug!("History for {}: {} log rows", asset_id, matches.len());

    AssetHistory {
        asset_id: asset_id.to_string(),
        asset_name,
        rows: matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::test_views;
    use crate::domain::table::CellValue;
    use crate::domain::view::View;

    fn log_row(code: &str, name: &str, note: &str) -> Row {
        Row::new(vec![
            ("code".to_string(), CellValue::Text(code.to_string())),
            ("name".to_string(), CellValue::Text(name.to_string())),
            ("note".to_string(), CellValue::Text(note.to_string())),
        ])
    }

    #[test]
    fn test_lookup_exact_identifier_in_source_order() {
        let views = test_views();
        let schema = views.schema(View::History).unwrap();
        let rows: Vec<(u32, Row)> = vec![
            (2, log_row("C-100", "Projector", "first")),
            (3, log_row("C-1000", "Screen", "other")),
            (4, log_row("C-100", "Projector (old label)", "second")),
            (5, log_row("B-7", "Chair", "other")),
            (6, log_row(" C-100 ", "", "third")),
        ];

        let history = lookup(schema, &rows, "C-100");
        assert_eq!(history.rows.len(), 3);
        let notes: Vec<String> = history.rows.iter().map(|(_, r)| r.text("note")).collect();
        assert_eq!(notes, vec!["first", "second", "third"]);
        assert_eq!(history.asset_name.as_deref(), Some("Projector"));
    }

    #[test]
    fn test_lookup_without_matches() {
        let views = test_views();
        let schema = views.schema(View::History).unwrap();
        let history = lookup(schema, &[(2, log_row("A", "a", ""))], "Z");
        assert!(history.rows.is_empty());
        assert_eq!(history.asset_name, None);
    }
}
