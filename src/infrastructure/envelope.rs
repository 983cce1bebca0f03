// Response normalizer - turns both sheet response envelopes into a Table
use crate::domain::error::DashboardError;
use crate::domain::table::{CellValue, ColumnPolicy, Row, Table};
use crate::domain::view::SourceKind;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static CALLBACK_WRAPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)google\.visualization\.Query\.setResponse\(\s*(\{.*\})\s*\)\s*;?")
        .expect("callback wrapper pattern is valid")
});

#[derive(Debug, Clone)]
pub struct NormalizeOptions<'a> {
    /// Key carrying the sheet row locator in json-array rows.
    pub row_id_key: &'a str,
    pub policy: ColumnPolicy,
    /// Positional field names for wrapped-table rows.
    pub fields: &'a [String],
}

pub fn normalize(kind: SourceKind, body: &str, options: &NormalizeOptions<'_>) -> Result<Table, DashboardError> {
    match kind {
        SourceKind::JsonArray => parse_json_array(body, options.row_id_key, options.policy),
        SourceKind::WrappedTable => parse_wrapped_table(body, options.fields),
    }
}

/// Parse a JSON array of flat objects. Each object is one row; the row-id
/// key, when present, becomes the row's locator and is not shown as a column.
pub fn parse_json_array(body: &str, row_id_key: &str, policy: ColumnPolicy) -> Result<Table, DashboardError> {
    let value: Value = serde_json::from_str(body.trim())
        .map_err(|e| DashboardError::MalformedResponse(format!("expected a JSON array: {}", e)))?;

    let items = value
        .as_array()
        .ok_or_else(|| DashboardError::MalformedResponse("expected a JSON array of rows".to_string()))?;

    let mut rows = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let object = item.as_object().ok_or_else(|| {
            DashboardError::MalformedResponse(format!("row {} is not an object", i))
        })?;

        let mut source_row_id = None;
        let mut cells = Vec::with_capacity(object.len());
        for (key, value) in object {
            if key == row_id_key {
                source_row_id = parse_row_id(value);
                continue;
            }
            cells.push((key.clone(), CellValue::from_json(value)));
        }

        rows.push(Row::new(cells).with_source_row_id(source_row_id));
    }

    Ok(Table::from_rows(rows, policy))
}

fn parse_row_id(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Locate the JSON payload inside wrapper text: the callback pattern first,
/// then the span from the first `{` to the last `}`.
pub fn unwrap_envelope(text: &str) -> Option<&str> {
    if let Some(caps) = CALLBACK_WRAPPER.captures(text) {
        if let Some(payload) = caps.get(1) {
            return Some(payload.as_str());
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Parse a wrapped table payload. Data rows carry no column names; they are
/// named positionally from `fields`, falling back to the payload's own column
/// labels and then to `col<N>`.
pub fn parse_wrapped_table(text: &str, fields: &[String]) -> Result<Table, DashboardError> {
    let payload = unwrap_envelope(text)
        .ok_or_else(|| DashboardError::MalformedResponse("no table payload found".to_string()))?;

    let value: Value = serde_json::from_str(payload)
        .map_err(|e| DashboardError::MalformedResponse(format!("table payload is not JSON: {}", e)))?;

    if value.get("status").and_then(Value::as_str) == Some("error") {
        let reason = value
            .pointer("/errors/0/detailed_message")
            .or_else(|| value.pointer("/errors/0/message"))
            .and_then(Value::as_str)
            .unwrap_or("the table query failed");
        return Err(DashboardError::MalformedResponse(reason.to_string()));
    }

    let table = value
        .get("table")
        .ok_or_else(|| DashboardError::MalformedResponse("payload has no table".to_string()))?;
    let data_rows = table
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| DashboardError::MalformedResponse("table has no rows list".to_string()))?;

    let labels: Vec<String> = table
        .get("cols")
        .and_then(Value::as_array)
        .map(|cols| {
            cols.iter()
                .map(|c| {
                    c.get("label")
                        .and_then(Value::as_str)
                        .filter(|l| !l.is_empty())
                        .or_else(|| c.get("id").and_then(Value::as_str))
                        .unwrap_or_default()
                        .to_string()
                })
                .collect()
        })
        .unwrap_or_default();

    let column_name = |i: usize| -> String {
        fields
            .get(i)
            .or_else(|| labels.get(i).filter(|l| !l.is_empty()))
            .cloned()
            .unwrap_or_else(|| format!("col{}", i))
    };

    let width = data_rows
        .iter()
        .filter_map(|r| r.get("c").and_then(Value::as_array))
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(fields.len());
    let columns: Vec<String> = (0..width).map(column_name).collect();

    let mut rows = Vec::with_capacity(data_rows.len());
    for data_row in data_rows {
        let descriptors = data_row.get("c").and_then(Value::as_array);
        let cells = columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let cell = match descriptors.and_then(|d| d.get(i)) {
                    None | Some(Value::Null) => CellValue::Text(String::new()),
                    Some(descriptor) => descriptor
                        .get("v")
                        .map(CellValue::from_table_json)
                        .unwrap_or(CellValue::Null),
                };
                (name.clone(), cell)
            })
            .collect();
        rows.push(Row::new(cells));
    }

    Ok(Table::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::DateLiteral;

    const PAYLOAD: &str = r#"{"version":"0.6","status":"ok","table":{"cols":[{"id":"A","label":"","type":"string"},{"id":"B","label":"Name","type":"string"},{"id":"C","label":"","type":"date"}],"rows":[{"c":[{"v":"C-100"},{"v":"Projector"},{"v":"Date(2024,0,5)","f":"5/1/2024"}]},{"c":[{"v":"C-101"},null,{"v":null}]}]}}"#;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_json_array_preserves_rows_and_first_row_columns() {
        let body = r#"[{"code":"C-1","name":"Desk","row":5},{"code":"C-2","name":"Chair","status":"ok"},{"code":"C-3"}]"#;
        let table = parse_json_array(body, "row", ColumnPolicy::FirstRow).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.columns, vec!["code", "name"]);
        assert_eq!(table.rows[0].source_row_id, Some(5));
        assert_eq!(table.rows[1].source_row_id, None);
        let codes: Vec<String> = table.rows.iter().map(|r| r.text("code")).collect();
        assert_eq!(codes, vec!["C-1", "C-2", "C-3"]);
    }

    #[test]
    fn test_json_array_empty() {
        let table = parse_json_array("[]", "row", ColumnPolicy::FirstRow).unwrap();
        assert!(table.is_empty());
        assert!(table.columns.is_empty());
    }

    #[test]
    fn test_json_array_rejects_non_arrays() {
        for body in ["<html>error</html>", r#"{"code":"C-1"}"#, "[1,2]"] {
            let err = parse_json_array(body, "row", ColumnPolicy::FirstRow).unwrap_err();
            assert!(matches!(err, DashboardError::MalformedResponse(_)), "body {}", body);
        }
    }

    #[test]
    fn test_wrapped_table_with_callback() {
        let text = format!(
            "/*O_o*/\ngoogle.visualization.Query.setResponse({});",
            PAYLOAD
        );
        let table = parse_wrapped_table(&text, &fields(&["code", "name", "date"])).unwrap();

        assert_eq!(table.columns, vec!["code", "name", "date"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].text("code"), "C-100");
        assert_eq!(
            table.rows[0].get("date"),
            Some(&CellValue::Date(DateLiteral::find("Date(2024,0,5)").unwrap()))
        );
        // absent descriptor -> empty string, descriptor without value -> null
        assert_eq!(table.rows[1].get("name"), Some(&CellValue::Text(String::new())));
        assert_eq!(table.rows[1].get("date"), Some(&CellValue::Null));
    }

    #[test]
    fn test_brace_scan_matches_callback_match() {
        let wrapped = format!("google.visualization.Query.setResponse({});", PAYLOAD);
        let prefixed = format!("12345678901234567890123456789012345678901234567{})", PAYLOAD);
        let names = fields(&["code", "name", "date"]);

        let primary = parse_wrapped_table(&wrapped, &names).unwrap();
        let fallback = parse_wrapped_table(&prefixed, &names).unwrap();
        assert_eq!(primary, fallback);
    }

    #[test]
    fn test_wrapped_table_falls_back_to_payload_labels() {
        let table = parse_wrapped_table(PAYLOAD, &fields(&["code"])).unwrap();
        assert_eq!(table.columns, vec!["code", "Name", "C"]);
    }

    #[test]
    fn test_wrapped_table_error_status() {
        let text = r#"google.visualization.Query.setResponse({"status":"error","errors":[{"reason":"invalid_query","message":"INVALID_QUERY","detailed_message":"Invalid query"}]});"#;
        let err = parse_wrapped_table(text, &[]).unwrap_err();
        assert_eq!(err, DashboardError::MalformedResponse("Invalid query".to_string()));
    }

    #[test]
    fn test_wrapped_table_without_payload() {
        for text in ["", "Service unavailable", "} backwards {"] {
            let err = parse_wrapped_table(text, &[]).unwrap_err();
            assert!(matches!(err, DashboardError::MalformedResponse(_)));
        }
    }
}
