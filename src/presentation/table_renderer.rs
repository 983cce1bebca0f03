// Table renderer - selectable, filterable HTML tables
use crate::domain::table::Row;
use crate::domain::view::{BulkAction, ColumnSpec, View};
use crate::presentation::formatter::{escape_html, format_cell, FormatContext, Rendered};

/// Per-row action rendered in the trailing column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowTool {
    /// Link to the history view for the value of `id_column`.
    History { id_column: String },
}

pub struct TableSpec<'a> {
    pub view: View,
    pub columns: &'a [ColumnSpec],
    pub rows: &'a [(u32, Row)],
    pub bulk_actions: &'a [BulkAction],
    pub tools: &'a [RowTool],
    /// Initial filter query; rows not matching it render hidden.
    pub filter: &'a str,
}

/// Case-insensitive substring match; an empty query matches everything.
pub fn row_matches(visible_text: &str, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty() || visible_text.to_lowercase().contains(&query)
}

/// Formatted cells and the row's concatenated visible text.
pub fn render_cells(ctx: &FormatContext, columns: &[ColumnSpec], locator: u32, row: &Row) -> (Vec<Rendered>, String) {
    let cells: Vec<Rendered> = columns
        .iter()
        .map(|c| format_cell(ctx, c, row.get(c.value_key()), locator))
        .collect();
    let text = cells
        .iter()
        .map(|c| c.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (cells, text)
}

/// Render the full table. Each call produces the whole fragment; the page
/// script binds its handlers to whatever fragment is present.
pub fn render_table(ctx: &FormatContext, spec: &TableSpec<'_>) -> String {
    let selectable: Vec<BulkAction> = spec
        .bulk_actions
        .iter()
        .copied()
        .filter(BulkAction::uses_selection)
        .collect();

    let mut header = String::from(r#"<th class="select"><input type="checkbox" class="select-all" aria-label="select all"></th>"#);
    for column in spec.columns {
        header.push_str(&format!("<th>{}</th>", escape_html(column.label())));
    }
    if !spec.tools.is_empty() {
        header.push_str("<th></th>");
    }

    let mut body = String::new();
    for (locator, row) in spec.rows {
        let (cells, text) = render_cells(ctx, spec.columns, *locator, row);
        let hidden = if row_matches(&text, spec.filter) { "" } else { " hidden" };

        body.push_str(&format!(
            r#"<tr data-row="{0}" data-text="{1}"{2}><td class="select"><input type="checkbox" class="row-select" name="row" value="{0}"></td>"#,
            locator,
            escape_html(&text.to_lowercase()),
            hidden
        ));
        for cell in &cells {
            body.push_str(&format!("<td>{}</td>", cell.html));
        }
        if !spec.tools.is_empty() {
            body.push_str(&format!("<td class=\"tools\">{}</td>", render_tools(spec.tools, row)));
        }
        body.push_str("</tr>");
    }

    if spec.rows.is_empty() {
        let width = spec.columns.len() + 1 + usize::from(!spec.tools.is_empty());
        body.push_str(&format!(
            r#"<tr class="empty"><td colspan="{}">ไม่พบข้อมูล</td></tr>"#,
            width
        ));
    }

    let mut buttons = String::new();
    for action in &selectable {
        buttons.push_str(&format!(
            r#"<button type="submit" name="action" value="{}" class="btn btn-{}" data-confirm="ยืนยัน{}?">{}</button>"#,
            action.as_str(),
            action.as_str(),
            action.label(),
            action.label()
        ));
    }

    format!(
        r#"<form class="table-form" method="post" action="/views/{view}/bulk" data-view="{view}">
<div class="toolbar">
<input type="search" class="table-filter" name="q" placeholder="ค้นหา" value="{filter}">
<input type="hidden" name="selection" value="">
{buttons}
</div>
<table class="data-table">
<thead><tr>{header}</tr></thead>
<tbody>{body}</tbody>
</table>
</form>"#,
        view = spec.view,
        filter = escape_html(spec.filter),
        buttons = buttons,
        header = header,
        body = body,
    )
}

fn render_tools(tools: &[RowTool], row: &Row) -> String {
    tools
        .iter()
        .map(|tool| match tool {
            RowTool::History { id_column } => {
                let id = row.text(id_column);
                format!(
                    r#"<a class="btn btn-small" href="/views/history?id={}">ประวัติ</a>"#,
                    escape_html(&urlencoding::encode(id.trim()))
                )
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
