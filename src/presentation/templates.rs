// HTML page templates
use crate::application::page_service::PageModel;
use crate::domain::error::DashboardError;
use crate::domain::status::{Severity, SeveritySummary};
use crate::domain::user::UserSession;
use crate::domain::view::{BulkAction, View};
use crate::presentation::formatter::{escape_html, FormatContext};
use crate::presentation::table_renderer::{render_table, RowTool, TableSpec};

const STYLE: &str = r#"
body { font-family: "Sarabun", system-ui, sans-serif; margin: 0; background: #f4f6f9; color: #222; }
header { background: #1f3b57; color: #fff; padding: .6rem 1rem; display: flex; gap: 1rem; align-items: center; }
header a { color: #dce7f2; text-decoration: none; }
header a.active { color: #fff; font-weight: bold; }
header .user { margin-left: auto; }
main { padding: 1rem; }
.alert { padding: .6rem .8rem; border-radius: 4px; margin-bottom: .8rem; }
.alert-danger { background: #fde2e1; color: #8a1c17; }
.alert-info { background: #e1effd; color: #17406b; }
.tiles { display: flex; gap: .8rem; margin-bottom: 1rem; }
.tile { background: #fff; border-radius: 6px; padding: .6rem 1rem; min-width: 8rem; border-top: 4px solid #999; }
.tile-success { border-color: #2e9e5b; } .tile-warning { border-color: #e0a100; }
.tile-danger { border-color: #d0342c; } .tile-neutral { border-color: #888; }
.tile .count { font-size: 1.6rem; font-weight: bold; }
.toolbar { display: flex; gap: .5rem; margin-bottom: .5rem; }
.data-table { width: 100%; border-collapse: collapse; background: #fff; }
.data-table th, .data-table td { border-bottom: 1px solid #e3e6ea; padding: .4rem .5rem; text-align: left; }
.badge { padding: .1rem .5rem; border-radius: 10px; color: #fff; font-size: .85rem; }
.badge-success { background: #2e9e5b; } .badge-warning { background: #e0a100; }
.badge-danger { background: #d0342c; } .badge-neutral { background: #888; }
img.qr { width: 72px; height: 72px; }
#busy { position: fixed; inset: 0; background: rgba(255,255,255,.6); display: flex; align-items: center; justify-content: center; font-size: 1.2rem; }
#busy[hidden] { display: none; }
"#;

const SCRIPT: &str = r#"
(function () {
  var busy = document.getElementById('busy');
  function showBusy() { if (busy) { busy.hidden = false; } }
  document.querySelectorAll('a[data-nav]').forEach(function (a) { a.addEventListener('click', showBusy); });
  function confirmThenBusy(e) {
    var button = e.submitter;
    if (button && button.dataset.confirm && !window.confirm(button.dataset.confirm)) {
      e.preventDefault();
      return;
    }
    showBusy();
  }
  document.querySelectorAll('form[data-busy], form.table-form').forEach(function (f) {
    f.addEventListener('submit', confirmThenBusy);
  });

  document.querySelectorAll('form.table-form').forEach(function (form) {
    var order = [];
    var selection = form.querySelector('input[name="selection"]');
    var boxes = form.querySelectorAll('.row-select');
    function sync() { selection.value = order.join(','); }

    boxes.forEach(function (box) {
      box.addEventListener('change', function () {
        var i = order.indexOf(box.value);
        if (box.checked && i < 0) { order.push(box.value); }
        if (!box.checked && i >= 0) { order.splice(i, 1); }
        sync();
      });
    });

    var all = form.querySelector('.select-all');
    if (all) {
      all.addEventListener('change', function () {
        boxes.forEach(function (box) {
          if (box.checked !== all.checked) {
            box.checked = all.checked;
            box.dispatchEvent(new Event('change'));
          }
        });
      });
    }

    var filter = form.querySelector('.table-filter');
    if (filter) {
      filter.addEventListener('keydown', function (e) { if (e.key === 'Enter') { e.preventDefault(); } });
      filter.addEventListener('keyup', function () {
        var q = filter.value.trim().toLowerCase();
        form.querySelectorAll('tbody tr[data-row]').forEach(function (tr) {
          tr.hidden = q !== '' && tr.dataset.text.indexOf(q) < 0;
        });
      });
    }

    form.querySelectorAll('.cell-select').forEach(function (select) {
      select.addEventListener('change', function () {
        var body = new URLSearchParams({ row: select.dataset.row, column: select.dataset.column, value: select.value });
        fetch('/views/' + form.dataset.view + '/cells', { method: 'POST', body: body })
          .then(function (r) { if (!r.ok) { throw new Error(r.status + ' ' + r.statusText); } })
          .catch(function (err) { window.alert('บันทึกไม่สำเร็จ: ' + err.message); });
      });
    });
  });
})();
"#;

fn nav_label(view: View) -> &'static str {
    match view {
        View::Dashboard => "ภาพรวม",
        View::Wait => "รอตรวจสอบ",
        View::List => "รายการครุภัณฑ์",
        View::User => "ผู้ใช้",
        View::History => "ประวัติ",
    }
}

pub fn layout(title: &str, user: Option<&UserSession>, active: Option<View>, content: &str) -> String {
    let nav = match user {
        Some(user) => {
            let links: String = View::ALL
                .iter()
                .filter(|v| user.role.can_open(**v))
                .map(|v| {
                    let class = if Some(*v) == active { " class=\"active\"" } else { "" };
                    format!(r#"<a href="/views/{}"{} data-nav>{}</a>"#, v, class, nav_label(*v))
                })
                .collect();
            format!(
                r#"<nav>{}</nav><span class="user">{} ({})</span><form method="post" action="/logout"><button type="submit">ออกจากระบบ</button></form>"#,
                links,
                escape_html(&user.name),
                user.role.as_str()
            )
        }
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="th">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - ระบบครุภัณฑ์</title>
    <style>{css}</style>
</head>
<body>
    <header><strong>ระบบครุภัณฑ์</strong>{nav}</header>
    <main>
        <h1>{title}</h1>
        {content}
    </main>
    <div id="busy" hidden>กำลังโหลด...</div>
    <script>{js}</script>
</body>
</html>"#,
        title = escape_html(title),
        css = STYLE,
        nav = nav,
        content = content,
        js = SCRIPT,
    )
}

pub fn login_page(error: Option<&str>, id: &str) -> String {
    let message = error
        .map(|e| format!(r#"<p class="alert alert-danger field-error">{}</p>"#, escape_html(e)))
        .unwrap_or_default();

    let content = format!(
        r#"<form method="post" action="/login" class="login" data-busy>
    {message}
    <label>รหัสผู้ใช้ <input name="id" value="{id}" required autofocus></label>
    <label>รหัสผ่าน <input name="password" type="password" required></label>
    <button type="submit">เข้าสู่ระบบ</button>
</form>"#,
        message = message,
        id = escape_html(id),
    );

    layout("เข้าสู่ระบบ", None, None, &content)
}

pub fn error_page(user: Option<&UserSession>, title: &str, message: &str) -> String {
    layout(
        title,
        user,
        None,
        &format!(r#"<p class="alert alert-danger">{}</p>"#, escape_html(message)),
    )
}

fn summary_tiles(summary: &SeveritySummary) -> String {
    let tiles: String = Severity::ALL
        .iter()
        .map(|s| {
            format!(
                r#"<div class="tile tile-{}"><div class="count">{}</div><div>{}</div></div>"#,
                s.css_class(),
                summary.count(*s),
                s.label()
            )
        })
        .collect();
    format!(
        r#"<section class="tiles"><div class="tile"><div class="count">{}</div><div>ทั้งหมด</div></div>{}</section>"#,
        summary.total(),
        tiles
    )
}

fn status_banner(model: &PageModel) -> String {
    match &model.error {
        Some(e) if model.load_failed() => format!(
            r#"<p class="alert alert-danger load-error">โหลดข้อมูลไม่สำเร็จ: {} <a href="/views/{}" data-nav>ลองใหม่</a></p>"#,
            escape_html(&e.to_string()),
            model.schema.view
        ),
        Some(DashboardError::EmptyResult) => r#"<p class="alert alert-info">ไม่พบข้อมูลในชีต</p>"#.to_string(),
        _ => String::new(),
    }
}

fn add_forms(model: &PageModel) -> String {
    let view = model.schema.view;
    let mut forms = String::new();

    if model.schema.supports(BulkAction::Add) {
        forms.push_str(&format!(
            r#"<form method="post" action="/views/{view}/bulk" class="add-items" data-busy>
    <input type="hidden" name="action" value="add">
    <label>เพิ่มหลายรายการ (บรรทัดละ "รหัส ชื่อ")<textarea name="lines" rows="4"></textarea></label>
    <button type="submit" data-confirm="ยืนยัน{label}?">{label}</button>
</form>"#,
            view = view,
            label = BulkAction::Add.label()
        ));
    }

    if model.schema.supports(BulkAction::AddUser) {
        forms.push_str(&format!(
            r#"<form method="post" action="/views/{view}/bulk" class="add-user" data-busy>
    <input type="hidden" name="action" value="add_user">
    <input name="id" placeholder="รหัสผู้ใช้" required>
    <input name="password" type="password" placeholder="รหัสผ่าน" required>
    <input name="name" placeholder="ชื่อ">
    <select name="role"><option value="user">user</option><option value="admin">admin</option></select>
    <button type="submit" data-confirm="ยืนยัน{label}?">{label}</button>
</form>"#,
            view = view,
            label = BulkAction::AddUser.label()
        ));
    }

    forms
}

fn history_section(ctx: &FormatContext, model: &PageModel, asset_id: &str, filter: &str) -> String {
    let search = format!(
        r#"<form method="get" action="/views/history" class="history-search" data-busy>
    <input name="id" value="{}" placeholder="รหัสครุภัณฑ์">
    <button type="submit">ค้นหา</button>
</form>"#,
        escape_html(asset_id)
    );

    let (heading, rows) = match &model.history {
        Some(history) => {
            let name = history
                .asset_name
                .as_deref()
                .map(|n| format!(" {}", escape_html(n)))
                .unwrap_or_default();
            (
                format!(
                    r#"<h2 class="asset-heading">{}{} <small>({} รายการ)</small></h2>"#,
                    escape_html(&history.asset_id),
                    name,
                    history.rows.len()
                ),
                history.rows.as_slice(),
            )
        }
        None => (String::new(), model.rows.as_slice()),
    };

    let table = render_table(
        ctx,
        &TableSpec {
            view: model.schema.view,
            columns: &model.columns,
            rows,
            bulk_actions: &model.schema.bulk_actions,
            tools: &[],
            filter,
        },
    );

    format!("{}{}{}", search, heading, table)
}

pub fn view_page(
    ctx: &FormatContext,
    model: &PageModel,
    user: &UserSession,
    filter: &str,
    asset_id: &str,
    notice: Option<&str>,
) -> String {
    let mut content = String::new();

    if let Some(notice) = notice.filter(|n| !n.trim().is_empty()) {
        content.push_str(&format!(
            r#"<p class="alert alert-info notice">{}</p>"#,
            escape_html(notice)
        ));
    }
    content.push_str(&status_banner(model));
    if model.skipped > 0 {
        content.push_str(&format!(
            r#"<p class="alert alert-info">ไม่แสดง {} แถวที่ไม่มีรหัส</p>"#,
            model.skipped
        ));
    }
    if let Some(summary) = &model.summary {
        content.push_str(&summary_tiles(summary));
    }
    content.push_str(&add_forms(model));

    if model.schema.view == View::History {
        content.push_str(&history_section(ctx, model, asset_id, filter));
    } else {
        let tools = if model.schema.history_link {
            vec![RowTool::History {
                id_column: model.schema.primary.clone(),
            }]
        } else {
            Vec::new()
        };
        content.push_str(&render_table(
            ctx,
            &TableSpec {
                view: model.schema.view,
                columns: &model.columns,
                rows: &model.rows,
                bulk_actions: &model.schema.bulk_actions,
                tools: &tools,
                filter,
            },
        ));
    }

    layout(&model.schema.title, Some(user), Some(model.schema.view), &content)
}
