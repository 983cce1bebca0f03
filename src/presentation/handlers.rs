// HTTP request handlers
use crate::application::page_service::PageRequest;
use crate::domain::error::DashboardError;
use crate::domain::user::UserSession;
use crate::domain::view::View;
use crate::infrastructure::session_store::{token_from_cookie_header, SESSION_COOKIE};
use crate::presentation::app_state::AppState;
use crate::presentation::form::bulk_command;
use crate::presentation::templates::{error_page, login_page, view_page};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, Default)]
pub struct ViewQuery {
    pub q: Option<String>,
    pub id: Option<String>,
    pub notice: Option<String>,
}

#[derive(Deserialize)]
pub struct CellUpdate {
    pub row: u32,
    pub column: String,
    pub value: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(token_from_cookie_header)
}

async fn current_user(state: &AppState, headers: &HeaderMap) -> Option<UserSession> {
    match session_token(headers) {
        Some(token) => state.sessions.get(token).await,
        None => None,
    }
}

fn session_cookie(state: &AppState, value: &str, max_age: u64) -> String {
    let secure = if state.secure_cookie { "; Secure" } else { "" };
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        SESSION_COOKIE, value, max_age, secure
    )
}

fn view_path(view: View, notice: Option<&str>) -> String {
    match notice {
        Some(notice) => format!("/views/{}?notice={}", view, urlencoding::encode(notice)),
        None => format!("/views/{}", view),
    }
}

/// Resolve the view and check the signed-in user may open it.
async fn authorize(state: &AppState, headers: &HeaderMap, view: &str) -> Result<(View, UserSession), Response> {
    let user = current_user(state, headers)
        .await
        .ok_or_else(|| Redirect::to("/").into_response())?;

    let view = view.parse::<View>().map_err(|e: String| {
        (StatusCode::NOT_FOUND, Html(error_page(Some(&user), "ไม่พบหน้า", &e))).into_response()
    })?;

    if !user.role.can_open(view) {
        tracing::info!("User {} may not open {}", user.id, view);
        return Err((
            StatusCode::FORBIDDEN,
            Html(error_page(Some(&user), "ไม่มีสิทธิ์", "หน้านี้สำหรับผู้ดูแลระบบเท่านั้น")),
        )
            .into_response());
    }

    Ok((view, user))
}

/// Login form, or straight to the home view when already signed in
pub async fn login_form(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    match current_user(&state, &headers).await {
        Some(user) => Redirect::to(&view_path(user.role.home(), None)).into_response(),
        None => Html(login_page(None, "")).into_response(),
    }
}

pub async fn login(State(state): State<Arc<AppState>>, Form(form): Form<LoginForm>) -> Response {
    match state.auth_service.login(&form.id, &form.password).await {
        Ok(user) => {
            let home = view_path(user.role.home(), None);
            let token = state.sessions.create(user).await;
            let cookie = session_cookie(&state, &token.to_string(), state.sessions.ttl().as_secs());
            ([(header::SET_COOKIE, cookie)], Redirect::to(&home)).into_response()
        }
        Err(e) => {
            let status = match e {
                DashboardError::AuthenticationFailure(_) => StatusCode::UNAUTHORIZED,
                DashboardError::ValidationFailure(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            };
            (status, Html(login_page(Some(&e.to_string()), &form.id))).into_response()
        }
    }
}

pub async fn logout(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    if let Some(token) = session_token(&headers) {
        if let Some(user) = state.sessions.remove(token).await {
            tracing::info!("User {} signed out", user.id);
        }
    }
    let cookie = session_cookie(&state, "", 0);
    ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}

/// Render a view: fetch, normalize, format and mount its table
pub async fn show_view(
    Path(view): Path<String>,
    Query(query): Query<ViewQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let (view, user) = match authorize(&state, &headers, &view).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let request = PageRequest {
        asset_id: query.id.clone(),
    };
    match state.page_service.load(view, &request).await {
        Some(model) => Html(view_page(
            &state.format,
            &model,
            &user,
            query.q.as_deref().unwrap_or_default(),
            query.id.as_deref().unwrap_or_default(),
            query.notice.as_deref(),
        ))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html(error_page(Some(&user), "ไม่พบหน้า", "ยังไม่ได้ตั้งค่าหน้านี้")),
        )
            .into_response(),
    }
}

/// Run a bulk action, then send the browser back to the view with a notice
pub async fn bulk_action(
    Path(view): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let (view, user) = match authorize(&state, &headers, &view).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let result = match bulk_command(&pairs) {
        Ok(command) => state.page_service.run_bulk(view, user.role, command).await,
        Err(e) => Err(e),
    };

    let notice = match result {
        Ok(outcome) => {
            if !outcome.report.succeeded() {
                tracing::warn!(
                    "Bulk action on {} by {} stopped after {} of {} writes",
                    view,
                    user.id,
                    outcome.report.completed,
                    outcome.report.attempted
                );
            }
            outcome.notice()
        }
        Err(e) => {
            tracing::warn!("Bulk action on {} by {} rejected: {}", view, user.id, e);
            e.to_string()
        }
    };

    Redirect::to(&view_path(view, Some(&notice))).into_response()
}

/// Write back a value chosen in a select control
pub async fn update_cell(
    Path(view): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Form(update): Form<CellUpdate>,
) -> Response {
    let (view, _user) = match authorize(&state, &headers, &view).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    match state
        .page_service
        .update_cell(view, update.row, &update.column, &update.value)
        .await
    {
        Ok(ack) => Json(serde_json::json!({ "ok": true, "ack": ack.0 })).into_response(),
        Err(e) => {
            let status = match e {
                DashboardError::ValidationFailure(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            };
            (status, Json(serde_json::json!({ "ok": false, "error": e.to_string() }))).into_response()
        }
    }
}
