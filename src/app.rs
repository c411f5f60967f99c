#![cfg(feature = "web")]

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::backend::{AuditEvent, BackendError, BackendUser, HttpBackend, ReportBackend};
use crate::config::ConsoleConfig;
use crate::editor::{FormErrors, RANGE_ERROR, TemplateCreator, TemplateEditor, TemplateError, normalize_group_name};
use crate::export::{ExportMode, ExportRequest};
use crate::parameter::{Parameter, ParameterDraft, short_label};
use crate::report::{DashboardStats, Report, ReportAction, ReportKind, authorize};
use crate::session::{SessionHandle, SessionRegistry, SessionStore, UserSession};
use crate::template::{SortDirection, SortKey, Statistic, Template, TemplateSort, filter_by_name, short_parameters};

/// Name of the cookie that carries the session id
pub const SESSION_COOKIE: &str = "session";

pub struct AppState {
    pub backend: Arc<dyn ReportBackend>,
    pub sessions: Arc<SessionRegistry>,
    pub config: ConsoleConfig,
}

impl AppState {
    pub fn new(backend: Arc<dyn ReportBackend>, config: ConsoleConfig) -> Self {
        AppState {
            backend,
            sessions: Arc::new(SessionRegistry::new(config.session_ttl)),
            config,
        }
    }

    /// The session behind a cookie value
    pub fn session(&self, session_id: &str) -> SessionHandle {
        SessionHandle::new(self.sessions.clone(), session_id)
    }
}

pub type SharedState = Arc<AppState>;

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FormErrors>,
}

fn ok(message: impl Into<String>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        message: Some(message.into()),
        errors: None,
    })
}

/// Failure of a console request, rendered as `{status: "error", message}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Invalid(FormErrors),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Backend(BackendError),
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        ApiError::Backend(e)
    }
}

impl From<TemplateError> for ApiError {
    fn from(e: TemplateError) -> Self {
        match e {
            TemplateError::Invalid(errors) => ApiError::Invalid(errors),
            TemplateError::InvalidRanges => ApiError::BadRequest(RANGE_ERROR.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Invalid(errors) => (
                StatusCode::BAD_REQUEST,
                "Please correct the highlighted fields".to_string(),
                Some(errors),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Backend(BackendError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_string(),
                None,
            ),
            ApiError::Backend(e) => {
                error!("Reporting API error: {}", e);
                (StatusCode::BAD_GATEWAY, e.to_string(), None)
            }
        };

        let body = StatusResponse {
            status: "error".to_string(),
            message: Some(message),
            errors,
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Build the console router
///
/// Everything under `/api` except `/api/session` requires a valid session
/// cookie.
pub fn router(state: SharedState) -> Router {
    let protected = Router::new()
        .route("/api/templates", get(list_templates).post(create_template))
        .route("/api/templates/delete", post(delete_templates))
        .route("/api/templates/:id", put(edit_template))
        .route("/api/parameters", get(list_parameters))
        .route("/api/groups", get(list_groups).post(add_group))
        .route("/api/users", get(list_users))
        .route("/api/schedules", get(list_schedules))
        .route("/api/reports/:kind", get(list_reports))
        .route("/api/reports/:kind/:id", get(report_document))
        .route("/api/reports/:kind/:id/:action", post(report_action))
        .route("/api/export", post(export_report))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .route("/api/session", get(session_info))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the console server
///
/// # Arguments
/// * `config` - Bind address, backend URL and session lifetime
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Only returns on error or shutdown
pub async fn run(config: ConsoleConfig) -> Result<(), Box<dyn std::error::Error>> {
    let backend: Arc<dyn ReportBackend> = Arc::new(HttpBackend::new(config.api_base_url.clone()));
    let state = Arc::new(AppState::new(backend, config.clone()));

    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(60 * 60));
        loop {
            tick.tick().await;
            let purged = sessions.purge_expired();
            if purged > 0 {
                info!("Purged {} expired sessions", purged);
            }
        }
    });

    let app = router(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);
    info!("Reporting API at {}", config.api_base_url);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Authentication middleware
///
/// Looks up the `session` cookie and hands the user to the handler as an
/// `Extension<UserSession>`. Requests without a valid session get a 401.
pub async fn require_auth(
    State(state): State<SharedState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let user = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.session(cookie.value()).authenticated());

    match user {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => ApiError::Unauthorized("Please log in".to_string()).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

async fn handle_login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> ApiResult<(CookieJar, Json<UserSession>)> {
    if credentials.username.is_empty() || credentials.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password cannot be empty".to_string(),
        ));
    }

    let user = state
        .backend
        .login(&credentials.username, &credentials.password)
        .await?;
    if !user.is_authenticated() {
        return Err(ApiError::Unauthorized("Login returned no role".to_string()));
    }

    let session_id = state.sessions.create(user.clone());
    info!("User {} logged in as {}", user.username, user.role);

    let events = [
        AuditEvent::Login {
            username: user.username.clone(),
        },
        AuditEvent::AuditLogin {
            username: user.username.clone(),
        },
    ];
    for event in &events {
        if let Err(e) = state.backend.log_event(event).await {
            warn!("Failed to record {}: {}", event.endpoint(), e);
        }
    }

    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true);
    Ok((jar.add(cookie), Json(user)))
}

async fn handle_logout(State(state): State<SharedState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let session = state.session(cookie.value());
        if let Some(user) = session.get() {
            info!("User {} logged out", user.username);
        }
        session.clear();
    }

    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        ok("Logged out"),
    )
}

async fn session_info(State(state): State<SharedState>, jar: CookieJar) -> ApiResult<Json<UserSession>> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| state.session(cookie.value()).get())
        .map(Json)
        .ok_or_else(|| ApiError::Unauthorized("No session found".to_string()))
}

#[derive(Debug, Serialize)]
struct ParameterView {
    token: String,
    base_name: String,
    min: Option<i64>,
    max: Option<i64>,
    unit: String,
    display_name: String,
}

impl ParameterView {
    fn new(token: &str) -> Self {
        let parameter = Parameter::decode(token);
        let (min, max) = match parameter.range() {
            Some((min, max)) => (Some(min), Some(max)),
            None => (None, None),
        };
        ParameterView {
            token: token.to_string(),
            base_name: parameter.base_name().to_string(),
            min,
            max,
            unit: parameter.unit().to_string(),
            display_name: parameter.display_name(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TemplateView {
    id: i64,
    name: String,
    report_group: String,
    #[serde(rename = "additionalInfo")]
    additional_info: String,
    statistics: Vec<Statistic>,
    summary: String,
    parameters: Vec<ParameterView>,
}

impl From<&Template> for TemplateView {
    fn from(t: &Template) -> Self {
        TemplateView {
            id: t.id,
            name: t.name.clone(),
            report_group: t.report_group.clone(),
            additional_info: t.additional_info.clone(),
            statistics: t.statistics(),
            summary: short_parameters(&t.parameters),
            parameters: t.parameters.iter().map(|p| ParameterView::new(p)).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TemplateQuery {
    #[serde(default)]
    search: String,
    sort: Option<SortKey>,
    #[serde(default)]
    direction: SortDirection,
}

async fn list_templates(
    State(state): State<SharedState>,
    Query(query): Query<TemplateQuery>,
) -> ApiResult<Json<Vec<TemplateView>>> {
    let templates = state.backend.templates().await?;
    let mut matching: Vec<Template> = filter_by_name(&templates, &query.search)
        .into_iter()
        .cloned()
        .collect();

    if let Some(key) = query.sort {
        TemplateSort {
            key,
            direction: query.direction,
        }
        .apply(&mut matching);
    }

    Ok(Json(matching.iter().map(TemplateView::from).collect()))
}

async fn create_template(
    State(state): State<SharedState>,
    Json(form): Json<TemplateCreator>,
) -> ApiResult<Json<StatusResponse>> {
    let payload = form.build_payload()?;
    state.backend.create_template(&payload).await?;
    info!("Created template {}", payload.name);
    Ok(ok("Template added successfully"))
}

#[derive(Debug, Deserialize)]
pub struct EditTemplateRequest {
    pub report_group: String,
    #[serde(default)]
    pub statistics: Vec<Statistic>,
    pub parameters: Vec<ParameterDraft>,
}

async fn find_template(state: &AppState, id: i64) -> ApiResult<Template> {
    state
        .backend
        .templates()
        .await?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| ApiError::NotFound(format!("Template {} not found", id)))
}

async fn edit_template(
    State(state): State<SharedState>,
    Extension(user): Extension<UserSession>,
    Path(id): Path<i64>,
    Json(edit): Json<EditTemplateRequest>,
) -> ApiResult<Json<TemplateView>> {
    let template = find_template(&state, id).await?;

    let mut editor = TemplateEditor::open(&template);
    editor.report_group = edit.report_group;
    editor.statistics = edit.statistics;
    editor.drafts = edit.parameters;

    let payload = editor.build_payload()?;
    let updated = state.backend.edit_template(id, &payload).await?;

    let event = AuditEvent::EditedTemplate {
        username: user.username.clone(),
        id,
        name: template.name.clone(),
    };
    if let Err(e) = state.backend.log_event(&event).await {
        warn!("Failed to record template edit: {}", e);
    }

    Ok(Json(TemplateView::from(&updated)))
}

async fn delete_templates(
    State(state): State<SharedState>,
    Extension(user): Extension<UserSession>,
    Json(ids): Json<Vec<i64>>,
) -> ApiResult<Json<StatusResponse>> {
    if ids.is_empty() {
        return Err(ApiError::BadRequest(
            "No templates selected for deletion.".to_string(),
        ));
    }

    let names: Vec<String> = state
        .backend
        .templates()
        .await?
        .into_iter()
        .filter(|t| ids.contains(&t.id))
        .map(|t| t.name)
        .collect();

    state.backend.delete_templates(&ids).await?;

    let event = AuditEvent::DeletedTemplates {
        username: user.username.clone(),
        ids: ids.clone(),
        names,
    };
    if let Err(e) = state.backend.log_event(&event).await {
        warn!("Failed to record template deletion: {}", e);
    }

    Ok(ok(format!("Deleted {} template(s)", ids.len())))
}

#[derive(Debug, Serialize)]
struct CatalogEntry {
    name: String,
    label: String,
}

async fn list_parameters(State(state): State<SharedState>) -> ApiResult<Json<Vec<CatalogEntry>>> {
    let names = state.backend.parameters().await?;
    Ok(Json(
        names
            .into_iter()
            .map(|name| CatalogEntry {
                label: short_label(&name).to_string(),
                name,
            })
            .collect(),
    ))
}

async fn list_groups(State(state): State<SharedState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.backend.groups().await?))
}

#[derive(Debug, Deserialize)]
struct NewGroup {
    name: String,
}

async fn add_group(
    State(state): State<SharedState>,
    Json(group): Json<NewGroup>,
) -> ApiResult<Json<StatusResponse>> {
    let name = normalize_group_name(&group.name)?;
    state.backend.add_group(&name).await?;
    Ok(ok("Group added!"))
}

async fn list_users(State(state): State<SharedState>) -> ApiResult<Json<Vec<BackendUser>>> {
    Ok(Json(state.backend.users().await?))
}

#[derive(Debug, Serialize)]
struct Schedules {
    daily: Vec<i64>,
    weekly: Vec<i64>,
    monthly: Vec<i64>,
}

async fn list_schedules(State(state): State<SharedState>) -> ApiResult<Json<Schedules>> {
    Ok(Json(Schedules {
        daily: state.backend.scheduled_template_ids(ReportKind::Daily).await?,
        weekly: state.backend.scheduled_template_ids(ReportKind::Weekly).await?,
        monthly: state.backend.scheduled_template_ids(ReportKind::Monthly).await?,
    }))
}

#[derive(Debug, Serialize)]
struct ReportView {
    #[serde(flatten)]
    report: Report,
    status_label: &'static str,
    generated: String,
}

#[derive(Debug, Serialize)]
struct ReportList {
    kind: ReportKind,
    reports: Vec<ReportView>,
    stats: DashboardStats,
}

fn parse_kind(kind: &str) -> ApiResult<ReportKind> {
    kind.parse().map_err(|e: crate::report::ReportError| ApiError::BadRequest(e.to_string()))
}

async fn list_reports(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
) -> ApiResult<Json<ReportList>> {
    let kind = parse_kind(&kind)?;
    let reports = state.backend.reports(kind).await?;
    let stats = DashboardStats::from_reports(&reports);

    let reports = reports
        .into_iter()
        .map(|report| ReportView {
            status_label: report.status_label(),
            generated: report.formatted_date(),
            report,
        })
        .collect();

    Ok(Json(ReportList { kind, reports, stats }))
}

fn pdf(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response()
}

async fn report_document(
    State(state): State<SharedState>,
    Path((kind, id)): Path<(String, i64)>,
) -> ApiResult<Response> {
    let kind = parse_kind(&kind)?;
    Ok(pdf(state.backend.report_document(kind, id).await?))
}

async fn report_action(
    State(state): State<SharedState>,
    Extension(user): Extension<UserSession>,
    Path((kind, id, action)): Path<(String, i64, String)>,
) -> ApiResult<Json<StatusResponse>> {
    let kind = parse_kind(&kind)?;
    let action: ReportAction = action
        .parse()
        .map_err(|e: crate::report::ReportError| ApiError::BadRequest(e.to_string()))?;

    let report = state
        .backend
        .reports(kind)
        .await?
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| ApiError::NotFound("Unable to find the selected report.".to_string()))?;

    authorize(&report, &user.username, action).map_err(|e| ApiError::Forbidden(e.to_string()))?;

    state.backend.report_action(kind, id, action).await?;
    info!("{} performed {} on {} report {}", user.username, action, kind.as_str(), id);

    Ok(ok(format!("Report \"{}\" {}d successfully", report.name, action)))
}

async fn export_report(
    State(state): State<SharedState>,
    Extension(user): Extension<UserSession>,
    Json(request): Json<ExportRequest>,
) -> ApiResult<Response> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let template = find_template(&state, request.template_id)
        .await
        .map_err(|e| match e {
            ApiError::NotFound(_) => ApiError::NotFound("Please select a template.".to_string()),
            other => other,
        })?;

    match request.mode {
        ExportMode::Manual => {
            let event = AuditEvent::GeneratedReport {
                username: user.username.clone(),
                id: template.id,
                name: template.name.clone(),
            };
            if let Err(e) = state.backend.log_event(&event).await {
                warn!("Failed to record report generation: {}", e);
            }

            let query = request
                .export_query(&user.username)
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            let bytes = state.backend.export_report(&query).await?;
            info!("Exported report for template {} ({} bytes)", template.name, bytes.len());
            Ok(pdf(bytes))
        }
        ExportMode::Schedule { schedule } => Ok(ok(format!(
            "Report scheduled {} successfully!",
            schedule.frequency()
        ))
        .into_response()),
    }
}
