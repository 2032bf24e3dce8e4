//! Handlers for `/api/ngx/*`.

use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::header,
    response::IntoResponse,
    Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::mutation::{MutationReport, MutationRequest};
use crate::store::ConfigName;

/// Wire form of one config file.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigFileView {
    pub filename: String,
    pub content: String,
}

/// Form body of POST/PUT.
#[derive(Debug, Deserialize)]
pub struct ContentForm {
    content: Option<String>,
}

#[derive(Serialize)]
pub struct AgentStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub mutation_stage: &'static str,
}

/// `GET /api/ngx/configs`
pub async fn list_configs(State(state): State<AppState>) -> Result<Json<Vec<ConfigFileView>>, ApiError> {
    let files = state.coordinator.store().list().await?;
    let views: Vec<ConfigFileView> = files
        .into_iter()
        .map(|f| ConfigFileView {
            filename: f.filename,
            content: String::from_utf8_lossy(&f.content).into_owned(),
        })
        .collect();

    tracing::info!(count = views.len(), "Listed configs");
    Ok(Json(views))
}

/// `GET /api/ngx/configs/{filename}`
pub async fn show_config(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let name = ConfigName::parse(&filename)?;
    let content = state.coordinator.store().read(&name).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], content))
}

/// `POST /api/ngx/configs/{filename}`
pub async fn upload_config(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    form: Result<Form<ContentForm>, FormRejection>,
) -> Result<&'static str, ApiError> {
    let content = required_content(form)?;
    submit(&state, MutationRequest::create(filename, content)).await?;
    Ok("Config uploaded successfully")
}

/// `PUT /api/ngx/configs/{filename}`
pub async fn update_config(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    form: Result<Form<ContentForm>, FormRejection>,
) -> Result<&'static str, ApiError> {
    let content = required_content(form)?;
    submit(&state, MutationRequest::update(filename, content)).await?;
    Ok("Config updated successfully")
}

/// `DELETE /api/ngx/configs/{filename}`
pub async fn delete_config(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<&'static str, ApiError> {
    submit(&state, MutationRequest::delete(filename)).await?;
    Ok("Config deleted successfully")
}

/// Mutating routes hit without a filename segment.
pub async fn missing_filename() -> ApiError {
    ApiError::BadRequest("Missing filename in request")
}

/// `GET /api/ngx/health`
pub async fn get_status(State(state): State<AppState>) -> Json<AgentStatus> {
    Json(AgentStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
        mutation_stage: state.coordinator.stage().as_str(),
    })
}

fn required_content(form: Result<Form<ContentForm>, FormRejection>) -> Result<String, ApiError> {
    match form {
        Ok(Form(ContentForm { content: Some(content) })) if !content.is_empty() => Ok(content),
        _ => Err(ApiError::BadRequest("Missing content in request")),
    }
}

/// Run the mutation on its own task so it reaches a terminal state even if
/// the client goes away or the request times out.
async fn submit(state: &AppState, request: MutationRequest) -> Result<MutationReport, ApiError> {
    let coordinator = state.coordinator.clone();
    match tokio::spawn(async move { coordinator.apply(request).await }).await {
        Ok(result) => Ok(result?),
        Err(e) => {
            tracing::error!(error = %e, "Mutation task did not complete");
            Err(ApiError::Aborted)
        }
    }
}
