//! `POST /api/chat`: one user turn through the agent.

use std::path::{Path, PathBuf};

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::session::SessionKey;
use crate::tree::TreeState;
use crate::types::ModelMessage;

use super::artifacts::generated_image_url;
use super::error::ApiError;
use super::state::{AppState, APP_NAME, DEFAULT_SESSION_ID, USER_ID};

pub const EMPTY_RESPONSE: &str = "I'm sorry, I didn't get a response.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub tree_state: TreeState,
    pub generated_image: Option<String>,
    pub session_id: String,
}

#[derive(Debug, Default)]
struct ChatForm {
    message: Option<String>,
    session_id: Option<String>,
    upload: Option<(String, Vec<u8>)>,
}

async fn read_form(mut multipart: Multipart) -> std::result::Result<ChatForm, ApiError> {
    let mut form = ChatForm::default();
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("message") => form.message = Some(field.text().await?),
            Some("session_id") => {
                let id = field.text().await?;
                form.session_id = Some(id.trim().to_string()).filter(|id| !id.is_empty());
            }
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                // Browsers send an empty file part when nothing was chosen.
                if let Some(file_name) = file_name.filter(|n| !n.is_empty()) {
                    form.upload = Some((file_name, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

pub async fn chat(
    State(state): State<AppState>,
    multipart: Multipart,
) -> std::result::Result<Json<ChatResponse>, ApiError> {
    let form = read_form(multipart).await?;
    let Some(mut message) = form.message else {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "field 'message' is required",
        ));
    };

    if let Some((file_name, bytes)) = form.upload {
        let saved = save_upload(&state.uploads_dir(), &file_name, &bytes).await?;
        message.push_str(&format!(
            "\n[System: User uploaded an image. It is saved at: {}]",
            saved.display()
        ));
    }

    let session_id = resolve_session(&state, form.session_id).await?;
    info!(%session_id, "running agent");

    let mut events = state
        .runner
        .run(USER_ID, &session_id, ModelMessage::user(message));
    let mut response = String::new();
    let mut reported = None;
    while let Some(event) = events.next().await {
        let event = event?;
        if let Some(artifact) = event.artifact() {
            reported = Some(artifact.to_string());
        }
        if event.is_final_response() {
            response = event.text().unwrap_or_default().to_string();
            break;
        }
    }
    let generated_image =
        generated_image_url(state.static_dir(), reported.as_deref(), &response).await;
    if response.trim().is_empty() {
        response = EMPTY_RESPONSE.to_string();
    }

    Ok(Json(ChatResponse {
        response,
        tree_state: state.tree.snapshot().await,
        generated_image,
        session_id,
    }))
}

/// Write an uploaded file under `uploads_dir` using only the final component
/// of the client's file name. Returns the absolute path.
pub async fn save_upload(uploads_dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let name = upload_basename(file_name);
    tokio::fs::create_dir_all(uploads_dir).await?;
    let path = uploads_dir.join(name);
    tokio::fs::write(&path, bytes).await?;
    let path = tokio::fs::canonicalize(&path).await?;
    info!(path = %path.display(), "file saved");
    Ok(path)
}

/// Final path component of a client-supplied name, treating both `/` and
/// `\` as separators.
pub fn upload_basename(file_name: &str) -> &str {
    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();
    match name {
        "" | "." | ".." => "upload",
        name => name,
    }
}

/// The session this request runs in: the client's `session_id`, else the
/// shared current session, else `demo_session`. A session that cannot be
/// found is created under the same id.
async fn resolve_session(state: &AppState, requested: Option<String>) -> Result<String> {
    match requested {
        Some(id) => {
            ensure_session(state, &id).await?;
            Ok(id)
        }
        None => {
            let mut slot = state.current_session.lock().await;
            let id = slot
                .clone()
                .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());
            ensure_session(state, &id).await?;
            *slot = Some(id.clone());
            Ok(id)
        }
    }
}

async fn ensure_session(state: &AppState, session_id: &str) -> Result<()> {
    let sessions = state.runner.sessions();
    let key = SessionKey::new(APP_NAME, USER_ID, session_id);
    match sessions.get_session(&key).await {
        Ok(Some(_)) => {
            info!(session_id, "session found");
            return Ok(());
        }
        Ok(None) => {}
        Err(e) => warn!(session_id, error = %e, "failed to retrieve session"),
    }
    let session = sessions
        .create_session(APP_NAME, USER_ID, Some(session_id))
        .await?;
    info!(session_id = session.id(), "new session created");
    Ok(())
}
