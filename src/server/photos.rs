//! `GET /api/photos`.

use std::path::Path;

use axum::extract::State;
use axum::Json;
use futures::StreamExt;
use tokio_stream::wrappers::ReadDirStream;
use tracing::warn;

use super::state::AppState;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "svg"];

pub async fn list_photos(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(photo_urls(state.static_dir()).await)
}

/// `/static/<name>` for each top-level image file, sorted by name.
pub async fn photo_urls(static_dir: &Path) -> Vec<String> {
    let read_dir = match tokio::fs::read_dir(static_dir).await {
        Ok(read_dir) => read_dir,
        Err(e) => {
            warn!(dir = %static_dir.display(), error = %e, "static directory unreadable");
            return Vec::new();
        }
    };

    let mut names: Vec<String> = ReadDirStream::new(read_dir)
        .filter_map(|entry| async move {
            let entry = entry.ok()?;
            if !entry.file_type().await.ok()?.is_file() {
                return None;
            }
            let name = entry.file_name().into_string().ok()?;
            is_image_name(&name).then_some(name)
        })
        .collect()
        .await;
    names.sort();
    names.into_iter().map(|name| format!("/static/{name}")).collect()
}

fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
