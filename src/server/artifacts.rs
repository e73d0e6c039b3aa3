//! Locating the image a chat turn produced.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::info;

use crate::image_tools::KNOWN_ARTIFACTS;

/// How recently a well-known file must have been written to count as this
/// turn's image when no tool reported one.
pub const GENERATED_IMAGE_WINDOW: Duration = Duration::from_secs(10);

/// `/static/<name>?t=<unix seconds>`; the query defeats browser caching of
/// files that are overwritten in place.
pub fn artifact_url(name: &str, now: SystemTime) -> String {
    let secs = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("/static/{name}?t={secs}")
}

/// First well-known file in `static_dir` modified within the window.
pub async fn recent_artifact(static_dir: &Path, now: SystemTime) -> Option<&'static str> {
    for name in KNOWN_ARTIFACTS {
        let Ok(metadata) = tokio::fs::metadata(static_dir.join(name)).await else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        // A timestamp slightly in the future counts as just written.
        let age = now.duration_since(modified).unwrap_or_default();
        if age < GENERATED_IMAGE_WINDOW {
            info!(file = name, "detected recently generated file");
            return Some(name);
        }
    }
    None
}

/// First well-known file named in the agent's answer.
pub fn mentioned_artifact(text: &str) -> Option<&'static str> {
    KNOWN_ARTIFACTS.into_iter().find(|name| text.contains(*name))
}

/// URL of this turn's image: the artifact a tool reported, else a recently
/// modified well-known file, else one the answer mentions by name.
pub async fn generated_image_url(
    static_dir: &Path,
    reported: Option<&str>,
    answer: &str,
) -> Option<String> {
    let now = SystemTime::now();
    if let Some(name) = reported {
        return Some(artifact_url(name, now));
    }
    let name = match recent_artifact(static_dir, now).await {
        Some(name) => name,
        None => mentioned_artifact(answer)?,
    };
    Some(artifact_url(name, now))
}
