//! Shared application state for the HTTP handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::agent::Runner;
use crate::tree::TreeStateHandle;

pub const APP_NAME: &str = "agents";
pub const USER_ID: &str = "demo_user";
/// Session id used for anonymous callers when no session is known yet.
pub const DEFAULT_SESSION_ID: &str = "demo_session";

#[derive(Clone)]
pub struct AppState {
    pub runner: Runner,
    pub tree: TreeStateHandle,
    pub static_dir: PathBuf,
    /// Session used by requests that carry no `session_id`. Shared by every
    /// anonymous caller; last write wins.
    pub current_session: Arc<Mutex<Option<String>>>,
}

impl AppState {
    pub fn new(runner: Runner, tree: TreeStateHandle, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            tree,
            static_dir: static_dir.into(),
            current_session: Arc::new(Mutex::new(None)),
        }
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.static_dir.join("uploads")
    }
}
