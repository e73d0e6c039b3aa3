//! Flat key/value tree state.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

pub const LIGHTS_COLOR: &str = "lights_color";
pub const ORNAMENT_TEXTURE: &str = "ornament_texture";
pub const THEME: &str = "theme";

/// Tree display settings. Only the three default keys exist; values are
/// free-form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeState(BTreeMap<String, String>);

impl Default for TreeState {
    fn default() -> Self {
        Self(BTreeMap::from([
            (LIGHTS_COLOR.to_string(), "warm_white".to_string()),
            (ORNAMENT_TEXTURE.to_string(), "default_gold".to_string()),
            (THEME.to_string(), "emerald_gold".to_string()),
        ]))
    }
}

impl TreeState {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Set a recognized key. Returns false (and changes nothing) for an
    /// unknown key.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.0.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }
}

/// Process-wide tree state shared by the HTTP layer and the tree tools.
#[derive(Debug, Clone, Default)]
pub struct TreeStateHandle {
    inner: Arc<RwLock<TreeState>>,
}

impl TreeStateHandle {
    pub fn new(state: TreeState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn snapshot(&self) -> TreeState {
        self.inner.read().await.clone()
    }

    /// Update one key; on success returns the state after the change.
    pub async fn update(&self, key: &str, value: &str) -> Option<TreeState> {
        let mut state = self.inner.write().await;
        state.set(key, value).then(|| state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_state_serializes_as_flat_map() {
        assert_eq!(
            serde_json::to_value(TreeState::default()).unwrap(),
            json!({
                "lights_color": "warm_white",
                "ornament_texture": "default_gold",
                "theme": "emerald_gold"
            })
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut state = TreeState::default();
        assert!(!state.set("star_topper", "gold"));
        assert_eq!(state, TreeState::default());
    }

    #[tokio::test]
    async fn handle_clones_share_state() {
        let handle = TreeStateHandle::default();
        let other = handle.clone();
        let updated = other.update(THEME, "candy_cane").await.unwrap();
        assert_eq!(updated.get(THEME), Some("candy_cane"));
        assert_eq!(handle.snapshot().await.get(THEME), Some("candy_cane"));
    }
}
