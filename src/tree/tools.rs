//! In-process tools for the tree.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use super::state::TreeStateHandle;
use crate::tools::{no_parameters, AgentTool, ParameterBuilder, Tool};

const TEXTURE_BASE_URL: &str = "https://example.com/textures";

/// `update_tree_config`, `get_tree_state` and
/// `analyze_image_and_suggest_texture`, bound to one state handle.
pub fn tree_tools(state: TreeStateHandle) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(update_tree_config(state.clone())),
        Arc::new(get_tree_state(state)),
        Arc::new(analyze_image_and_suggest_texture()),
    ]
}

pub fn update_tree_config(state: TreeStateHandle) -> AgentTool {
    AgentTool::new(
        "update_tree_config",
        "Updates the configuration of the Christmas tree. Keys are 'lights_color', \
         'ornament_texture' and 'theme'. Returns the updated tree state.",
        ParameterBuilder::new()
            .string(
                "config_key",
                "The configuration key to update (e.g., 'lights_color', 'ornament_texture', 'theme').",
            )
            .string("value", "The new value for the configuration.")
            .build(),
        move |args, _ctx| {
            let state = state.clone();
            async move {
                let key = args.get_str("config_key")?;
                let value = args.get_str("value")?;
                match state.update(key, value).await {
                    Some(updated) => {
                        info!(key, value, "tree updated");
                        Ok(json!({
                            "status": "success",
                            "updated_state": updated,
                            "message": format!("Updated {key} to {value}"),
                        }))
                    }
                    None => Ok(json!({
                        "status": "error",
                        "message": format!("Invalid configuration key: {key}"),
                    })),
                }
            }
        },
    )
}

pub fn get_tree_state(state: TreeStateHandle) -> AgentTool {
    AgentTool::new(
        "get_tree_state",
        "Retrieves the current state of the Christmas tree.",
        no_parameters(),
        move |_args, _ctx| {
            let state = state.clone();
            async move { Ok(serde_json::to_value(state.snapshot().await)?) }
        },
    )
}

pub fn analyze_image_and_suggest_texture() -> AgentTool {
    AgentTool::new(
        "analyze_image_and_suggest_texture",
        "Suggests an ornament texture from a description of an uploaded image \
         (provided by the model's vision capabilities).",
        ParameterBuilder::new()
            .string("image_description", "A description of the uploaded image.")
            .build(),
        |args, _ctx| async move {
            let description = args.get_str("image_description")?;
            Ok(json!({
                "suggested_texture": suggest_texture_url(description),
                "reasoning": format!(
                    "Based on the image description '{description}', we suggest this texture."
                ),
            }))
        },
    )
}

/// First matching keyword wins: red, then blue, then star.
pub fn suggest_texture_url(description: &str) -> String {
    let lower = description.to_lowercase();
    let texture = [("red", "red_velvet"), ("blue", "blue_ice"), ("star", "star_pattern")]
        .into_iter()
        .find_map(|(keyword, texture)| lower.contains(keyword).then_some(texture))
        .unwrap_or("default_gold");
    format!("{TEXTURE_BASE_URL}/{texture}.jpg")
}
