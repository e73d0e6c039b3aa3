//! Tests for the tool system and the tree tools.

use pretty_assertions::assert_eq;
use serde_json::json;

use tinsel::tools::*;
use tinsel::tree::{tree_tools, TreeStateHandle};

fn find(tools: &[std::sync::Arc<dyn Tool>], name: &str) -> std::sync::Arc<dyn Tool> {
    tools.iter().find(|t| t.name() == name).cloned().unwrap()
}

#[test]
fn tree_tool_declarations() {
    let tools = tree_tools(TreeStateHandle::default());
    let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
    assert_eq!(
        names,
        vec![
            "update_tree_config",
            "get_tree_state",
            "analyze_image_and_suggest_texture"
        ]
    );

    let update = find(&tools, "update_tree_config");
    assert_eq!(
        update.definition().parameters["required"],
        json!(["config_key", "value"])
    );
    assert!(find(&tools, "get_tree_state").definition().parameters["properties"]
        .as_object()
        .unwrap()
        .is_empty());
}

#[test]
fn tool_arguments_deserialize() {
    #[derive(serde::Deserialize, PartialEq, Debug)]
    struct Params {
        interest: String,
        image_path: Option<String>,
    }

    let args = ToolArguments::new(json!({"interest": "birds"}));
    let params: Params = args.deserialize().unwrap();
    assert_eq!(
        params,
        Params {
            interest: "birds".into(),
            image_path: None
        }
    );
}

#[tokio::test]
async fn update_then_read_tree_state() {
    let state = TreeStateHandle::default();
    let tools = tree_tools(state.clone());
    let ctx = ToolExecutionContext::default();

    let updated = find(&tools, "update_tree_config")
        .execute(
            &ToolArguments::new(json!({"config_key": "theme", "value": "silver_frost"})),
            &ctx,
        )
        .await
        .unwrap();
    assert_eq!(updated["status"], "success");
    assert_eq!(updated["updated_state"]["theme"], "silver_frost");

    let current = find(&tools, "get_tree_state")
        .execute(&ToolArguments::new(json!({})), &ctx)
        .await
        .unwrap();
    assert_eq!(
        current,
        json!({"lights_color": "warm_white", "ornament_texture": "default_gold", "theme": "silver_frost"})
    );
}

#[tokio::test]
async fn unknown_key_is_rejected_without_change() {
    let state = TreeStateHandle::default();
    let tools = tree_tools(state.clone());
    let before = state.snapshot().await;

    let result = find(&tools, "update_tree_config")
        .execute(
            &ToolArguments::new(json!({"config_key": "star_color", "value": "gold"})),
            &ToolExecutionContext::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        result,
        json!({"status": "error", "message": "Invalid configuration key: star_color"})
    );
    assert_eq!(state.snapshot().await, before);
}

#[tokio::test]
async fn texture_suggestion_follows_keywords() {
    let tools = tree_tools(TreeStateHandle::default());
    let suggest = find(&tools, "analyze_image_and_suggest_texture");
    let ctx = ToolExecutionContext::default();

    for (description, texture) in [
        ("A Red scarf with blue stripes", "red_velvet"),
        ("a blue winter sky", "blue_ice"),
        ("a shining star", "star_pattern"),
        ("a cozy cabin", "default_gold"),
    ] {
        let result = suggest
            .execute(&ToolArguments::new(json!({"image_description": description})), &ctx)
            .await
            .unwrap();
        assert_eq!(
            result["suggested_texture"],
            format!("https://example.com/textures/{texture}.jpg")
        );
    }
}
