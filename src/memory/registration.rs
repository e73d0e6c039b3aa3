//! One-off registration of a reasoning engine with a customized Memory Bank.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::vertex::MemoryBankClient;
use crate::error::{Result, TinselError};

pub const AGENT_DISPLAY_NAME: &str = "christmas_tree_agent_engine_custom";

const HOLIDAY_TOPIC_LABEL: &str = "holiday_preferences";
const HOLIDAY_TOPIC_DESCRIPTION: &str = "The user's holiday and sweater design preferences: \
favorite colors, motifs and patterns, garment styles, and the hobbies, pets and interests \
they want reflected in their designs and holiday scenes.";

/// One turn of a few-shot conversation.
struct ExampleTurn {
    role: &'static str,
    text: &'static str,
}

/// A conversation paired with the memories it should produce.
struct MemoryExample {
    turns: &'static [ExampleTurn],
    facts: &'static [&'static str],
}

const EXAMPLES: &[MemoryExample] = &[
    MemoryExample {
        turns: &[
            ExampleTurn {
                role: "user",
                text: "I want a sweater that matches my dog. He's a golden retriever.",
            },
            ExampleTurn {
                role: "model",
                text: "That sounds adorable! A golden retriever themed sweater would be great. Do you want a picture of him on it or just matching colors?",
            },
            ExampleTurn {
                role: "user",
                text: "Maybe just the color, like a golden yellow. And I like skiing, so maybe add some snowflakes.",
            },
        ],
        facts: &[
            "User has a golden retriever dog",
            "User prefers a golden yellow color for their sweater",
            "User likes skiing",
            "User wants snowflake patterns on their sweater",
        ],
    },
    MemoryExample {
        turns: &[
            ExampleTurn {
                role: "user",
                text: "I'm a programmer, so I want something geeky. Maybe a matrix style?",
            },
            ExampleTurn {
                role: "model",
                text: "A Matrix style sweater sounds cool! We could do falling code rain patterns.",
            },
            ExampleTurn {
                role: "user",
                text: "Yes! Green code on black. And make it a hoodie style if possible.",
            },
        ],
        facts: &[
            "User is a programmer",
            "User wants a 'Matrix' style sweater with falling code rain pattern",
            "User prefers green code on black background",
            "User prefers hoodie style sweaters",
        ],
    },
];

/// Request body for creating the reasoning engine.
pub fn engine_request_body() -> Value {
    let examples: Vec<Value> = EXAMPLES
        .iter()
        .map(|example| {
            json!({
                "conversationSource": {
                    "events": example.turns.iter().map(|turn| json!({
                        "content": { "role": turn.role, "parts": [{ "text": turn.text }] }
                    })).collect::<Vec<_>>()
                },
                "generatedMemories": example.facts.iter()
                    .map(|fact| json!({ "fact": fact }))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({
        "displayName": AGENT_DISPLAY_NAME,
        "contextSpec": {
            "memoryBankConfig": {
                "customizationConfigs": [{
                    "memoryTopics": [
                        { "customMemoryTopic": {
                            "label": HOLIDAY_TOPIC_LABEL,
                            "description": HOLIDAY_TOPIC_DESCRIPTION,
                        }},
                        { "managedMemoryTopic": { "managedTopicEnum": "USER_PERSONAL_INFO" } },
                        { "managedMemoryTopic": { "managedTopicEnum": "USER_PREFERENCES" } },
                    ],
                    "generateMemoriesExamples": examples,
                }]
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct Operation {
    name: String,
}

/// Pull the engine id out of a resource or operation name
/// (`projects/p/locations/l/reasoningEngines/{id}[/operations/{op}]`).
pub fn engine_id_from_name(name: &str) -> Option<&str> {
    let mut segments = name.split('/');
    segments.find(|s| *s == "reasoningEngines")?;
    segments.next().filter(|id| !id.is_empty())
}

/// Create the engine and return its id.
pub async fn register_agent_engine(client: &MemoryBankClient) -> Result<String> {
    info!(display_name = AGENT_DISPLAY_NAME, "registering agent engine");
    let operation: Operation = client
        .post("reasoningEngines", &engine_request_body())
        .await?;
    let engine_id = engine_id_from_name(&operation.name).ok_or_else(|| {
        TinselError::api(
            200,
            format!("unexpected reasoning engine operation name: {}", operation.name),
        )
    })?;
    info!(engine_id, "agent engine registered");
    Ok(engine_id.to_string())
}
