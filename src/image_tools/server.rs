//! MCP stdio server exposing the holiday image tools.

use std::path::{Path, PathBuf};

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::TinselError;

use super::generate::{AspectRatio, ImageGenerator, ImageOutcome};
use super::prompts;

pub const SCENE_FILE: &str = "generated_scene.png";
pub const PATTERN_FILE: &str = "generated_pattern.png";
pub const SELFIE_FILE: &str = "generated_selfie.png";
pub const FINAL_PHOTO_FILE: &str = "generated_final_photo.png";

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct HolidaySceneParams {
    /// A description of the user's interests (e.g., "birds", "music").
    pub interest: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct SweaterPatternParams {
    /// A description of the pattern on the sweater (e.g., "snowflake pattern", "reindeer pattern").
    pub motif: String,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct WearingSweaterParams {
    /// Optional absolute path to an uploaded photo of the user. If provided, the avatar will resemble the user.
    #[serde(default)]
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
#[serde(rename_all = "snake_case")]
pub enum ImageToolStatus {
    Generated,
    NoImage,
}

/// Structured result of every image tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct ImageToolResult {
    pub status: ImageToolStatus,
    /// File name of the written image under the static directory.
    pub artifact: Option<String>,
    pub message: String,
}

impl ImageToolResult {
    fn from_outcome(outcome: ImageOutcome, artifact: &str) -> Self {
        match outcome {
            ImageOutcome::Written { .. } => Self {
                status: ImageToolStatus::Generated,
                artifact: Some(artifact.to_string()),
                message: format!("Done! Saved at {artifact}"),
            },
            ImageOutcome::NoImage { text } => Self {
                status: ImageToolStatus::NoImage,
                artifact: None,
                message: if text.is_empty() {
                    "The image model did not return an image.".to_string()
                } else {
                    format!("The image model did not return an image: {text}")
                },
            },
        }
    }
}

/// The four holiday image tools, writing into one static directory.
#[derive(Clone)]
pub struct HolidayImageTools {
    generator: ImageGenerator,
    static_dir: PathBuf,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl HolidayImageTools {
    pub fn new(generator: ImageGenerator, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            generator,
            static_dir: static_dir.into(),
            tool_router: Self::tool_router(),
        }
    }

    /// Serve MCP over this process's stdin/stdout until the client leaves.
    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    /// Generate a holiday scene image themed on the user's interests.
    #[tool(name = "generate_holiday_scene")]
    async fn generate_holiday_scene_tool(
        &self,
        params: Parameters<HolidaySceneParams>,
    ) -> Result<Json<ImageToolResult>, ErrorData> {
        self.holiday_scene(&params.0.interest)
            .await
            .map(Json)
            .map_err(tool_error)
    }

    /// Generate a holiday sweater pattern.
    #[tool(name = "generate_sweater_pattern")]
    async fn generate_sweater_pattern_tool(
        &self,
        params: Parameters<SweaterPatternParams>,
    ) -> Result<Json<ImageToolResult>, ErrorData> {
        self.sweater_pattern(&params.0.motif)
            .await
            .map(Json)
            .map_err(tool_error)
    }

    /// Generate a cute, kawaii, cartoon-style character wearing a sweater with the generated pattern.
    #[tool(name = "generate_wearing_sweater")]
    async fn generate_wearing_sweater_tool(
        &self,
        params: Parameters<WearingSweaterParams>,
    ) -> Result<Json<ImageToolResult>, ErrorData> {
        self.wearing_sweater(params.0.image_path.as_deref())
            .await
            .map(Json)
            .map_err(tool_error)
    }

    /// Generate the final photo: the sweater character placed into the holiday scene.
    #[tool(name = "generate_final_photo")]
    async fn generate_final_photo_tool(
        &self,
    ) -> Result<Json<ImageToolResult>, ErrorData> {
        self.final_photo().await.map(Json).map_err(tool_error)
    }
}

impl HolidayImageTools {
    fn artifact_path(&self, name: &str) -> PathBuf {
        self.static_dir.join(name)
    }

    async fn render(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        artifact: &str,
        references: &[PathBuf],
    ) -> crate::error::Result<ImageToolResult> {
        let outcome = self
            .generator
            .generate_image(prompt, aspect_ratio, &self.artifact_path(artifact), references)
            .await?;
        Ok(ImageToolResult::from_outcome(outcome, artifact))
    }

    pub async fn holiday_scene(&self, interest: &str) -> crate::error::Result<ImageToolResult> {
        self.render(
            &prompts::holiday_scene(interest),
            AspectRatio::Landscape,
            SCENE_FILE,
            &[],
        )
        .await
    }

    pub async fn sweater_pattern(&self, motif: &str) -> crate::error::Result<ImageToolResult> {
        self.render(
            &prompts::sweater_pattern(motif),
            AspectRatio::Square,
            PATTERN_FILE,
            &[],
        )
        .await
    }

    pub async fn wearing_sweater(
        &self,
        image_path: Option<&str>,
    ) -> crate::error::Result<ImageToolResult> {
        let person = match image_path.filter(|p| !p.trim().is_empty()) {
            Some(path) => self.generator.describe_person(Path::new(path)).await,
            None => prompts::PERSON_FALLBACK.to_string(),
        };
        self.render(
            &prompts::wearing_sweater(&person),
            AspectRatio::Square,
            SELFIE_FILE,
            &[self.artifact_path(PATTERN_FILE)],
        )
        .await
    }

    pub async fn final_photo(&self) -> crate::error::Result<ImageToolResult> {
        let mut references = Vec::new();
        for name in [SELFIE_FILE, SCENE_FILE] {
            let path = self.artifact_path(name);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                references.push(path);
            }
        }
        info!(references = references.len(), "composing final photo");
        self.render(
            prompts::FINAL_PHOTO,
            AspectRatio::Landscape,
            FINAL_PHOTO_FILE,
            &references,
        )
        .await
    }
}

#[tool_handler]
impl ServerHandler for HolidayImageTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Holiday image tools: generate_holiday_scene, generate_sweater_pattern, \
                 generate_wearing_sweater, generate_final_photo. Images are written to the \
                 static directory and reported by file name."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

fn tool_error(error: TinselError) -> ErrorData {
    tracing::error!(error = %error, "image tool failed");
    ErrorData::internal_error(error.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_outcome_reports_artifact() {
        let result = ImageToolResult::from_outcome(
            ImageOutcome::Written {
                path: PathBuf::from("static/generated_scene.png"),
            },
            SCENE_FILE,
        );
        assert_eq!(result.status, ImageToolStatus::Generated);
        assert_eq!(result.artifact.as_deref(), Some("generated_scene.png"));
    }

    #[test]
    fn missing_image_has_no_artifact() {
        let result = ImageToolResult::from_outcome(
            ImageOutcome::NoImage {
                text: "I can't draw that".into(),
            },
            PATTERN_FILE,
        );
        assert_eq!(result.status, ImageToolStatus::NoImage);
        assert_eq!(result.artifact, None);
        assert!(result.message.contains("I can't draw that"));
        assert_eq!(
            serde_json::to_value(&result).unwrap()["status"],
            "no_image"
        );
    }

    #[tokio::test]
    async fn handler_answers_a_client_over_a_duplex_transport() {
        use crate::config::AuthMode;
        use crate::provider::GeminiClient;

        let dir = tempfile::tempdir().unwrap();
        let generator = ImageGenerator::new(
            GeminiClient::new(AuthMode::ApiKey { api_key: None }),
            "image-model",
            "text-model",
        );
        let tools = HolidayImageTools::new(generator, dir.path());
        let (server_io, client_io) = tokio::io::duplex(64 * 1024);
        tokio::spawn(async move {
            if let Ok(service) = tools.serve(server_io).await {
                let _ = service.waiting().await;
            }
        });

        let client = ().serve(client_io).await.unwrap();
        let listed = client.list_all_tools().await.unwrap();
        assert_eq!(listed.len(), 4);
        let info = client.peer_info().unwrap();
        assert!(info.capabilities.tools.is_some());
        client.cancel().await.unwrap();
    }

    #[test]
    fn router_lists_all_four_tools() {
        let tools = HolidayImageTools::tool_router().list_all();
        let mut names: Vec<String> = tools.iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "generate_final_photo",
                "generate_holiday_scene",
                "generate_sweater_pattern",
                "generate_wearing_sweater"
            ]
        );
    }
}
