//! Image generation and person description against the Gemini image model.

use std::path::{Path, PathBuf};

use strum::{AsRefStr, Display, EnumString};
use tracing::{error, info, warn};

use crate::config::TinselConfig;
use crate::error::{Result, TinselError};
use crate::provider::google::{
    Blob, Content, GenerateContentRequest, GenerationConfig, ImageConfig, Part,
};
use crate::provider::GeminiClient;
use crate::types::ImageContent;

use super::prompts::{DESCRIBE_PERSON, PERSON_FALLBACK};

/// Aspect ratio tag understood by the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
pub enum AspectRatio {
    #[strum(serialize = "1:1")]
    Square,
    #[strum(serialize = "16:9")]
    Landscape,
    #[strum(serialize = "9:16")]
    Portrait,
    #[strum(serialize = "4:3")]
    Standard,
    #[strum(serialize = "3:4")]
    StandardPortrait,
}

/// What an image generation call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    /// The first inline image was written to `path`.
    Written { path: PathBuf },
    /// The model answered without an image; `text` is whatever it said.
    NoImage { text: String },
}

/// Calls the image and text models on behalf of the image tools.
#[derive(Debug, Clone)]
pub struct ImageGenerator {
    client: GeminiClient,
    image_model: String,
    text_model: String,
}

impl ImageGenerator {
    pub fn new(
        client: GeminiClient,
        image_model: impl Into<String>,
        text_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            image_model: image_model.into(),
            text_model: text_model.into(),
        }
    }

    pub fn from_config(config: &TinselConfig) -> Self {
        Self::new(
            GeminiClient::from_config(config),
            config.image_model.clone(),
            config.text_model.clone(),
        )
    }

    /// Generate one image from `prompt` (plus any reference images) and save
    /// the first inline image to `output_path`, creating parent directories.
    /// Missing reference files are skipped.
    pub async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        output_path: &Path,
        references: &[PathBuf],
    ) -> Result<ImageOutcome> {
        let preview: String = prompt.trim().chars().take(50).collect();
        info!(prompt = %preview, output = %output_path.display(), %aspect_ratio, "generating image");

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut parts = vec![Part::text(prompt)];
        for reference in references {
            match ImageContent::from_file(reference).await {
                Ok(image) => parts.push(Part::image(&image)),
                Err(e) => {
                    warn!(path = %reference.display(), error = %e, "skipping missing reference image")
                }
            }
        }

        let request = GenerateContentRequest {
            contents: vec![Content::user(parts)],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["TEXT".into(), "IMAGE".into()]),
                image_config: Some(ImageConfig {
                    aspect_ratio: aspect_ratio.to_string(),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let response = self
            .client
            .generate_content(&self.image_model, &request)
            .await?;

        let text = response.text();
        if !text.is_empty() {
            info!(text = %text, "image model text");
        }

        match response.first_inline_image() {
            Some(blob) => {
                let bytes = decode_blob(blob)?;
                tokio::fs::write(output_path, &bytes).await?;
                info!(path = %output_path.display(), bytes = bytes.len(), "image saved");
                Ok(ImageOutcome::Written {
                    path: output_path.to_path_buf(),
                })
            }
            None => {
                warn!(output = %output_path.display(), "image model returned no image");
                Ok(ImageOutcome::NoImage { text })
            }
        }
    }

    /// Describe the person in a photo for an avatar prompt. Any failure
    /// (missing file, API error, empty answer) yields "a happy person".
    pub async fn describe_person(&self, image_path: &Path) -> String {
        info!(path = %image_path.display(), "analyzing person features");
        match self.try_describe_person(image_path).await {
            Ok(Some(description)) => {
                info!(%description, "person description");
                description
            }
            Ok(None) => PERSON_FALLBACK.to_string(),
            Err(e) => {
                error!(error = %e, "error analyzing person features");
                PERSON_FALLBACK.to_string()
            }
        }
    }

    async fn try_describe_person(&self, image_path: &Path) -> Result<Option<String>> {
        if !tokio::fs::try_exists(image_path).await.unwrap_or(false) {
            warn!(path = %image_path.display(), "image not found for analysis");
            return Ok(None);
        }
        let image = ImageContent::from_file(image_path).await?;
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::text(DESCRIBE_PERSON),
                Part::image(&image),
            ])],
            ..Default::default()
        };
        let response = self
            .client
            .generate_content(&self.text_model, &request)
            .await?;
        let text = response.text();
        let text = text.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }
}

fn decode_blob(blob: &Blob) -> Result<Vec<u8>> {
    ImageContent {
        data: blob.data.clone(),
        mime_type: blob.mime_type.clone(),
    }
    .decode()
    .map_err(|e| TinselError::api(200, format!("image model returned undecodable data: {e}")))
}
