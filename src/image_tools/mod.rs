//! Image tool layer: Gemini image generation exposed as an MCP server.

pub mod generate;
pub mod prompts;
pub mod server;

pub use generate::{AspectRatio, ImageGenerator, ImageOutcome};
pub use server::{
    HolidayImageTools, ImageToolResult, ImageToolStatus, FINAL_PHOTO_FILE, PATTERN_FILE,
    SCENE_FILE, SELFIE_FILE,
};

/// Artifacts the image tools can produce, in the order the HTTP layer scans them.
pub const KNOWN_ARTIFACTS: [&str; 4] = [SCENE_FILE, PATTERN_FILE, SELFIE_FILE, FINAL_PHOTO_FILE];
