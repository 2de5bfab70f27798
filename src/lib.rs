// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod relay;
pub mod store;
pub mod utils;

pub use api::{AppState, build_router, run_api};
pub use config::{
    AdminConfig, BlogConfig, Config, CrmConfig, ServerConfig, TrackingConfig, UploadConfig,
};
pub use error::{CmsError, Result};
pub use models::{
    BlogPost, BlogSummary, CategoryCount, HeadingItem, LeadSubmission, PostInput, PostMetadata,
    RelayResult, RenderedPost, UpsertOutcome,
};
pub use parser::{
    FrontmatterCodec, HeadingAnchor, HeadingExtractor, LevelRange, MarkdownRenderer, ParsedPost,
    clean_heading_text, slugify, strip_html,
};
pub use pipeline::{CheckReport, ContentPipeline};
pub use relay::{LandingVisit, LeadRelay, SourceTracking, TrackingStore};
pub use store::{BlogStore, ImageUploader, UploadedImage};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        let pipeline = ContentPipeline::from_config(&config.blog);
        assert_eq!(pipeline.extractor().levels(), LevelRange::ARTICLE);
        assert_eq!(slugify("Hello World"), "hello-world");
    }
}
