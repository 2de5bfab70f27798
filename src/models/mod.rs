// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod heading;
pub mod lead;
pub mod post;

pub use heading::HeadingItem;
pub use lead::{CrmContact, CustomField, LeadSubmission, RelayResult};
pub use post::{
    BlogPost, BlogSummary, CategoryCount, PostInput, PostMetadata, RenderedPost, UpsertOutcome,
};
