// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod processor;

pub use processor::{CheckProblem, CheckReport, ContentPipeline};
