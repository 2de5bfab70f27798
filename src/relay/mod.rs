// file: src/relay/mod.rs
// description: lead relay and attribution tracking exports
// reference: internal module structure

pub mod crm;
pub mod tracking;

pub use crm::LeadRelay;
pub use tracking::{LandingVisit, SourceTracking, TrackingStore, classify_referrer};
