// file: src/models/heading.rs
// description: table of contents entry derived from a post body
// reference: internal data structures

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingItem {
    pub id: String,
    pub text: String,
    pub level: u8,
}

impl HeadingItem {
    pub fn new(level: u8, text: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            level,
        }
    }

    pub fn anchor(&self) -> String {
        format!("#{}", self.id)
    }
}
