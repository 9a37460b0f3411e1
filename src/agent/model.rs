//! Supported language models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider every supported model is served by.
pub const MODEL_PROVIDER: &str = "google";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    #[default]
    #[serde(rename = "gemini-2.5-flash")]
    Gemini25Flash,
    #[serde(rename = "gemini-2.5-pro")]
    Gemini25Pro,
}

impl ModelId {
    pub const ALL: [ModelId; 2] = [ModelId::Gemini25Flash, ModelId::Gemini25Pro];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gemini25Flash => "gemini-2.5-flash",
            ModelId::Gemini25Pro => "gemini-2.5-pro",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
