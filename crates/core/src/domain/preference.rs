//! Boundary-facing request payload and conversation types.
//!
//! Field names follow the public wire contract (camelCase), so these types
//! deserialize the browser payload directly.

use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

pub const DEFAULT_MIN_PRICE_YEN: u32 = 0;
pub const DEFAULT_MAX_PRICE_YEN: u32 = 50_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Immutable once appended; insertion order is significant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum RequestType {
    FullRecommendation,
    #[default]
    Chat,
}

/// Anything other than `full_recommendation` is treated as a chat turn.
impl From<String> for RequestType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "full_recommendation" => Self::FullRecommendation,
            _ => Self::Chat,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum OutputFormat {
    Json,
    #[default]
    Text,
}

/// Unknown formats degrade to prose rather than failing the request.
impl From<String> for OutputFormat {
    fn from(value: String) -> Self {
        match value.as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceInput {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub taste_x: Option<f64>,
    pub taste_y: Option<f64>,
    pub complexity_x: Option<f64>,
    pub complexity_y: Option<f64>,
    #[serde(default)]
    pub additional_preferences: String,
    #[serde(default)]
    pub chat_history: Vec<ConversationMessage>,
    #[serde(default)]
    pub request_type: RequestType,
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// Ordered price bounds in whole yen, resolved from the raw payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceBand {
    pub min_yen: u32,
    pub max_yen: u32,
}

impl PreferenceInput {
    /// Checks every numeric field before any downstream work happens.
    pub fn validate(&self) -> Result<PriceBand, PipelineError> {
        for (field, value) in [
            ("minPrice", self.min_price),
            ("maxPrice", self.max_price),
            ("tasteX", self.taste_x),
            ("tasteY", self.taste_y),
            ("complexityX", self.complexity_x),
            ("complexityY", self.complexity_y),
        ] {
            if let Some(value) = value {
                if !value.is_finite() {
                    return Err(PipelineError::Validation(format!(
                        "`{field}` must be a finite number"
                    )));
                }
            }
        }

        self.price_band()
    }

    /// Price bounds default when absent and are never negative.
    pub fn price_band(&self) -> Result<PriceBand, PipelineError> {
        let min_yen = resolve_price(self.min_price, DEFAULT_MIN_PRICE_YEN);
        let max_yen = resolve_price(self.max_price, DEFAULT_MAX_PRICE_YEN);

        if min_yen > max_yen {
            return Err(PipelineError::Validation(format!(
                "minPrice ({min_yen}) must not exceed maxPrice ({max_yen})"
            )));
        }

        Ok(PriceBand { min_yen, max_yen })
    }

    pub fn wants_structured_output(&self) -> bool {
        self.output_format == OutputFormat::Json
    }
}

fn resolve_price(raw: Option<f64>, default_yen: u32) -> u32 {
    match raw {
        Some(value) if value.is_finite() && value > 0.0 => value.round().min(u32::MAX as f64) as u32,
        Some(_) => 0,
        None => default_yen,
    }
}
