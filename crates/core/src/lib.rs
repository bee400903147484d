pub mod catalog;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod errors;
pub mod taste;

pub use catalog::{Catalog, CatalogEntry};
pub use conversation::{ConversationAnalyzer, ConversationInsights, ExperienceLevel};
pub use domain::preference::{
    ConversationMessage, OutputFormat, PreferenceInput, PriceBand, RequestType, Role,
};
pub use domain::recommendation::{RecommendationResult, RecommendedItem};
pub use errors::{EndpointFailure, InterfaceError, PipelineError};
pub use taste::{PreferenceAnalyzer, Quadrant, TasteCharacteristics, TasteProfile};
