//! Recommendation pipeline - prompt assembly, dispatch, and normalization
//!
//! This crate is the orchestration layer of the dramwise system. One request
//! flows strictly forward through:
//!
//! 1. **Prompt composition** (`prompt`) - taste profile + conversation
//!    insights + catalog excerpt → role-tagged completion messages
//! 2. **Endpoint dispatch** (`dispatch`) - ordered failover across the
//!    configured candidate endpoints, first success wins
//! 3. **Response normalization** (`normalize`) - the back-end's schema,
//!    whichever family it is, becomes one canonical envelope
//! 4. **Structured extraction** (`extract`) - in structured output mode,
//!    the JSON embedded in model prose is parsed, validated, and repaired
//!
//! # Key Types
//!
//! - `RecommendationPipeline` - main orchestrator (see `runtime` module)
//! - `CompletionTransport` - pluggable trait separating the dispatch state
//!   machine from the network
//!
//! # Degradation Principle
//!
//! A request that already consumed a successful upstream call is never
//! failed afterwards: unrecognized response schemas pass through opaque,
//! and extraction problems fall back to the original prose.

pub mod completion;
pub mod dispatch;
pub mod extract;
pub mod normalize;
pub mod prompt;
pub mod runtime;

pub use completion::{trailing_window, CompletionRequest, HISTORY_WINDOW};
pub use dispatch::{
    CompletionTransport, DispatchError, DispatchState, EndpointDispatcher,
    HttpCompletionTransport, TransportFailure,
};
pub use extract::{extract_structured, ExtractionOutcome};
pub use normalize::{NormalizedResponse, ResponseNormalizer, ResponseShape};
pub use prompt::PromptComposer;
pub use runtime::{PipelineOutcome, RecommendationPipeline};
