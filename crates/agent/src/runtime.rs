//! Pipeline runtime.
//!
//! Wires the stages together for one request-scoped run: validate, analyze
//! preferences and conversation independently, compose the prompt, dispatch
//! with failover, normalize the response, and (in structured output mode)
//! extract the embedded recommendation JSON. The run either completes with
//! a full canonical envelope or fails with one typed error; partial
//! results are never returned.

use serde_json::Value;
use tracing::{debug, info};

use dramwise_core::config::CompletionConfig;
use dramwise_core::{
    Catalog, ConversationAnalyzer, ConversationInsights, PipelineError, PreferenceAnalyzer,
    PreferenceInput, RecommendationResult, TasteProfile,
};

use crate::completion::CompletionRequest;
use crate::dispatch::{CompletionTransport, EndpointDispatcher};
use crate::extract::extract_structured;
use crate::normalize::{ResponseNormalizer, ResponseShape};
use crate::prompt::PromptComposer;

#[derive(Clone, Debug)]
pub struct PipelineOutcome {
    /// Canonical success envelope, augmented with the derived analyses.
    pub envelope: Value,
    pub profile: TasteProfile,
    pub insights: ConversationInsights,
    /// Typed recommendation result, when structured output was requested
    /// and an embedded object was recovered.
    pub structured: Option<RecommendationResult>,
    pub shape: ResponseShape,
}

pub struct RecommendationPipeline<T> {
    model: String,
    max_tokens: u32,
    temperature: f64,
    analyzer: PreferenceAnalyzer,
    conversation: ConversationAnalyzer,
    composer: PromptComposer,
    dispatcher: EndpointDispatcher<T>,
    normalizer: ResponseNormalizer,
}

impl<T: CompletionTransport> RecommendationPipeline<T> {
    pub fn new(config: &CompletionConfig, catalog: Catalog, transport: T) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            analyzer: PreferenceAnalyzer::new(),
            conversation: ConversationAnalyzer::new(catalog.clone()),
            composer: PromptComposer::new(catalog),
            dispatcher: EndpointDispatcher::new(config.endpoints.clone(), transport),
            normalizer: ResponseNormalizer::new(),
        }
    }

    pub async fn run(&self, input: &PreferenceInput) -> Result<PipelineOutcome, PipelineError> {
        let band = input.validate()?;

        let profile = self.analyzer.analyze(input.taste_x, input.taste_y);
        let insights =
            self.conversation.analyze(&input.chat_history, &input.additional_preferences);
        debug!(
            event_name = "pipeline.analysis.complete",
            quadrant = profile.quadrant.label(),
            mentioned_entities = insights.mentioned_entities.len(),
            experience = insights.experience_level.as_str(),
            "request analyzed"
        );

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: self.composer.compose(input, band, &profile, &insights),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let body = self.dispatcher.dispatch(&request).await?;
        let mut normalized = self.normalizer.normalize(body);
        let shape = normalized.shape;

        let mut structured = None;
        if input.wants_structured_output() {
            if let Some(content) = normalized.content().map(str::to_string) {
                let outcome = extract_structured(&content, &insights.mentioned_entities);
                if outcome.result.is_some() {
                    normalized.replace_content(outcome.text.clone());
                }
                structured = outcome.result;
            }
        }

        let mut envelope = normalized.into_envelope();
        if let Some(object) = envelope.as_object_mut() {
            if let Ok(analysis) = serde_json::to_value(&profile) {
                object.insert("tasteAnalysis".to_string(), analysis);
            }
            if let Ok(conversation) = serde_json::to_value(&insights) {
                object.insert("conversationInsights".to_string(), conversation);
            }
        }

        info!(
            event_name = "pipeline.run.complete",
            shape = ?shape,
            structured = structured.is_some(),
            "pipeline finished"
        );

        Ok(PipelineOutcome { envelope, profile, insights, structured, shape })
    }
}
