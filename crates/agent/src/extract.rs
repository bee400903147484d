//! Structured result extraction and repair.
//!
//! A model asked for JSON output may still wrap the object in prose. This
//! module locates the embedded object, validates it, and enforces the
//! mention invariant: previously discussed bottles never disappear from a
//! structured result without an explicit note. Every failure path returns
//! the original text unchanged; extraction never fails a request.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;

use dramwise_core::RecommendationResult;

#[derive(Clone, Debug, PartialEq)]
pub struct ExtractionOutcome {
    /// Replacement text: the re-serialized JSON when extraction succeeded,
    /// otherwise the input unchanged.
    pub text: String,
    /// Typed view of the extracted object, when one was recovered.
    pub result: Option<RecommendationResult>,
    /// True when a substitution note was prepended to the summary.
    pub amended: bool,
}

impl ExtractionOutcome {
    fn unchanged(text: &str) -> Self {
        Self { text: text.to_string(), result: None, amended: false }
    }
}

/// Pure function: text in, outcome out. `mentioned_entities` are the
/// canonical lowercase terms accumulated by conversation analysis.
pub fn extract_structured(text: &str, mentioned_entities: &BTreeSet<String>) -> ExtractionOutcome {
    let Some(span) = embedded_object_span(text) else {
        debug!(event_name = "pipeline.extract.degraded", reason = "no braced span", "returning prose");
        return ExtractionOutcome::unchanged(text);
    };

    let mut parsed: Value = match serde_json::from_str(span) {
        Ok(value) => value,
        Err(error) => {
            debug!(
                event_name = "pipeline.extract.degraded",
                reason = "parse failure",
                error = %error,
                "returning prose"
            );
            return ExtractionOutcome::unchanged(text);
        }
    };

    let valid = parsed
        .get("recommendations")
        .and_then(Value::as_array)
        .map(|items| !items.is_empty())
        .unwrap_or(false);
    if !valid {
        debug!(
            event_name = "pipeline.extract.degraded",
            reason = "missing or empty recommendations",
            "returning prose"
        );
        return ExtractionOutcome::unchanged(text);
    }

    let amended = enforce_mentions(&mut parsed, mentioned_entities);

    let Ok(serialized) = serde_json::to_string(&parsed) else {
        return ExtractionOutcome::unchanged(text);
    };
    let result = serde_json::from_value::<RecommendationResult>(parsed).ok();

    ExtractionOutcome { text: serialized, result, amended }
}

/// First `{` through last `}`, when that span is non-degenerate.
fn embedded_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Annotate-only policy: when no recommendation name carries a mentioned
/// term, a note is prepended to the summary. Entries are never synthesized.
fn enforce_mentions(parsed: &mut Value, mentioned_entities: &BTreeSet<String>) -> bool {
    if mentioned_entities.is_empty() {
        return false;
    }

    let names: Vec<String> = parsed
        .get("recommendations")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("name").and_then(Value::as_str))
                .map(str::to_lowercase)
                .collect()
        })
        .unwrap_or_default();

    let satisfied = mentioned_entities
        .iter()
        .any(|entity| names.iter().any(|name| name.contains(&entity.to_lowercase())));
    if satisfied {
        return false;
    }

    let mentioned = mentioned_entities.iter().cloned().collect::<Vec<_>>().join(", ");
    let note = format!(
        "Note: {mentioned} did not qualify under the current price and taste constraints; \
the selections below are the closest fit to your preferences."
    );

    let Some(object) = parsed.as_object_mut() else {
        return false;
    };
    let summary = object.get("summary").and_then(Value::as_str).unwrap_or_default();
    let amended_summary =
        if summary.is_empty() { note } else { format!("{note} {summary}") };
    object.insert("summary".to_string(), Value::String(amended_summary));
    true
}
