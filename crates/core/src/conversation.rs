//! Conversation analysis.
//!
//! Scans prior turns (and the current free-text request) for catalog
//! mentions, region and flavor vocabulary, and an experience-level signal.
//! Pure over its inputs: the same history and request text always produce
//! the same insights.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::domain::preference::{ConversationMessage, Role};

const RECENT_WINDOW: usize = 3;
const REGION_MENTIONS_FOR_INTERMEDIATE: usize = 2;
const FLAVOR_MENTIONS_FOR_INTERMEDIATE: usize = 3;

const BEGINNER_KEYWORDS: &[&str] =
    &["beginner", "don't know", "dont know", "new to whisky", "first time", "初心者"];

const ADVANCED_KEYWORDS: &[&str] = &[
    "connoisseur",
    "cask strength",
    "single cask",
    "non-chill filtered",
    "independent bottling",
    "distillery exclusive",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationInsights {
    /// Canonical catalog ids, recorded once regardless of repeat mentions.
    pub mentioned_entities: BTreeSet<String>,
    pub mentioned_regions: BTreeSet<String>,
    pub mentioned_flavors: BTreeSet<String>,
    pub experience_level: ExperienceLevel,
    /// Trailing window of the history, original order, at most 3 entries.
    pub recent_messages: Vec<ConversationMessage>,
}

impl ConversationInsights {
    pub fn empty() -> Self {
        Self {
            mentioned_entities: BTreeSet::new(),
            mentioned_regions: BTreeSet::new(),
            mentioned_flavors: BTreeSet::new(),
            experience_level: ExperienceLevel::Beginner,
            recent_messages: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ConversationAnalyzer {
    catalog: Catalog,
}

impl ConversationAnalyzer {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn analyze(
        &self,
        history: &[ConversationMessage],
        additional_preferences: &str,
    ) -> ConversationInsights {
        let mut insights = ConversationInsights::empty();

        // The current request text always participates, so a first-turn
        // mention is not lost when no history exists yet.
        let mut texts: Vec<String> = history
            .iter()
            .filter(|message| message.role == Role::User)
            .map(|message| normalize_text(&message.content))
            .collect();
        texts.push(normalize_text(additional_preferences));

        for text in &texts {
            for entry in self.catalog.entries() {
                if entry.mentioned_in(text) {
                    insights.mentioned_entities.insert(entry.id.clone());
                }
            }
            for region in self.catalog.region_keywords() {
                if text.contains(&region.to_lowercase()) {
                    insights.mentioned_regions.insert(region.clone());
                }
            }
            for flavor in self.catalog.flavor_keywords() {
                if text.contains(&flavor.to_lowercase()) {
                    insights.mentioned_flavors.insert(flavor.clone());
                }
            }
        }

        insights.experience_level = infer_experience(&texts, &insights);
        insights.recent_messages =
            history[history.len().saturating_sub(RECENT_WINDOW)..].to_vec();

        insights
    }
}

/// Priority order: explicit self-identification wins, then expertise
/// keywords, then accumulated mention volume.
fn infer_experience(texts: &[String], insights: &ConversationInsights) -> ExperienceLevel {
    let mentions_any =
        |keywords: &[&str]| texts.iter().any(|text| keywords.iter().any(|kw| text.contains(kw)));

    if mentions_any(BEGINNER_KEYWORDS) {
        return ExperienceLevel::Beginner;
    }
    if mentions_any(ADVANCED_KEYWORDS) {
        return ExperienceLevel::Advanced;
    }
    if insights.mentioned_regions.len() > REGION_MENTIONS_FOR_INTERMEDIATE
        || insights.mentioned_flavors.len() > FLAVOR_MENTIONS_FOR_INTERMEDIATE
    {
        return ExperienceLevel::Intermediate;
    }
    ExperienceLevel::Beginner
}

fn normalize_text(text: &str) -> String {
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{ConversationAnalyzer, ExperienceLevel};
    use crate::catalog::Catalog;
    use crate::domain::preference::ConversationMessage;

    fn analyzer() -> ConversationAnalyzer {
        ConversationAnalyzer::new(Catalog::builtin())
    }

    #[test]
    fn empty_history_yields_empty_insights() {
        let insights = analyzer().analyze(&[], "");
        assert!(insights.mentioned_entities.is_empty());
        assert!(insights.mentioned_regions.is_empty());
        assert!(insights.mentioned_flavors.is_empty());
        assert_eq!(insights.experience_level, ExperienceLevel::Beginner);
        assert!(insights.recent_messages.is_empty());
    }

    #[test]
    fn first_turn_mention_in_request_text_is_captured() {
        let insights = analyzer().analyze(&[], "I really enjoyed the Bowmore I tried last week");
        assert!(insights.mentioned_entities.contains("bowmore"));
    }

    #[test]
    fn only_user_messages_contribute_mentions() {
        let history = vec![
            ConversationMessage::assistant("You might enjoy Lagavulin 16."),
            ConversationMessage::user("I usually drink Yamazaki."),
        ];
        let insights = analyzer().analyze(&history, "");
        assert!(insights.mentioned_entities.contains("yamazaki"));
        assert!(!insights.mentioned_entities.contains("lagavulin"));
    }

    #[test]
    fn repeat_mentions_are_recorded_once() {
        let history = vec![
            ConversationMessage::user("Ardbeg, definitely Ardbeg."),
            ConversationMessage::user("Did I mention ardbeg?"),
        ];
        let insights = analyzer().analyze(&history, "ardbeg again");
        assert_eq!(
            insights.mentioned_entities.iter().collect::<Vec<_>>(),
            vec!["ardbeg"]
        );
    }

    #[test]
    fn explicit_beginner_signal_wins_over_volume() {
        let history = vec![ConversationMessage::user(
            "I'm a beginner but I like islay, speyside, highland and campbeltown styles",
        )];
        let insights = analyzer().analyze(&history, "");
        assert_eq!(insights.experience_level, ExperienceLevel::Beginner);
    }

    #[test]
    fn expertise_keywords_force_advanced() {
        let insights = analyzer().analyze(&[], "looking for a cask strength bottling");
        assert_eq!(insights.experience_level, ExperienceLevel::Advanced);
    }

    #[test]
    fn mention_volume_infers_intermediate() {
        let insights = analyzer()
            .analyze(&[], "something peaty and smoky with sherry sweetness and a honey note");
        assert!(insights.mentioned_flavors.len() > 3);
        assert_eq!(insights.experience_level, ExperienceLevel::Intermediate);
    }

    #[test]
    fn recent_window_keeps_the_last_three_in_order() {
        let history: Vec<_> = (1..=5)
            .map(|n| ConversationMessage::user(format!("message {n}")))
            .collect();
        let insights = analyzer().analyze(&history, "");
        let contents: Vec<_> =
            insights.recent_messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["message 3", "message 4", "message 5"]);
    }
}
