//! Prompt composition.
//!
//! Assembles the ordered message sequence for a completion request:
//! one optional instruction message, the bounded trailing window of prior
//! turns, and a final user message carrying the customer's preferences,
//! the catalog excerpt, and any mention-enforcement instruction.

use dramwise_core::taste::normalize_axis;
use dramwise_core::{
    Catalog, ConversationInsights, ConversationMessage, PreferenceInput, PriceBand, RequestType,
    Role, TasteProfile,
};

use crate::completion::trailing_window;

const RECOMMENDATION_PERSONA: &str = "You are an experienced whisky sommelier at a specialty \
bar. Recommend exactly 3 whiskies that fit the customer's budget and taste position, preferring \
bottles from the reference list below but substituting close matches when nothing on the list \
qualifies. Reply in the language the customer writes in.";

const CHAT_PERSONA: &str = "You are an experienced whisky sommelier continuing an ongoing \
conversation with a customer. Answer naturally and concretely, referring back to their stated \
taste preferences where it helps. Reply in the language the customer writes in.";

const STRUCTURED_OUTPUT_SCHEMA: &str = r#"Respond with a single JSON object and nothing else, in exactly this shape:
{
  "summary": "one or two sentences introducing the picks",
  "recommendations": [
    {
      "name": "bottle name",
      "price": "approximate price in yen",
      "reason": "why this fits the customer",
      "tasteProfile": "short flavor description"
    }
  ]
}
"recommendations" must contain exactly 3 items. Do not wrap the object in markdown fences or add commentary around it."#;

#[derive(Clone, Debug)]
pub struct PromptComposer {
    catalog: Catalog,
}

impl PromptComposer {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn compose(
        &self,
        input: &PreferenceInput,
        band: PriceBand,
        profile: &TasteProfile,
        insights: &ConversationInsights,
    ) -> Vec<ConversationMessage> {
        let mut messages = Vec::new();
        messages.push(ConversationMessage::system(self.instruction(input)));

        // The instruction above is the only system message: history may
        // carry its own from older clients, and those are dropped.
        messages.extend(
            trailing_window(&input.chat_history)
                .iter()
                .filter(|message| message.role != Role::System)
                .cloned(),
        );

        messages.push(ConversationMessage::user(self.request_message(
            input, band, profile, insights,
        )));
        messages
    }

    fn instruction(&self, input: &PreferenceInput) -> String {
        let persona = match input.request_type {
            RequestType::FullRecommendation => RECOMMENDATION_PERSONA,
            RequestType::Chat => CHAT_PERSONA,
        };

        if input.wants_structured_output() {
            format!("{persona}\n\n{STRUCTURED_OUTPUT_SCHEMA}")
        } else {
            persona.to_string()
        }
    }

    fn request_message(
        &self,
        input: &PreferenceInput,
        band: PriceBand,
        profile: &TasteProfile,
        insights: &ConversationInsights,
    ) -> String {
        let ch = &profile.characteristics;
        let mut sections = Vec::new();

        let mut preferences = vec![
            format!("Budget: ¥{} to ¥{}", band.min_yen, band.max_yen),
            format!(
                "Taste position: {} (richness {}%, smokiness {}%)",
                profile.quadrant.label(),
                percent(ch.richness),
                percent(ch.smokiness)
            ),
            format!(
                "Derived character: sweetness {}%, complexity {}%, approachability {}%",
                percent(ch.sweetness),
                percent(ch.complexity),
                percent(ch.approachability)
            ),
            format!("Experience level: {}", insights.experience_level.as_str()),
        ];
        if input.complexity_x.is_some() || input.complexity_y.is_some() {
            preferences.push(format!(
                "Complexity preference: depth {}%, experimentation {}%",
                percent(normalize_axis(input.complexity_x)),
                percent(normalize_axis(input.complexity_y))
            ));
        }
        if !input.additional_preferences.trim().is_empty() {
            preferences.push(format!("Additional requests: {}", input.additional_preferences));
        }
        sections.push(format!("Customer preferences:\n- {}", preferences.join("\n- ")));

        sections.push(format!("Reference list:\n{}", self.catalog.excerpt()));

        if !insights.mentioned_entities.is_empty() {
            let mentioned =
                insights.mentioned_entities.iter().cloned().collect::<Vec<_>>().join(", ");
            sections.push(format!(
                "The customer has previously mentioned: {mentioned}. At least one \
recommendation must include a mentioned bottle, even if it is an imperfect match; if none can \
qualify under the constraints, say so explicitly in the summary."
            ));
        }

        sections.join("\n\n")
    }
}

fn percent(value: f64) -> u32 {
    (value * 100.0).round() as u32
}
