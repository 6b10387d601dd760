//! Intent-extraction port.
//!
//! An external service turns a free-text message into a reply, a directive
//! name, extracted fields and a next stage. The engine consumes only the
//! last three. [`CommandIntentExtractor`] is a deterministic stand-in that
//! understands slash commands.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::request::{RequestStatus, Stage, Urgency};

/// One prior message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// "user" or "assistant".
    pub role: String,
    /// Message text.
    pub content: String,
}

/// Where the conversation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageContext {
    /// Request status.
    pub status: RequestStatus,
    /// Request stage.
    pub stage: Stage,
    /// Quotes on the request.
    pub quote_count: usize,
}

/// Structured fields pulled from the message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// Category.
    pub category: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Quantity.
    pub quantity: Option<i32>,
    /// Budget estimate.
    pub budget: Option<Decimal>,
    /// Urgency.
    pub urgency: Option<Urgency>,
    /// Delivery location.
    pub delivery_location: Option<String>,
    /// Quote picked for negotiation.
    pub selected_quote_id: Option<Uuid>,
}

/// Extractor output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentResponse {
    /// Narrative reply shown to the user.
    pub reply: String,
    /// Directive name, e.g. `send_rfq` or `none`.
    pub action: String,
    /// Extracted fields.
    pub fields: ExtractedFields,
    /// Suggested next stage.
    pub next_stage: Option<Stage>,
    /// Follow-up suggestions.
    pub suggestions: Vec<String>,
}

/// Extractor failure.
#[derive(Debug, Error)]
#[error("intent extraction failed: {0}")]
pub struct IntentError(pub String);

/// Turns free text into a structured intent.
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    /// Extracts an intent.
    async fn extract(
        &self,
        message: &str,
        history: &[ConversationTurn],
        context: StageContext,
    ) -> Result<IntentResponse, IntentError>;
}

/// Reply used when the extractor is unavailable.
pub const FALLBACK_REPLY: &str =
    "I'm having trouble processing that right now. Could you rephrase your request?";

/// Understands `/action key=value ...`; anything else is a clarification.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandIntentExtractor;

impl CommandIntentExtractor {
    /// Parses a message without the async wrapper.
    #[must_use]
    pub fn parse(message: &str) -> IntentResponse {
        let text = message.trim();
        let Some(command) = text.strip_prefix('/') else {
            return IntentResponse {
                reply: "Tell me what you need, or use a command such as /search_vendors category=furniture quantity=40.".to_string(),
                action: "clarify".to_string(),
                fields: ExtractedFields::default(),
                next_stage: None,
                suggestions: vec!["/search_vendors".to_string(), "/send_rfq".to_string()],
            };
        };

        let mut parts = command.split_whitespace();
        let action = parts.next().unwrap_or("none").to_lowercase();
        let mut fields = ExtractedFields::default();
        let mut next_stage = None;
        for pair in parts {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = value.replace('_', " ");
            match key {
                "category" => fields.category = Some(value),
                "description" | "item" => fields.description = Some(value),
                "quantity" => fields.quantity = value.parse().ok(),
                "budget" => fields.budget = Decimal::from_str(&value).ok(),
                "urgency" => fields.urgency = Urgency::parse(&value),
                "location" => fields.delivery_location = Some(value),
                "quote" => fields.selected_quote_id = Uuid::parse_str(&value).ok(),
                "stage" => next_stage = Stage::parse(&value.replace(' ', "_")),
                _ => {}
            }
        }

        IntentResponse {
            reply: format!("Running {action}."),
            action,
            fields,
            next_stage,
            suggestions: Vec::new(),
        }
    }
}

#[async_trait]
impl IntentExtractor for CommandIntentExtractor {
    async fn extract(
        &self,
        message: &str,
        _history: &[ConversationTurn],
        _context: StageContext,
    ) -> Result<IntentResponse, IntentError> {
        Ok(Self::parse(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_command_with_fields() {
        let r = CommandIntentExtractor::parse(
            "/search_vendors category=furniture quantity=40 budget=16000 item=standing_desks",
        );
        assert_eq!(r.action, "search_vendors");
        assert_eq!(r.fields.category.as_deref(), Some("furniture"));
        assert_eq!(r.fields.quantity, Some(40));
        assert_eq!(r.fields.budget, Some(dec!(16000)));
        assert_eq!(r.fields.description.as_deref(), Some("standing desks"));
    }

    #[test]
    fn test_plain_text_is_clarify() {
        let r = CommandIntentExtractor::parse("I need some chairs");
        assert_eq!(r.action, "clarify");
        assert_eq!(r.fields, ExtractedFields::default());
    }

    #[test]
    fn test_stage_hint() {
        let r = CommandIntentExtractor::parse("/none stage=quotes_received");
        assert_eq!(r.next_stage, Some(Stage::QuotesReceived));
    }

    #[tokio::test]
    async fn test_trait_impl() {
        let context = StageContext {
            status: RequestStatus::Draft,
            stage: Stage::Initial,
            quote_count: 0,
        };
        let r = CommandIntentExtractor
            .extract("/send_rfq", &[], context)
            .await
            .unwrap();
        assert_eq!(r.action, "send_rfq");
    }
}
