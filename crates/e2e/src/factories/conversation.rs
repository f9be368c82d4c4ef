//! Conversation and handoff factories

use chrono::{DateTime, Utc};
use shopbot_common::{
    mask_sender_id, ConversationData, ConversationStatus, HandoffConversation, HandoffReason,
    HandoffStatus, HandoffUrgency, Sentiment,
};
use tracing::debug;

use super::{words, FactoryRng};

/// Messenger page-scoped ids are 16 digits
const SENDER_ID_DIGITS: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct ConversationFactory {
    id: Option<String>,
    platform_sender_id: Option<String>,
    last_message: Option<String>,
    status: Option<ConversationStatus>,
    sentiment: Option<Sentiment>,
    message_count: Option<u32>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl ConversationFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The masked form is always re-derived from this value.
    pub fn with_platform_sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.platform_sender_id = Some(sender_id.into());
        self
    }

    pub fn with_last_message(mut self, message: impl Into<String>) -> Self {
        self.last_message = Some(message.into());
        self
    }

    pub fn with_status(mut self, status: ConversationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn with_message_count(mut self, count: u32) -> Self {
        self.message_count = Some(count);
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn build(&self, rng: &mut FactoryRng) -> ConversationData {
        let id = self.id.clone().unwrap_or_else(|| rng.uuid().to_string());
        let platform_sender_id = self
            .platform_sender_id
            .clone()
            .unwrap_or_else(|| rng.digits(SENDER_ID_DIGITS));
        let created_at = self.created_at.unwrap_or_else(|| rng.recent(30));
        let updated_at = self.updated_at.unwrap_or_else(|| rng.between(created_at));

        ConversationData {
            platform_sender_id_masked: mask_sender_id(&platform_sender_id),
            id,
            platform_sender_id,
            last_message: self
                .last_message
                .clone()
                .unwrap_or_else(|| rng.pick(words::CUSTOMER_MESSAGES).to_string()),
            status: self.status.unwrap_or_else(|| rng.pick(&ConversationStatus::ALL)),
            sentiment: self.sentiment.unwrap_or_else(|| rng.pick(&Sentiment::ALL)),
            message_count: self.message_count.unwrap_or_else(|| rng.range_u32(1, 50)),
            updated_at,
            created_at,
        }
    }
}

/// `count` conversations with independent defaults, newest first.
pub fn conversation_list(rng: &mut FactoryRng, count: usize) -> Vec<ConversationData> {
    let factory = ConversationFactory::new();
    let mut list: Vec<ConversationData> = (0..count).map(|_| factory.build(rng)).collect();
    list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    list
}

/// Handoff conversations. Without overrides the conversation has no handoff at all.
#[derive(Debug, Clone, Default)]
pub struct HandoffFactory {
    conversation: ConversationFactory,
    handoff_status: Option<HandoffStatus>,
    handoff_reason: Option<HandoffReason>,
    handoff_triggered_at: Option<DateTime<Utc>>,
    consecutive_low_confidence_count: Option<u32>,
    urgency: Option<HandoffUrgency>,
}

impl HandoffFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conversation(mut self, conversation: ConversationFactory) -> Self {
        self.conversation = conversation;
        self
    }

    pub fn with_handoff_status(mut self, status: HandoffStatus) -> Self {
        self.handoff_status = Some(status);
        self
    }

    /// Only applies when the handoff status is not `None`; a conversation
    /// without a handoff never carries a reason.
    pub fn with_handoff_reason(mut self, reason: HandoffReason) -> Self {
        self.handoff_reason = Some(reason);
        self
    }

    pub fn with_triggered_at(mut self, at: DateTime<Utc>) -> Self {
        self.handoff_triggered_at = Some(at);
        self
    }

    pub fn with_low_confidence_count(mut self, count: u32) -> Self {
        self.consecutive_low_confidence_count = Some(count);
        self
    }

    pub fn with_urgency(mut self, urgency: HandoffUrgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    /// Customer typed a handoff keyword such as "human" or "agent".
    pub fn keyword_triggered(keyword: &str) -> Self {
        Self::new()
            .with_conversation(
                ConversationFactory::new()
                    .with_status(ConversationStatus::Handoff)
                    .with_last_message(format!("I want to talk to a {}", keyword)),
            )
            .with_handoff_status(HandoffStatus::Pending)
            .with_handoff_reason(HandoffReason::Keyword)
            .with_urgency(HandoffUrgency::High)
    }

    /// Bot answered with low confidence `count` times in a row.
    pub fn low_confidence(count: u32) -> Self {
        Self::new()
            .with_conversation(ConversationFactory::new().with_status(ConversationStatus::Handoff))
            .with_handoff_status(HandoffStatus::Pending)
            .with_handoff_reason(HandoffReason::LowConfidence)
            .with_low_confidence_count(count)
            .with_urgency(HandoffUrgency::Medium)
    }

    /// Bot kept asking clarifying questions without converging.
    pub fn clarification_loop() -> Self {
        Self::new()
            .with_conversation(ConversationFactory::new().with_status(ConversationStatus::Handoff))
            .with_handoff_status(HandoffStatus::Pending)
            .with_handoff_reason(HandoffReason::ClarificationLoop)
            .with_urgency(HandoffUrgency::Low)
    }

    /// Handoff that a human agent already closed out.
    pub fn resolved() -> Self {
        Self::new()
            .with_conversation(ConversationFactory::new().with_status(ConversationStatus::Closed))
            .with_handoff_status(HandoffStatus::Resolved)
            .with_handoff_reason(HandoffReason::Keyword)
    }

    pub fn build(&self, rng: &mut FactoryRng) -> HandoffConversation {
        let handoff_status = self.handoff_status.unwrap_or(HandoffStatus::None);
        let has_handoff = handoff_status != HandoffStatus::None;

        let mut conversation_factory = self.conversation.clone();
        if has_handoff && conversation_factory.status.is_none() {
            conversation_factory.status = Some(match handoff_status {
                HandoffStatus::Resolved => ConversationStatus::Closed,
                _ => ConversationStatus::Handoff,
            });
        } else if !has_handoff && conversation_factory.status.is_none() {
            conversation_factory.status = Some(ConversationStatus::Active);
        }
        let conversation = conversation_factory.build(rng);

        let handoff_reason = match (has_handoff, self.handoff_reason) {
            (true, Some(reason)) => Some(reason),
            (true, None) => Some(rng.pick(&[
                HandoffReason::Keyword,
                HandoffReason::LowConfidence,
                HandoffReason::ClarificationLoop,
            ])),
            (false, Some(reason)) => {
                debug!("Dropping handoff reason {:?}: handoff status is none", reason);
                None
            }
            (false, None) => None,
        };

        let handoff_triggered_at = match (has_handoff, self.handoff_triggered_at) {
            (true, Some(at)) => Some(at),
            (true, None) => Some(conversation.updated_at),
            (false, _) => None,
        };

        let consecutive_low_confidence_count = self.consecutive_low_confidence_count.unwrap_or(
            if handoff_reason == Some(HandoffReason::LowConfidence) { 3 } else { 0 },
        );

        HandoffConversation {
            conversation,
            handoff_status,
            handoff_reason,
            handoff_triggered_at,
            consecutive_low_confidence_count,
            urgency: if has_handoff { self.urgency } else { None },
        }
    }
}
