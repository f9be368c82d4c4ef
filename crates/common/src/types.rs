//! Core domain types for the Shopbot harness
//!
//! Every record here is a value object: built once by a factory, optionally
//! overridden at construction time, serialized into a request body or a
//! storage seed, then dropped. Nothing mutates them in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Suffix appended to the visible prefix of a masked sender id
pub const MASK_SUFFIX: &str = "****";

/// Number of sender id characters kept visible when masking
pub const MASK_VISIBLE_CHARS: usize = 4;

/// Maximum number of products a merchant can pin
pub const MAX_PINNED_PRODUCTS: usize = 10;

/// Note attribute carrying the Messenger page-scoped id on Shopify orders
pub const MESSENGER_PSID_ATTRIBUTE: &str = "messenger_psid";

/// Mask a platform sender id: first four characters followed by `****`.
pub fn mask_sender_id(sender_id: &str) -> String {
    let visible: String = sender_id.chars().take(MASK_VISIBLE_CHARS).collect();
    format!("{}{}", visible, MASK_SUFFIX)
}

// ---------------------------------------------------------------------------
// Merchants
// ---------------------------------------------------------------------------

/// Hosting platform a merchant bot is deployed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Flyio,
    Railway,
    Render,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Flyio, Platform::Railway, Platform::Render];
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Flyio => write!(f, "flyio"),
            Platform::Railway => write!(f, "railway"),
            Platform::Render => write!(f, "render"),
        }
    }
}

/// Deployment state of a merchant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Pending,
    Deploying,
    Active,
    Error,
}

impl DeploymentStatus {
    pub const ALL: [DeploymentStatus; 4] = [
        DeploymentStatus::Pending,
        DeploymentStatus::Deploying,
        DeploymentStatus::Active,
        DeploymentStatus::Error,
    ];
}

impl Default for DeploymentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentStatus::Pending => write!(f, "pending"),
            DeploymentStatus::Deploying => write!(f, "deploying"),
            DeploymentStatus::Active => write!(f, "active"),
            DeploymentStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantConfig {
    pub region: String,
    pub organization: String,
    pub app_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantData {
    pub merchant_key: String,
    pub platform: Platform,
    pub status: DeploymentStatus,
    pub config: MerchantConfig,
    pub secret_key_hash: String,
    pub deployed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Conversations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Active,
    Handoff,
    Closed,
}

impl ConversationStatus {
    pub const ALL: [ConversationStatus; 3] = [
        ConversationStatus::Active,
        ConversationStatus::Handoff,
        ConversationStatus::Closed,
    ];
}

impl std::fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversationStatus::Active => write!(f, "active"),
            ConversationStatus::Handoff => write!(f, "handoff"),
            ConversationStatus::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Negative => write!(f, "negative"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationData {
    pub id: String,
    pub platform_sender_id: String,
    pub platform_sender_id_masked: String,
    pub last_message: String,
    pub status: ConversationStatus,
    pub sentiment: Sentiment,
    pub message_count: u32,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ConversationData {
    /// Check that the masked sender id is derived from the raw one.
    pub fn check_invariants(&self) -> Result<()> {
        let expected = mask_sender_id(&self.platform_sender_id);
        if self.platform_sender_id_masked != expected {
            return Err(Error::invariant(
                "ConversationData",
                format!(
                    "platformSenderIdMasked is {:?}, expected {:?}",
                    self.platform_sender_id_masked, expected
                ),
            ));
        }
        if self.updated_at < self.created_at {
            return Err(Error::invariant(
                "ConversationData",
                "updatedAt precedes createdAt",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Handoff
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffStatus {
    None,
    Pending,
    Active,
    Resolved,
}

impl Default for HandoffStatus {
    fn default() -> Self {
        Self::None
    }
}

impl std::fmt::Display for HandoffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandoffStatus::None => write!(f, "none"),
            HandoffStatus::Pending => write!(f, "pending"),
            HandoffStatus::Active => write!(f, "active"),
            HandoffStatus::Resolved => write!(f, "resolved"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffReason {
    Keyword,
    LowConfidence,
    ClarificationLoop,
}

impl std::fmt::Display for HandoffReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandoffReason::Keyword => write!(f, "keyword"),
            HandoffReason::LowConfidence => write!(f, "low_confidence"),
            HandoffReason::ClarificationLoop => write!(f, "clarification_loop"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffUrgency {
    High,
    Medium,
    Low,
}

/// Conversation augmented with human handoff state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffConversation {
    #[serde(flatten)]
    pub conversation: ConversationData,
    pub handoff_status: HandoffStatus,
    pub handoff_reason: Option<HandoffReason>,
    pub handoff_triggered_at: Option<DateTime<Utc>>,
    pub consecutive_low_confidence_count: u32,
    pub urgency: Option<HandoffUrgency>,
}

impl HandoffConversation {
    /// `handoff_reason` must be present exactly when a handoff exists.
    pub fn check_invariants(&self) -> Result<()> {
        self.conversation.check_invariants()?;
        let has_handoff = self.handoff_status != HandoffStatus::None;
        match (has_handoff, self.handoff_reason) {
            (true, None) => Err(Error::invariant(
                "HandoffConversation",
                format!("handoffStatus is {} but handoffReason is null", self.handoff_status),
            )),
            (false, Some(reason)) => Err(Error::invariant(
                "HandoffConversation",
                format!("handoffStatus is none but handoffReason is {}", reason),
            )),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Shopify fulfillment webhook
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialStatus {
    Pending,
    Authorized,
    Paid,
    PartiallyPaid,
    Refunded,
    Voided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    Fulfilled,
    Partial,
    Restocked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
    pub id: u64,
    pub status: String,
    pub tracking_company: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: u64,
    pub title: String,
    pub quantity: u32,
    pub price: String,
    pub sku: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAttribute {
    pub name: String,
    pub value: String,
}

/// `orders/fulfilled` / `orders/updated` webhook payload as Shopify sends it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopifyFulfillmentWebhook {
    pub id: u64,
    pub order_number: u64,
    pub name: String,
    pub email: String,
    pub financial_status: FinancialStatus,
    pub fulfillment_status: Option<FulfillmentStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_price: String,
    pub currency: String,
    pub tracking_numbers: Vec<String>,
    pub tracking_urls: Vec<String>,
    pub fulfillments: Vec<Fulfillment>,
    pub line_items: Vec<LineItem>,
    pub note_attributes: Vec<NoteAttribute>,
}

impl ShopifyFulfillmentWebhook {
    /// Chat identity the order was placed from, when the storefront recorded one.
    pub fn messenger_psid(&self) -> Option<&str> {
        self.note_attributes
            .iter()
            .find(|attr| attr.name == MESSENGER_PSID_ATTRIBUTE)
            .map(|attr| attr.value.as_str())
    }

    /// `tracking_numbers[i]`, `tracking_urls[i]` and `fulfillments[i]` describe the same parcel.
    pub fn check_tracking_alignment(&self) -> Result<()> {
        if self.tracking_numbers.len() != self.tracking_urls.len() {
            return Err(Error::invariant(
                "ShopifyFulfillmentWebhook",
                format!(
                    "{} tracking numbers but {} tracking urls",
                    self.tracking_numbers.len(),
                    self.tracking_urls.len()
                ),
            ));
        }
        if self.fulfillments.len() != self.tracking_numbers.len() {
            return Err(Error::invariant(
                "ShopifyFulfillmentWebhook",
                format!(
                    "{} fulfillments but {} tracking numbers",
                    self.fulfillments.len(),
                    self.tracking_numbers.len()
                ),
            ));
        }
        for (i, fulfillment) in self.fulfillments.iter().enumerate() {
            if fulfillment.tracking_number.as_deref() != Some(self.tracking_numbers[i].as_str()) {
                return Err(Error::invariant(
                    "ShopifyFulfillmentWebhook",
                    format!("fulfillments[{}].tracking_number does not match tracking_numbers[{}]", i, i),
                ));
            }
            if fulfillment.tracking_url.as_deref() != Some(self.tracking_urls[i].as_str()) {
                return Err(Error::invariant(
                    "ShopifyFulfillmentWebhook",
                    format!("fulfillments[{}].tracking_url does not match tracking_urls[{}]", i, i),
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Merchant settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessInfo {
    pub business_name: String,
    pub business_description: String,
    pub business_hours: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub id: u64,
    pub question: String,
    pub answer: String,
    pub keywords: Vec<String>,
    pub order_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Friendly,
    Professional,
    Enthusiastic,
}

impl Personality {
    pub const ALL: [Personality; 3] = [
        Personality::Friendly,
        Personality::Professional,
        Personality::Enthusiastic,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotPersonality {
    pub personality: Personality,
    pub custom_greeting: Option<String>,
    pub bot_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedProduct {
    pub product_id: String,
    pub title: String,
    pub pinned_order: u32,
}

// ---------------------------------------------------------------------------
// Integrations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyIntegration {
    pub shop_domain: String,
    pub storefront_token_encrypted: String,
    pub admin_token_encrypted: String,
    pub scopes: Vec<String>,
    pub storefront_api_verified: bool,
    pub admin_api_verified: bool,
    pub webhook_subscribed: bool,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacebookIntegration {
    pub page_id: String,
    pub page_name: String,
    pub page_access_token_encrypted: String,
    pub webhook_verified: bool,
    pub connected_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Costs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCost {
    pub provider: String,
    pub cost_usd: f64,
    pub request_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub total_cost_usd: f64,
    pub total_tokens: u64,
    pub request_count: u32,
    pub avg_cost_per_request: f64,
    pub top_conversations: Vec<ConversationCost>,
    pub cost_by_provider: Vec<ProviderCost>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationCost {
    pub conversation_id: String,
    pub total_cost_usd: f64,
    pub total_tokens: u64,
    pub request_count: u32,
}
