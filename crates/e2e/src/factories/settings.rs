//! Merchant settings: business info, FAQs, bot personality, pinned products, costs

use shopbot_common::{
    BotPersonality, BusinessInfo, ConversationCost, CostSummary, Faq, Personality, PinnedProduct,
    ProviderCost, MAX_PINNED_PRODUCTS,
};

use super::FactoryRng;

const FAQ_SEEDS: &[(&str, &str, &[&str])] = &[
    (
        "What is your return policy?",
        "You can return unworn items within 30 days for a full refund.",
        &["return", "refund"],
    ),
    (
        "How long does shipping take?",
        "Standard shipping takes 3-5 business days.",
        &["shipping", "delivery"],
    ),
    (
        "Do you ship internationally?",
        "We ship to the US, Canada and most of Europe.",
        &["international", "shipping"],
    ),
    (
        "How do I track my order?",
        "Use the tracking link in your shipping confirmation email.",
        &["track", "order"],
    ),
    (
        "Can I change my order?",
        "Orders can be changed within one hour of purchase.",
        &["change", "order"],
    ),
];

const HOURS: &[&str] = &[
    "Mon-Fri 9am-5pm",
    "Mon-Sat 10am-8pm",
    "Every day 8am-10pm",
    "24/7 online support",
];

#[derive(Debug, Clone, Default)]
pub struct BusinessInfoFactory {
    business_name: Option<String>,
    business_description: Option<String>,
    business_hours: Option<String>,
}

impl BusinessInfoFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.business_name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.business_description = Some(description.into());
        self
    }

    pub fn with_hours(mut self, hours: impl Into<String>) -> Self {
        self.business_hours = Some(hours.into());
        self
    }

    /// Fields at the backend's length limits (100 / 500 / 200 characters).
    pub fn at_length_limits() -> Self {
        Self::new()
            .with_name("N".repeat(100))
            .with_description("D".repeat(500))
            .with_hours("H".repeat(200))
    }

    pub fn build(&self, rng: &mut FactoryRng) -> BusinessInfo {
        let name = self.business_name.clone().unwrap_or_else(|| rng.company());
        BusinessInfo {
            business_description: self.business_description.clone().unwrap_or_else(|| {
                format!("{} sells {} and more.", name, rng.product_name().to_lowercase())
            }),
            business_hours: self
                .business_hours
                .clone()
                .unwrap_or_else(|| rng.pick(HOURS).to_string()),
            business_name: name,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FaqFactory {
    id: Option<u64>,
    question: Option<String>,
    answer: Option<String>,
    keywords: Option<Vec<String>>,
    order_index: Option<u32>,
}

impl FaqFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = Some(keywords);
        self
    }

    pub fn with_order_index(mut self, index: u32) -> Self {
        self.order_index = Some(index);
        self
    }

    pub fn build(&self, rng: &mut FactoryRng) -> Faq {
        let (question, answer, keywords) = rng.pick(FAQ_SEEDS);
        Faq {
            id: self.id.unwrap_or_else(|| rng.range_u64(1, 1_000_000)),
            question: self.question.clone().unwrap_or_else(|| question.to_string()),
            answer: self.answer.clone().unwrap_or_else(|| answer.to_string()),
            keywords: self
                .keywords
                .clone()
                .unwrap_or_else(|| keywords.iter().map(|k| k.to_string()).collect()),
            order_index: self.order_index.unwrap_or(0),
        }
    }

    /// `count` FAQs with distinct ids and contiguous `order_index` values.
    pub fn build_ordered(&self, rng: &mut FactoryRng, count: usize) -> Vec<Faq> {
        let base = rng.range_u64(1, 1_000_000);
        (0..count)
            .map(|i| {
                let mut faq = self.build(rng);
                faq.id = base + i as u64;
                faq.order_index = i as u32;
                faq
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PersonalityFactory {
    personality: Option<Personality>,
    custom_greeting: Option<Option<String>>,
    bot_name: Option<String>,
}

impl PersonalityFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = Some(personality);
        self
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.custom_greeting = Some(Some(greeting.into()));
        self
    }

    /// No custom greeting: the bot falls back to its personality default.
    pub fn without_greeting(mut self) -> Self {
        self.custom_greeting = Some(None);
        self
    }

    pub fn with_bot_name(mut self, name: impl Into<String>) -> Self {
        self.bot_name = Some(name.into());
        self
    }

    pub fn build(&self, rng: &mut FactoryRng) -> BotPersonality {
        let bot_name = self
            .bot_name
            .clone()
            .unwrap_or_else(|| format!("{} Bot", rng.pick(super::words::FIRST_NAMES)));
        BotPersonality {
            personality: self.personality.unwrap_or_else(|| rng.pick(&Personality::ALL)),
            custom_greeting: match &self.custom_greeting {
                Some(greeting) => greeting.clone(),
                None => Some(format!("Hi! I'm {}. How can I help you today?", bot_name)),
            },
            bot_name,
        }
    }
}

/// `count` pinned products in pin order.
pub fn pinned_products(rng: &mut FactoryRng, count: usize) -> Vec<PinnedProduct> {
    (0..count)
        .map(|i| PinnedProduct {
            product_id: format!("gid://shopify/Product/{}", rng.digits(13)),
            title: rng.product_name(),
            pinned_order: i as u32 + 1,
        })
        .collect()
}

/// Exactly as many pins as a merchant is allowed.
pub fn max_pin_limit(rng: &mut FactoryRng) -> Vec<PinnedProduct> {
    pinned_products(rng, MAX_PINNED_PRODUCTS)
}

/// One pin past the allowed maximum.
pub fn over_pin_limit(rng: &mut FactoryRng) -> Vec<PinnedProduct> {
    pinned_products(rng, MAX_PINNED_PRODUCTS + 1)
}

#[derive(Debug, Clone, Default)]
pub struct CostSummaryFactory {
    conversation_count: Option<usize>,
    providers: Option<Vec<String>>,
}

impl CostSummaryFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conversations(mut self, count: usize) -> Self {
        self.conversation_count = Some(count);
        self
    }

    pub fn with_providers(mut self, providers: Vec<String>) -> Self {
        self.providers = Some(providers);
        self
    }

    /// Totals are computed from the generated per-conversation rows, so they always add up.
    pub fn build(&self, rng: &mut FactoryRng) -> CostSummary {
        let top_conversations: Vec<ConversationCost> = (0..self.conversation_count.unwrap_or(5))
            .map(|_| {
                let tokens = rng.range_u64(500, 50_000);
                ConversationCost {
                    conversation_id: rng.uuid().to_string(),
                    total_cost_usd: round_cents(tokens as f64 * 0.000_002),
                    total_tokens: tokens,
                    request_count: rng.range_u32(1, 40),
                }
            })
            .collect();

        let total_cost_usd: f64 = top_conversations.iter().map(|c| c.total_cost_usd).sum();
        let total_tokens: u64 = top_conversations.iter().map(|c| c.total_tokens).sum();
        let request_count: u32 = top_conversations.iter().map(|c| c.request_count).sum();

        let providers = self
            .providers
            .clone()
            .unwrap_or_else(|| vec!["openai".to_string(), "ollama".to_string()]);
        let share = if providers.is_empty() { 0.0 } else { total_cost_usd / providers.len() as f64 };
        let (per_provider_requests, remainder_requests) = if providers.is_empty() {
            (0, 0)
        } else {
            let n = providers.len() as u32;
            (request_count / n, request_count % n)
        };

        CostSummary {
            total_cost_usd: round_cents(total_cost_usd),
            total_tokens,
            request_count,
            avg_cost_per_request: if request_count == 0 {
                0.0
            } else {
                round_cents(total_cost_usd / f64::from(request_count))
            },
            top_conversations,
            cost_by_provider: providers
                .into_iter()
                .enumerate()
                .map(|(i, provider)| ProviderCost {
                    provider,
                    cost_usd: round_cents(share),
                    // First provider absorbs the remainder so the split sums to the total
                    request_count: per_provider_requests
                        + if i == 0 { remainder_requests } else { 0 },
                })
                .collect(),
        }
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
