//! Deterministic test-data factories
//!
//! Every factory is a builder: `with_*` setters pin the fields a test cares
//! about, and `build(&mut rng)` fills the rest with realistic filler drawn
//! from an explicit [`FactoryRng`]. There is no process-wide seed; each
//! suite (or each test) owns its generator, so parallel workers never share
//! random state and a single suite can opt into reproducibility.
//!
//! ```
//! use shopbot_e2e::factories::{FactoryRng, MerchantFactory};
//! use shopbot_common::Platform;
//!
//! let mut rng = FactoryRng::seeded(7);
//! let merchant = MerchantFactory::new().with_platform(Platform::Railway).build(&mut rng);
//! assert_eq!(merchant.platform, Platform::Railway);
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

pub mod conversation;
pub mod merchant;
pub mod settings;
pub mod shopify;
pub mod theme;

pub use conversation::{conversation_list, ConversationFactory, HandoffFactory};
pub use merchant::MerchantFactory;
pub use settings::{
    max_pin_limit, over_pin_limit, pinned_products, BusinessInfoFactory, CostSummaryFactory,
    FaqFactory, PersonalityFactory,
};
pub use shopify::{FacebookIntegrationFactory, FulfillmentWebhookFactory, ShopifyIntegrationFactory};
pub use theme::{boundary_theme, invalid_color_theme, out_of_bounds_theme, xss_theme, Bound, ThemeFactory};

/// Fixed reference instant for seeded generators so timestamps reproduce too
const SEEDED_ANCHOR_SECS: i64 = 1_767_225_600; // 2026-01-01T00:00:00Z

/// Random source handed to every factory call
#[derive(Debug, Clone)]
pub struct FactoryRng {
    rng: StdRng,
    seed: Option<u64>,
    anchor: DateTime<Utc>,
}

impl Default for FactoryRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl FactoryRng {
    /// Unseeded generator anchored at the current time.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
            anchor: Utc::now(),
        }
    }

    /// Reproducible generator: same seed, same sequence of values and timestamps.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
            anchor: seeded_anchor(),
        }
    }

    /// Pin this generator to `seed` from here on.
    pub fn set_seed(&mut self, seed: u64) {
        *self = Self::seeded(seed);
    }

    /// Return to unseeded behaviour.
    pub fn reset_seed(&mut self) {
        *self = Self::from_entropy();
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// The instant factories treat as "now".
    pub fn now(&self) -> DateTime<Utc> {
        self.anchor
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// UUIDv4 drawn from this generator.
    pub fn uuid(&mut self) -> Uuid {
        uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid()
    }

    pub fn pick<T: Clone>(&mut self, items: &[T]) -> T {
        items[self.rng.gen_range(0..items.len())].clone()
    }

    pub fn range_u32(&mut self, low: u32, high_inclusive: u32) -> u32 {
        self.rng.gen_range(low..=high_inclusive)
    }

    pub fn range_u64(&mut self, low: u64, high_inclusive: u64) -> u64 {
        self.rng.gen_range(low..=high_inclusive)
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability)
    }

    /// Decimal string of exactly `len` digits with no leading zero.
    pub fn digits(&mut self, len: usize) -> String {
        let mut out = String::with_capacity(len);
        for i in 0..len {
            let low = if i == 0 { 1 } else { 0 };
            out.push(char::from(b'0' + self.rng.gen_range(low..10u8)));
        }
        out
    }

    /// Uppercase alphanumeric string of `len` characters.
    pub fn alphanumeric(&mut self, len: usize) -> String {
        const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ0123456789";
        (0..len)
            .map(|_| char::from(CHARSET[self.rng.gen_range(0..CHARSET.len())]))
            .collect()
    }

    pub fn hex(&mut self, bytes: usize) -> String {
        let buf: Vec<u8> = (0..bytes).map(|_| self.rng.gen()).collect();
        hex::encode(buf)
    }

    pub fn hex_color(&mut self) -> String {
        format!("#{:06x}", self.rng.gen_range(0..=0xFF_FFFFu32))
    }

    /// Instant up to `max_days` before [`FactoryRng::now`].
    pub fn recent(&mut self, max_days: i64) -> DateTime<Utc> {
        let secs = self.rng.gen_range(0..=max_days.max(0) * 86_400);
        self.anchor - Duration::seconds(secs)
    }

    /// Instant between `start` and [`FactoryRng::now`].
    pub fn between(&mut self, start: DateTime<Utc>) -> DateTime<Utc> {
        let span = (self.anchor - start).num_seconds().max(0);
        start + Duration::seconds(self.rng.gen_range(0..=span))
    }

    pub fn full_name(&mut self) -> String {
        format!("{} {}", self.pick(words::FIRST_NAMES), self.pick(words::LAST_NAMES))
    }

    pub fn email(&mut self) -> String {
        format!(
            "{}.{}{}@example.com",
            self.pick(words::FIRST_NAMES).to_lowercase(),
            self.pick(words::LAST_NAMES).to_lowercase(),
            self.range_u32(1, 999)
        )
    }

    pub fn company(&mut self) -> String {
        format!("{} {}", self.pick(words::ADJECTIVES), self.pick(words::STORE_NOUNS))
    }

    pub fn slug(&mut self) -> String {
        format!(
            "{}-{}",
            self.pick(words::ADJECTIVES).to_lowercase(),
            self.pick(words::STORE_NOUNS).to_lowercase()
        )
    }

    pub fn product_name(&mut self) -> String {
        format!("{} {}", self.pick(words::ADJECTIVES), self.pick(words::PRODUCTS))
    }

    pub fn price(&mut self) -> String {
        format!("{}.{:02}", self.range_u32(5, 250), self.range_u32(0, 99))
    }
}

fn seeded_anchor() -> DateTime<Utc> {
    Utc.timestamp_opt(SEEDED_ANCHOR_SECS, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub(crate) mod words {
    pub const FIRST_NAMES: &[&str] = &[
        "Ava", "Liam", "Maya", "Noah", "Zoe", "Omar", "Priya", "Kenji", "Lucia", "Tomas", "Amara",
        "Felix",
    ];

    pub const LAST_NAMES: &[&str] = &[
        "Nguyen", "Garcia", "Okafor", "Schmidt", "Tanaka", "Rossi", "Patel", "Kowalski", "Silva",
        "Haddad",
    ];

    pub const ADJECTIVES: &[&str] = &[
        "Cozy", "Urban", "Golden", "Wild", "Coastal", "Rustic", "Bright", "Modern", "Humble",
        "Velvet",
    ];

    pub const STORE_NOUNS: &[&str] = &[
        "Threads", "Outfitters", "Goods", "Market", "Studio", "Supply", "Boutique", "Collective",
    ];

    pub const PRODUCTS: &[&str] = &[
        "Hoodie", "Sneakers", "Backpack", "Water Bottle", "Beanie", "Denim Jacket", "Candle",
        "Tote Bag", "Sunglasses", "Mug",
    ];

    pub const CUSTOMER_MESSAGES: &[&str] = &[
        "Do you have this in a medium?",
        "Where is my order?",
        "What are your store hours?",
        "Can I return an item after 30 days?",
        "Is shipping free over $50?",
        "Show me running shoes under $100",
        "Thanks, that helps!",
        "Do you ship to Canada?",
        "I never got a tracking number",
        "Can I change my delivery address?",
    ];

    pub const REGIONS: &[&str] = &["iad", "ord", "sjc", "lax", "ams", "fra", "sin", "syd"];

    pub const CARRIERS: &[(&str, &str)] = &[
        ("UPS", "https://www.ups.com/track?tracknum="),
        ("USPS", "https://tools.usps.com/go/TrackConfirmAction?tLabels="),
        ("FedEx", "https://www.fedex.com/fedextrack/?trknbr="),
        ("DHL", "https://www.dhl.com/track?tracking-id="),
    ];
}
