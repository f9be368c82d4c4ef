//! Shopify fulfillment webhooks and platform integration records

use shopbot_common::{
    FacebookIntegration, FinancialStatus, Fulfillment, FulfillmentStatus, LineItem, NoteAttribute,
    ShopifyFulfillmentWebhook, ShopifyIntegration, MESSENGER_PSID_ATTRIBUTE,
};

use super::{words, FactoryRng};

/// Fulfillment webhook builder.
///
/// Tracking data is described once as `(number, url)` pairs and fanned out
/// into `tracking_numbers`, `tracking_urls` and `fulfillments` so the three
/// stay index-aligned. The raw `with_tracking_numbers` / `with_tracking_urls`
/// / `with_fulfillments` setters are taken verbatim for tests that need a
/// deliberately inconsistent payload.
#[derive(Debug, Clone, Default)]
pub struct FulfillmentWebhookFactory {
    order_id: Option<u64>,
    order_number: Option<u64>,
    email: Option<String>,
    financial_status: Option<FinancialStatus>,
    fulfillment_status: Option<Option<FulfillmentStatus>>,
    tracking: Option<Vec<(String, String)>>,
    package_count: Option<usize>,
    tracking_numbers: Option<Vec<String>>,
    tracking_urls: Option<Vec<String>>,
    fulfillments: Option<Vec<Fulfillment>>,
    line_item_count: Option<usize>,
    messenger_psid: Option<Option<String>>,
}

impl FulfillmentWebhookFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order_id(mut self, id: u64) -> Self {
        self.order_id = Some(id);
        self
    }

    pub fn with_order_number(mut self, number: u64) -> Self {
        self.order_number = Some(number);
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_financial_status(mut self, status: FinancialStatus) -> Self {
        self.financial_status = Some(status);
        self
    }

    pub fn with_fulfillment_status(mut self, status: Option<FulfillmentStatus>) -> Self {
        self.fulfillment_status = Some(status);
        self
    }

    /// Add one parcel; repeated calls append further parcels.
    pub fn with_tracking(mut self, number: impl Into<String>, url: impl Into<String>) -> Self {
        self.tracking
            .get_or_insert_with(Vec::new)
            .push((number.into(), url.into()));
        self
    }

    pub fn with_tracking_numbers(mut self, numbers: Vec<String>) -> Self {
        self.tracking_numbers = Some(numbers);
        self
    }

    pub fn with_tracking_urls(mut self, urls: Vec<String>) -> Self {
        self.tracking_urls = Some(urls);
        self
    }

    pub fn with_fulfillments(mut self, fulfillments: Vec<Fulfillment>) -> Self {
        self.fulfillments = Some(fulfillments);
        self
    }

    pub fn with_line_items(mut self, count: usize) -> Self {
        self.line_item_count = Some(count);
        self
    }

    pub fn with_messenger_psid(mut self, psid: impl Into<String>) -> Self {
        self.messenger_psid = Some(Some(psid.into()));
        self
    }

    /// Order placed outside the chat, so it cannot be correlated to a customer.
    pub fn without_psid() -> Self {
        Self {
            messenger_psid: Some(None),
            ..Self::default()
        }
    }

    /// Order shipped in `count` separate parcels.
    pub fn multi_package(count: usize) -> Self {
        Self {
            package_count: Some(count),
            ..Self::default()
        }
    }

    /// Partially fulfilled order: one parcel sent, the rest still pending.
    pub fn partial() -> Self {
        Self::new()
            .with_fulfillment_status(Some(FulfillmentStatus::Partial))
            .with_line_items(3)
    }

    fn parcels(&self, rng: &mut FactoryRng) -> Vec<(String, String)> {
        if let Some(pairs) = &self.tracking {
            return pairs.clone();
        }
        if let Some(numbers) = &self.tracking_numbers {
            let (_, base) = rng.pick(words::CARRIERS);
            return numbers
                .iter()
                .enumerate()
                .map(|(i, n)| {
                    let url = self
                        .tracking_urls
                        .as_ref()
                        .and_then(|urls| urls.get(i).cloned())
                        .unwrap_or_else(|| format!("{}{}", base, n));
                    (n.clone(), url)
                })
                .collect();
        }
        let (_, base) = rng.pick(words::CARRIERS);
        (0..self.package_count.unwrap_or(1))
            .map(|_| {
                let number = format!("1Z{}", rng.alphanumeric(16));
                let url = format!("{}{}", base, number);
                (number, url)
            })
            .collect()
    }

    pub fn build(&self, rng: &mut FactoryRng) -> ShopifyFulfillmentWebhook {
        let order_id = self.order_id.unwrap_or_else(|| rng.range_u64(1_000_000_000, 9_999_999_999));
        let order_number = self.order_number.unwrap_or_else(|| rng.range_u64(1001, 99_999));
        let (carrier, _) = rng.pick(words::CARRIERS);
        let parcels = self.parcels(rng);

        let fulfillments = self.fulfillments.clone().unwrap_or_else(|| {
            parcels
                .iter()
                .map(|(number, url)| Fulfillment {
                    id: rng.range_u64(1_000_000_000, 9_999_999_999),
                    status: "success".to_string(),
                    tracking_company: Some(carrier.to_string()),
                    tracking_number: Some(number.clone()),
                    tracking_url: Some(url.clone()),
                })
                .collect()
        });

        let line_items: Vec<LineItem> = (0..self.line_item_count.unwrap_or(1))
            .map(|_| LineItem {
                id: rng.range_u64(1_000_000_000, 9_999_999_999),
                title: rng.product_name(),
                quantity: rng.range_u32(1, 3),
                price: rng.price(),
                sku: Some(format!("SKU-{}", rng.alphanumeric(6))),
            })
            .collect();

        let total: f64 = line_items
            .iter()
            .map(|item| item.price.parse::<f64>().unwrap_or(0.0) * f64::from(item.quantity))
            .sum();

        let psid = match &self.messenger_psid {
            Some(psid) => psid.clone(),
            None => Some(rng.digits(16)),
        };
        let note_attributes = psid
            .map(|value| {
                vec![NoteAttribute {
                    name: MESSENGER_PSID_ATTRIBUTE.to_string(),
                    value,
                }]
            })
            .unwrap_or_default();

        let created_at = rng.recent(7);
        let updated_at = rng.between(created_at);

        ShopifyFulfillmentWebhook {
            id: order_id,
            order_number,
            name: format!("#{}", order_number),
            email: self.email.clone().unwrap_or_else(|| rng.email()),
            financial_status: self.financial_status.unwrap_or(FinancialStatus::Paid),
            fulfillment_status: self
                .fulfillment_status
                .unwrap_or(Some(FulfillmentStatus::Fulfilled)),
            created_at,
            updated_at,
            total_price: format!("{:.2}", total),
            currency: "USD".to_string(),
            tracking_numbers: self
                .tracking_numbers
                .clone()
                .unwrap_or_else(|| parcels.iter().map(|(n, _)| n.clone()).collect()),
            tracking_urls: self
                .tracking_urls
                .clone()
                .unwrap_or_else(|| parcels.iter().map(|(_, u)| u.clone()).collect()),
            fulfillments,
            line_items,
            note_attributes,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShopifyIntegrationFactory {
    shop_domain: Option<String>,
    verified: Option<bool>,
}

impl ShopifyIntegrationFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shop_domain(mut self, domain: impl Into<String>) -> Self {
        self.shop_domain = Some(domain.into());
        self
    }

    /// Store whose API credentials have not been verified yet.
    pub fn unverified() -> Self {
        Self {
            verified: Some(false),
            ..Self::default()
        }
    }

    pub fn build(&self, rng: &mut FactoryRng) -> ShopifyIntegration {
        let verified = self.verified.unwrap_or(true);
        ShopifyIntegration {
            shop_domain: self
                .shop_domain
                .clone()
                .unwrap_or_else(|| format!("{}-{}.myshopify.com", rng.slug(), rng.hex(3))),
            storefront_token_encrypted: format!("enc:{}", rng.hex(24)),
            admin_token_encrypted: format!("enc:{}", rng.hex(24)),
            scopes: vec![
                "read_products".to_string(),
                "read_orders".to_string(),
                "read_fulfillments".to_string(),
            ],
            storefront_api_verified: verified,
            admin_api_verified: verified,
            webhook_subscribed: verified,
            connected_at: rng.recent(60),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FacebookIntegrationFactory {
    page_id: Option<String>,
    page_name: Option<String>,
    webhook_verified: Option<bool>,
}

impl FacebookIntegrationFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_id(mut self, page_id: impl Into<String>) -> Self {
        self.page_id = Some(page_id.into());
        self
    }

    pub fn with_page_name(mut self, name: impl Into<String>) -> Self {
        self.page_name = Some(name.into());
        self
    }

    pub fn with_webhook_verified(mut self, verified: bool) -> Self {
        self.webhook_verified = Some(verified);
        self
    }

    pub fn build(&self, rng: &mut FactoryRng) -> FacebookIntegration {
        FacebookIntegration {
            page_id: self.page_id.clone().unwrap_or_else(|| rng.digits(15)),
            page_name: self.page_name.clone().unwrap_or_else(|| rng.company()),
            page_access_token_encrypted: format!("enc:{}", rng.hex(32)),
            webhook_verified: self.webhook_verified.unwrap_or(true),
            connected_at: rng.recent(60),
        }
    }
}
