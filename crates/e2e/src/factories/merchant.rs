//! Merchant factory

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use shopbot_common::{DeploymentStatus, MerchantConfig, MerchantData, Platform};

use super::{words, FactoryRng};

#[derive(Debug, Clone, Default)]
pub struct MerchantFactory {
    merchant_key: Option<String>,
    platform: Option<Platform>,
    status: Option<DeploymentStatus>,
    region: Option<String>,
    organization: Option<String>,
    app_name: Option<String>,
    secret_key_hash: Option<String>,
    deployed_at: Option<Option<DateTime<Utc>>>,
}

impl MerchantFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_merchant_key(mut self, key: impl Into<String>) -> Self {
        self.merchant_key = Some(key.into());
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_status(mut self, status: DeploymentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn with_secret_key_hash(mut self, hash: impl Into<String>) -> Self {
        self.secret_key_hash = Some(hash.into());
        self
    }

    pub fn with_deployed_at(mut self, deployed_at: Option<DateTime<Utc>>) -> Self {
        self.deployed_at = Some(deployed_at);
        self
    }

    /// Active merchant deployed recently; the common starting point for dashboard tests.
    pub fn active() -> Self {
        Self::new().with_status(DeploymentStatus::Active)
    }

    pub fn build(&self, rng: &mut FactoryRng) -> MerchantData {
        let id = rng.uuid();
        let status = self.status.unwrap_or_else(|| rng.pick(&DeploymentStatus::ALL));
        let platform = self.platform.unwrap_or_else(|| rng.pick(&Platform::ALL));

        let secret_key_hash = self.secret_key_hash.clone().unwrap_or_else(|| {
            let secret = rng.hex(32);
            hex::encode(Sha256::digest(secret.as_bytes()))
        });

        // Only merchants that finished deploying carry a deployment time
        let deployed_at = match &self.deployed_at {
            Some(at) => *at,
            None if status == DeploymentStatus::Active => Some(rng.recent(30)),
            None => None,
        };

        MerchantData {
            merchant_key: self
                .merchant_key
                .clone()
                .unwrap_or_else(|| format!("test-merchant-{}", id.simple())),
            platform,
            status,
            config: MerchantConfig {
                region: self.region.clone().unwrap_or_else(|| rng.pick(words::REGIONS).to_string()),
                organization: self
                    .organization
                    .clone()
                    .unwrap_or_else(|| format!("{}-org", rng.slug())),
                app_name: self
                    .app_name
                    .clone()
                    .unwrap_or_else(|| format!("shopbot-{}", &id.simple().to_string()[..8])),
            },
            secret_key_hash,
            deployed_at,
        }
    }

    pub fn build_many(&self, rng: &mut FactoryRng, count: usize) -> Vec<MerchantData> {
        (0..count).map(|_| self.build(rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_override_wins() {
        let mut rng = FactoryRng::from_entropy();
        let merchant = MerchantFactory::new()
            .with_platform(Platform::Railway)
            .with_merchant_key("fixed-key")
            .build(&mut rng);
        assert_eq!(merchant.platform, Platform::Railway);
        assert_eq!(merchant.merchant_key, "fixed-key");
    }

    #[test]
    fn test_keys_unique_across_many_builds() {
        let mut rng = FactoryRng::from_entropy();
        let keys: HashSet<String> = MerchantFactory::new()
            .build_many(&mut rng, 10_000)
            .into_iter()
            .map(|m| m.merchant_key)
            .collect();
        assert_eq!(keys.len(), 10_000);
    }

    #[test]
    fn test_deployed_at_follows_status() {
        let mut rng = FactoryRng::seeded(5);
        let active = MerchantFactory::active().build(&mut rng);
        assert!(active.deployed_at.is_some());

        let pending = MerchantFactory::new()
            .with_status(DeploymentStatus::Pending)
            .build(&mut rng);
        assert!(pending.deployed_at.is_none());
    }

    #[test]
    fn test_secret_key_hash_is_sha256_hex() {
        let mut rng = FactoryRng::seeded(11);
        let merchant = MerchantFactory::new().build(&mut rng);
        assert_eq!(merchant.secret_key_hash.len(), 64);
        assert!(merchant.secret_key_hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_seeded_builds_reproduce() {
        let a = MerchantFactory::new().build(&mut FactoryRng::seeded(77));
        let b = MerchantFactory::new().build(&mut FactoryRng::seeded(77));
        assert_eq!(a, b);
    }
}
