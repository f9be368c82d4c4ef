//! Fixture providers
//!
//! A [`FixtureScope`] brackets one test body. Fixtures do their setup when
//! constructed and register teardowns on the scope; after the body returns
//! the scope runs those teardowns newest-first. Teardown failures end up in a
//! [`CleanupLog`] and the log, never in the body's result.
//!
//! ```text
//! scope.run(async {
//!     ApiClientFixture::seed_test_merchant   -> teardown: delete merchant
//!     AuthFixture::mock_auth                 -> teardown: clear storage
//!     ... test body ...
//! })                                         <- clear storage, then delete merchant
//! ```

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shopbot_common::{MerchantData, WidgetTheme};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::error::{CleanupError, E2eResult};
use crate::factories::{FactoryRng, MerchantFactory};
use crate::health::{try_cleanup_merchant, CleanupLog};
use crate::mock::{Method, MockBackend, MockResponse};
use crate::page::{Cookie, Page, SameSite};

type Teardown = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), CleanupError>> + Send>;

/// Lifetime of the fixtures used by one test
#[derive(Default)]
pub struct FixtureScope {
    teardowns: Mutex<Vec<(String, Teardown)>>,
}

impl FixtureScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a teardown; it runs after the body, before earlier registrations.
    pub fn on_teardown<F, Fut>(&self, name: impl Into<String>, teardown: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), CleanupError>> + Send + 'static,
    {
        let name = name.into();
        debug!("Registered teardown: {}", name);
        let teardown: Teardown = Box::new(move || -> BoxFuture<'static, Result<(), CleanupError>> {
            Box::pin(teardown())
        });
        self.teardowns.lock().push((name, teardown));
    }

    pub fn pending(&self) -> usize {
        self.teardowns.lock().len()
    }

    /// Run every registered teardown in reverse registration order.
    pub async fn teardown(&self) -> CleanupLog {
        let teardowns = std::mem::take(&mut *self.teardowns.lock());
        let mut log = CleanupLog::new();
        for (name, teardown) in teardowns.into_iter().rev() {
            debug!("Teardown: {}", name);
            log.record(name, teardown().await);
        }
        if !log.is_empty() {
            info!("Fixture teardown: {}", log.summary());
        }
        log
    }

    /// Await `body`, then tear down. The body's result is returned untouched.
    ///
    /// A panicking body (a failed `assert!`) is torn down too, then the
    /// panic resumes.
    pub async fn run<Fut, T>(&self, body: Fut) -> E2eResult<T>
    where
        Fut: Future<Output = E2eResult<T>>,
    {
        let outcome = AssertUnwindSafe(body).catch_unwind().await;
        self.teardown().await;
        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Authenticated-session state derived from a merchant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub merchant_key: String,
    pub auth_token: String,
    pub auth_timestamp: i64,
    pub merchant_context: Value,
}

impl AuthState {
    pub fn for_merchant(merchant: &MerchantData, timestamp_ms: i64) -> Self {
        Self {
            merchant_key: merchant.merchant_key.clone(),
            auth_token: format!("test-token-{}", merchant.merchant_key),
            auth_timestamp: timestamp_ms,
            merchant_context: json!({
                "merchantKey": merchant.merchant_key,
                "platform": merchant.platform,
                "status": merchant.status,
                "appName": merchant.config.app_name,
            }),
        }
    }
}

/// Writes a fake logged-in session into the browser
pub struct AuthFixture {
    page: Arc<dyn Page>,
    frontend_url: String,
    state: AuthState,
}

impl AuthFixture {
    pub const TOKEN_KEY: &'static str = "auth_token";
    pub const TIMESTAMP_KEY: &'static str = "auth_timestamp";
    pub const CONTEXT_KEY: &'static str = "merchant_context";
    pub const SESSION_COOKIE: &'static str = "session_token";

    /// Registers a storage-clearing teardown on `scope`.
    pub fn new(
        scope: &FixtureScope,
        page: Arc<dyn Page>,
        frontend_url: impl Into<String>,
        merchant: &MerchantData,
    ) -> Self {
        let state = AuthState::for_merchant(merchant, chrono::Utc::now().timestamp_millis());
        let teardown_page = page.clone();
        scope.on_teardown("clear browser storage", move || async move {
            teardown_page
                .clear_storage()
                .await
                .map_err(|e| CleanupError::Other {
                    resource: "browser storage".to_string(),
                    reason: e.to_string(),
                })
        });
        Self {
            page,
            frontend_url: frontend_url.into(),
            state,
        }
    }

    pub fn auth_state(&self) -> &AuthState {
        &self.state
    }

    /// Log in as `merchant_key` without going through the login form.
    pub async fn mock_auth(&self, merchant_key: &str) -> E2eResult<()> {
        let mut state = self.state.clone();
        if merchant_key != state.merchant_key {
            state.auth_token = format!("test-token-{}", merchant_key);
            state.merchant_key = merchant_key.to_string();
            state.merchant_context["merchantKey"] = json!(merchant_key);
        }

        self.page
            .local_storage_set(Self::TOKEN_KEY, &state.auth_token)
            .await?;
        self.page
            .local_storage_set(Self::TIMESTAMP_KEY, &state.auth_timestamp.to_string())
            .await?;
        self.page
            .local_storage_set(Self::CONTEXT_KEY, &state.merchant_context.to_string())
            .await?;
        self.page
            .add_cookie(&Cookie {
                name: Self::SESSION_COOKIE.to_string(),
                value: state.auth_token.clone(),
                url: self.frontend_url.clone(),
                http_only: true,
                secure: false,
                same_site: SameSite::Strict,
            })
            .await?;

        debug!("Mocked auth for {}", merchant_key);
        Ok(())
    }

    pub async fn clear_storage(&self) -> E2eResult<()> {
        self.page.clear_storage().await
    }
}

/// A generated merchant plus the generator for variations
pub struct MerchantFixture {
    rng: Mutex<FactoryRng>,
    merchant: MerchantData,
}

impl MerchantFixture {
    pub fn new(mut rng: FactoryRng) -> Self {
        let merchant = MerchantFactory::new().build(&mut rng);
        Self {
            rng: Mutex::new(rng),
            merchant,
        }
    }

    pub fn merchant(&self) -> &MerchantData {
        &self.merchant
    }

    /// Build another merchant with `customize` applied to the factory.
    pub fn with_merchant<F>(&self, customize: F) -> MerchantData
    where
        F: FnOnce(MerchantFactory) -> MerchantFactory,
    {
        customize(MerchantFactory::new()).build(&mut self.rng.lock())
    }
}

/// Backend-seeded test data
pub struct ApiClientFixture {
    api: Arc<ApiClient>,
}

impl ApiClientFixture {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Create a merchant through the test-data endpoint and register its deletion.
    ///
    /// A failed seed is an error: the test stops here instead of running
    /// against a merchant that does not exist.
    pub async fn seed_test_merchant<F>(
        &self,
        scope: &FixtureScope,
        rng: &mut FactoryRng,
        customize: F,
    ) -> E2eResult<MerchantData>
    where
        F: FnOnce(MerchantFactory) -> MerchantFactory,
    {
        let merchant = customize(MerchantFactory::new()).build(rng);
        self.seed(scope, merchant).await
    }

    /// Seed an already-built merchant and register its deletion.
    pub async fn seed(&self, scope: &FixtureScope, merchant: MerchantData) -> E2eResult<MerchantData> {
        self.api.seed_merchant(&merchant).await?.require_success()?;
        info!("Seeded merchant {}", merchant.merchant_key);

        let api = self.api.clone();
        let key = merchant.merchant_key.clone();
        scope.on_teardown(format!("delete merchant {}", key), move || async move {
            try_cleanup_merchant(&api, &key).await
        });
        Ok(merchant)
    }

    pub async fn cleanup_test_data(&self, merchant_key: &str) -> Result<(), CleanupError> {
        try_cleanup_merchant(&self.api, merchant_key).await
    }
}

/// Serves a widget theme from the mock backend and mirrors it into the page
pub struct ThemeFixture {
    pub merchant_id: String,
    pub theme: WidgetTheme,
}

impl ThemeFixture {
    pub const STORAGE_KEY: &'static str = "widget_theme";

    /// Route `GET /api/v1/widget/config/{merchant_id}` to `theme`.
    pub fn install(mock: &MockBackend, merchant_id: &str, theme: WidgetTheme) -> Self {
        mock.on(
            Method::GET,
            &format!("/api/v1/widget/config/{}", merchant_id),
            MockResponse::ok(json!({
                "merchantId": merchant_id,
                "enabled": true,
                "theme": theme,
            })),
        );
        Self {
            merchant_id: merchant_id.to_string(),
            theme,
        }
    }

    pub async fn seed_page(&self, page: &dyn Page) -> E2eResult<()> {
        page.local_storage_set(Self::STORAGE_KEY, &serde_json::to_string(&self.theme)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopbot_common::DeploymentStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_teardown_reverse_order() {
        let scope = FixtureScope::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let order = order.clone();
            scope.on_teardown(name, move || async move {
                order.lock().push(name);
                Ok(())
            });
        }

        let result = scope.run(async { Ok::<_, crate::E2eError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(*order.lock(), vec!["third", "second", "first"]);
        assert_eq!(scope.pending(), 0);
    }

    #[tokio::test]
    async fn test_teardown_failure_does_not_mask_body() {
        let scope = FixtureScope::new();
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        scope.on_teardown("boom", || async {
            Err(CleanupError::Other {
                resource: "x".to_string(),
                reason: "boom".to_string(),
            })
        });
        scope.on_teardown("count", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let result = scope.run(async { Ok::<_, crate::E2eError>("passed") }).await;
        assert_eq!(result.unwrap(), "passed");
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_teardown_runs_when_body_panics() {
        let scope = Arc::new(FixtureScope::new());
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        scope.on_teardown("count", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let task_scope = scope.clone();
        let joined = tokio::spawn(async move {
            task_scope
                .run(async {
                    let seeded = 1;
                    assert_eq!(seeded, 2, "body assertion");
                    Ok::<_, crate::E2eError>(())
                })
                .await
        })
        .await;

        assert!(joined.unwrap_err().is_panic());
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(scope.pending(), 0);
    }

    #[test]
    fn test_merchant_fixture_variations() {
        let fixture = MerchantFixture::new(FactoryRng::seeded(9));
        let active = fixture.with_merchant(|f| f.with_status(DeploymentStatus::Active));
        assert_eq!(active.status, DeploymentStatus::Active);
        assert_ne!(active.merchant_key, fixture.merchant().merchant_key);
    }

    #[test]
    fn test_auth_state_derived_from_merchant() {
        let mut rng = FactoryRng::seeded(1);
        let merchant = MerchantFactory::new().with_merchant_key("m-1").build(&mut rng);
        let state = AuthState::for_merchant(&merchant, 1_700_000_000_000);
        assert_eq!(state.auth_token, "test-token-m-1");
        assert_eq!(state.merchant_context["merchantKey"], "m-1");
    }
}
