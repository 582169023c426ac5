//! Session token acquisition.
//!
//! The planner API expects an anti-forgery token plus `ModuleId` and `TabId`
//! headers that are normally embedded in the Journey Planner landing page.
//! Scraping them is best effort. On any failure we fall back to known-good
//! identifiers and send no token at all.

use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::error::TransperthError;

/// `ModuleId` used when the landing page does not reveal one.
pub const DEFAULT_MODULE_ID: &str = "5325";

/// `TabId` used when the landing page does not reveal one.
pub const DEFAULT_TAB_ID: &str = "140";

static TOKEN_INPUT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"input[name="__RequestVerificationToken"]"#).expect("valid selector")
});

static SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid selector"));

static MODULE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"ModuleId["']?\s*[:=]\s*["']?(\d+)"#).expect("valid regex"));

static TAB_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"TabId["']?\s*[:=]\s*["']?(\d+)"#).expect("valid regex"));

/// Headers the planner API checks on `PlanJourney`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    /// Anti-forgery token; never synthesized.
    pub verification_token: Option<String>,
    pub module_id: String,
    pub tab_id: String,
}

impl Default for SessionTokens {
    fn default() -> Self {
        Self {
            verification_token: None,
            module_id: DEFAULT_MODULE_ID.to_string(),
            tab_id: DEFAULT_TAB_ID.to_string(),
        }
    }
}

impl SessionTokens {
    /// Extract tokens from landing page HTML, defaulting whatever is missing.
    pub fn scrape(html: &str) -> Self {
        let document = Html::parse_document(html);

        let verification_token = document
            .select(&TOKEN_INPUT)
            .find_map(|input| input.value().attr("value"))
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        if verification_token.is_some() {
            debug!("Found RequestVerificationToken");
        }

        // Later scripts override earlier ones
        let mut module_id = None;
        let mut tab_id = None;
        for script in document.select(&SCRIPT) {
            let text: String = script.text().collect();
            if let Some(found) = capture(&MODULE_ID, &text) {
                module_id = Some(found);
            }
            if let Some(found) = capture(&TAB_ID, &text) {
                tab_id = Some(found);
            }
        }
        debug!(?module_id, ?tab_id, "Scraped session identifiers");

        Self {
            verification_token,
            module_id: module_id.unwrap_or_else(|| DEFAULT_MODULE_ID.to_string()),
            tab_id: tab_id.unwrap_or_else(|| DEFAULT_TAB_ID.to_string()),
        }
    }

    /// Add the token headers to `headers`.
    ///
    /// Values that are not valid header text are left out rather than sent mangled.
    pub fn apply(&self, headers: &mut HeaderMap) {
        let pairs = [
            ("requestverificationtoken", self.verification_token.as_deref()),
            ("moduleid", Some(self.module_id.as_str())),
            ("tabid", Some(self.tab_id.as_str())),
        ];

        for (name, value) in pairs {
            let Some(value) = value else { continue };
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    headers.insert(HeaderName::from_static(name), value);
                }
                Err(_) => warn!(header = name, "Dropping session header with invalid value"),
            }
        }
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Strategy for obtaining [`SessionTokens`] before a planner request.
///
/// Implementations must not fail: a strategy that cannot find tokens
/// returns the defaults.
pub trait TokenSource: Send + Sync {
    fn acquire_session_tokens(
        &self,
        http: &reqwest::Client,
    ) -> impl Future<Output = SessionTokens> + Send;
}

/// Primes the session by loading the Journey Planner landing page and
/// scraping tokens from it. Cookies set by the page stay in the client.
#[derive(Debug, Clone)]
pub struct LandingPageTokens {
    url: String,
    timeout: Duration,
}

impl LandingPageTokens {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    /// GET the landing page body. Shared with the results-page surface,
    /// which primes the session the same way.
    pub async fn prime(&self, http: &reqwest::Client) -> Result<String, TransperthError> {
        let response = http
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

impl TokenSource for LandingPageTokens {
    async fn acquire_session_tokens(&self, http: &reqwest::Client) -> SessionTokens {
        match self.prime(http).await {
            Ok(html) => SessionTokens::scrape(&html),
            Err(e) => {
                warn!(error = %e, "Could not get session tokens, using defaults");
                SessionTokens::default()
            }
        }
    }
}

/// Skips the landing page and always uses the default identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTokens;

impl TokenSource for DefaultTokens {
    async fn acquire_session_tokens(&self, _http: &reqwest::Client) -> SessionTokens {
        SessionTokens::default()
    }
}
