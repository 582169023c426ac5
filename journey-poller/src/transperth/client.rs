//! Transperth Journey Planner HTTP client.
//!
//! Fetches journey options for a route from either the planner's JSON API
//! (primary) or its legacy results page. Both surfaces produce the same
//! [`JourneyData`].

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::domain::{JourneyData, JourneyOption, RouteConfig};

use super::convert;
use super::error::TransperthError;
use super::html;
use super::request::{PlanJourneyRequest, legacy_query};
use super::session::{LandingPageTokens, TokenSource};
use super::types::PlanJourneyResponse;

/// Default base URL for the Transperth website.
const DEFAULT_BASE_URL: &str = "https://www.transperth.wa.gov.au";

/// Landing page, used to prime cookies and scrape session tokens.
const LANDING_PATH: &str = "/Journey-Planner";

/// Legacy results page.
const RESULTS_PATH: &str = "/Journey-Planner/Results";

/// JSON journey planning endpoint.
const PLAN_JOURNEY_PATH: &str = "/API/SilverRailRestService/SilverRailService/PlanJourney";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// How much of an unparsable body to keep for diagnostics.
const BODY_SNIPPET_CHARS: usize = 500;

/// Which planner surface to query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    /// JSON `PlanJourney` API
    #[default]
    Api,
    /// Legacy HTML results page
    Html,
}

/// Configuration for the Transperth client.
#[derive(Debug, Clone)]
pub struct TransperthConfig {
    /// Base URL (defaults to the production website)
    pub base_url: String,
    /// Surface to query
    pub surface: Surface,
    /// Timeout for the landing page request, in seconds
    pub prime_timeout_secs: u64,
    /// Timeout for the journey request, in seconds
    pub request_timeout_secs: u64,
    /// Whether the HTML surface loads the landing page first
    pub prime_html_session: bool,
}

impl TransperthConfig {
    /// Create a config for the production planner.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            surface: Surface::Api,
            prime_timeout_secs: 10,
            request_timeout_secs: 30,
            prime_html_session: true,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Choose the planner surface.
    pub fn with_surface(mut self, surface: Surface) -> Self {
        self.surface = surface;
        self
    }

    /// Set both request timeouts.
    pub fn with_timeouts(mut self, prime_secs: u64, request_secs: u64) -> Self {
        self.prime_timeout_secs = prime_secs;
        self.request_timeout_secs = request_secs;
        self
    }

    /// Skip the landing page on the HTML surface.
    pub fn without_html_priming(mut self) -> Self {
        self.prime_html_session = false;
        self
    }
}

impl Default for TransperthConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Transperth Journey Planner client.
///
/// Holds one cookie-carrying HTTP session shared by every route. Session
/// tokens come from a pluggable [`TokenSource`].
#[derive(Debug, Clone)]
pub struct TransperthClient<T = LandingPageTokens> {
    http: reqwest::Client,
    base_url: String,
    surface: Surface,
    request_timeout: Duration,
    landing: LandingPageTokens,
    prime_html_session: bool,
    tokens: T,
}

impl TransperthClient<LandingPageTokens> {
    /// Create a client that scrapes tokens from the landing page.
    pub fn new(config: TransperthConfig) -> Result<Self, TransperthError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-GB,en;q=0.6"),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(
            "x-requested-with",
            HeaderValue::from_static("XMLHttpRequest"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()?;

        let landing = LandingPageTokens::new(
            format!("{}{}", config.base_url, LANDING_PATH),
            Duration::from_secs(config.prime_timeout_secs),
        );

        Ok(Self {
            http,
            base_url: config.base_url,
            surface: config.surface,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            tokens: landing.clone(),
            landing,
            prime_html_session: config.prime_html_session,
        })
    }
}

impl<T: TokenSource> TransperthClient<T> {
    /// Replace the token acquisition strategy.
    pub fn with_token_source<U: TokenSource>(self, tokens: U) -> TransperthClient<U> {
        TransperthClient {
            http: self.http,
            base_url: self.base_url,
            surface: self.surface,
            request_timeout: self.request_timeout,
            landing: self.landing,
            prime_html_session: self.prime_html_session,
            tokens,
        }
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// Fetch journey options for `route` at a resolved date and time.
    ///
    /// The route is validated before anything is sent.
    ///
    /// # Arguments
    ///
    /// * `route` - Route template
    /// * `date` - Literal `YYYY-MM-DD` date
    /// * `time` - Literal `HH:MM` time
    pub async fn fetch(
        &self,
        route: &RouteConfig,
        date: &str,
        time: &str,
    ) -> Result<JourneyData, TransperthError> {
        route.validate()?;

        let options = match self.surface {
            Surface::Api => self.fetch_api(route, date, time).await?,
            Surface::Html => self.fetch_html(route, date, time).await?,
        };

        debug!(route = %route.name, count = options.len(), "Found journey options");

        Ok(JourneyData {
            options,
            from_location: route.from.location.clone(),
            to_location: route.to.location.clone(),
            date: date.to_string(),
            time: time.to_string(),
        })
    }

    async fn fetch_api(
        &self,
        route: &RouteConfig,
        date: &str,
        time: &str,
    ) -> Result<Vec<JourneyOption>, TransperthError> {
        let tokens = self.tokens.acquire_session_tokens(&self.http).await;
        let body = PlanJourneyRequest::from_route(route, date, time);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=UTF-8"),
        );
        if let Ok(referer) = HeaderValue::from_str(&format!("{}{}", self.base_url, LANDING_PATH)) {
            headers.insert(header::REFERER, referer);
        }
        if let Ok(origin) = HeaderValue::from_str(&self.base_url) {
            headers.insert(header::ORIGIN, origin);
        }
        tokens.apply(&mut headers);

        debug!(route = %route.name, ?body, "Requesting journey plan");

        let response = self
            .http
            .post(format!("{}{}", self.base_url, PLAN_JOURNEY_PATH))
            .headers(headers)
            .json(&body)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransperthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;

        let plan: PlanJourneyResponse =
            serde_json::from_str(&body).map_err(|e| TransperthError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(BODY_SNIPPET_CHARS).collect()),
            })?;

        if plan.result.as_deref() != Some("success") {
            error!(route = %route.name, payload = %body, "Planner returned error");
            return Err(TransperthError::Rejected {
                result: plan.result.unwrap_or_else(|| "unknown".to_string()),
                payload: body,
            });
        }

        Ok(convert::normalize(&plan.data)?)
    }

    async fn fetch_html(
        &self,
        route: &RouteConfig,
        date: &str,
        time: &str,
    ) -> Result<Vec<JourneyOption>, TransperthError> {
        if self.prime_html_session {
            if let Err(e) = self.landing.prime(&self.http).await {
                warn!(error = %e, "Could not prime planner session, continuing");
            }
        }

        let response = self
            .http
            .get(format!("{}{}", self.base_url, RESULTS_PATH))
            .query(&legacy_query(route, date, time))
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransperthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let page = html::parse_page(&body);

        if !page.has_results_table && page.missing_parameter {
            return Err(TransperthError::PageError {
                message: page
                    .error_messages
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| "missing parameter".to_string()),
            });
        }

        Ok(page.options)
    }
}
