//! Where the poller gets journeys from.

use std::future::Future;

use crate::domain::{JourneyData, RouteConfig};
use crate::transperth::{TokenSource, TransperthClient, TransperthError};

/// Fetches journey options for one route.
///
/// This abstraction allows the poller to be tested without a network.
pub trait JourneySource: Send + Sync {
    /// Fetch `route` at an already-resolved date and time.
    fn fetch(
        &self,
        route: &RouteConfig,
        date: &str,
        time: &str,
    ) -> impl Future<Output = Result<JourneyData, TransperthError>> + Send;
}

impl<T: TokenSource> JourneySource for TransperthClient<T> {
    async fn fetch(
        &self,
        route: &RouteConfig,
        date: &str,
        time: &str,
    ) -> Result<JourneyData, TransperthError> {
        TransperthClient::fetch(self, route, date, time).await
    }
}
