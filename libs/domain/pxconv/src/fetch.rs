use std::time::Duration;

use pxfx::{Ccy, RateTable};

/// Timeout applied to every mirror request.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Mirror URL templates tried in order; `{code}` is the lower-cased base
/// currency code. CDN first, raw fallback second, then the uncompressed
/// file variants of both.
const MIRROR_TEMPLATES: [&str; 4] = [
    "https://cdn.jsdelivr.net/gh/fawazahmed0/currency-api@1/latest/currencies/{code}.min.json",
    "https://raw.githubusercontent.com/fawazahmed0/currency-api/1/latest/currencies/{code}.min.json",
    "https://cdn.jsdelivr.net/gh/fawazahmed0/currency-api@1/latest/currencies/{code}.json",
    "https://raw.githubusercontent.com/fawazahmed0/currency-api/1/latest/currencies/{code}.json",
];

fn mirror_urls(code: &str) -> Vec<String> {
    MIRROR_TEMPLATES
        .iter()
        .map(|tpl| tpl.replace("{code}", code))
        .collect()
}

// -----------------------------------------------------------------------------
// FetchError
// -----------------------------------------------------------------------------
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("every rate mirror failed for base currency {base}")]
    AllMirrorsFailed { base: Ccy },
    #[error("rate payload for base currency {base} is malformed: {reason}")]
    MalformedPayload { base: Ccy, reason: String },
}

// -----------------------------------------------------------------------------
// RateSource
// -----------------------------------------------------------------------------
/// Source of a fresh rate table for a base currency.
pub trait RateSource {
    fn fetch_rates(&self, base: Ccy) -> Result<RateTable, FetchError>;
}

// -----------------------------------------------------------------------------
// RateTransport
// HttpTransport
// -----------------------------------------------------------------------------
/// One GET returning a parsed JSON body. Split out of the fetcher so the
/// mirror policy can be exercised against a scripted transport.
pub trait RateTransport {
    fn get_json(&self, url: &str) -> anyhow::Result<serde_json::Value>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// # Errors
    /// - The underlying HTTP client cannot be constructed.
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl RateTransport for HttpTransport {
    fn get_json(&self, url: &str) -> anyhow::Result<serde_json::Value> {
        let response = self.client.get(url).send()?;
        anyhow::ensure!(
            response.status().is_success(),
            "mirror responded with status {}",
            response.status()
        );
        Ok(response.json()?)
    }
}

// -----------------------------------------------------------------------------
// RateFetcher
// -----------------------------------------------------------------------------
/// Fetches upstream quotes over a [`RateTransport`] with mirror fallback.
///
/// Mirrors are tried sequentially; individual failures are logged and
/// swallowed, and only full exhaustion surfaces as
/// [`FetchError::AllMirrorsFailed`]. The payload is expected to nest the
/// quote object one level under the lower-cased base code. Quotes are
/// inverted and filtered by [`RateTable::from_quotes`].
pub struct RateFetcher<T> {
    transport: T,
}

impl RateFetcher<HttpTransport> {
    /// Fetcher backed by a real HTTP client.
    ///
    /// # Errors
    /// - The HTTP client cannot be constructed.
    pub fn over_http() -> anyhow::Result<Self> {
        Ok(Self::new(HttpTransport::new()?))
    }
}

impl<T> RateFetcher<T> {
    #[inline]
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: RateTransport> RateSource for RateFetcher<T> {
    fn fetch_rates(&self, base: Ccy) -> Result<RateTable, FetchError> {
        let code = base.lower();
        let mut payload = None;
        for url in mirror_urls(&code) {
            log::info!("fetching exchange rates from {url}");
            match self.transport.get_json(&url) {
                Ok(body) => {
                    payload = Some(body);
                    break;
                }
                Err(err) => log::warn!("rate mirror {url} failed: {err:#}"),
            }
        }
        let payload = payload.ok_or(FetchError::AllMirrorsFailed { base })?;

        let quotes = payload
            .get(&code)
            .and_then(serde_json::Value::as_object)
            .ok_or_else(|| FetchError::MalformedPayload {
                base,
                reason: format!("no quote object under key {code:?}"),
            })?;
        Ok(RateTable::from_quotes(
            quotes
                .iter()
                .filter_map(|(code, quote)| quote.as_f64().map(|q| (code.as_str(), q))),
        ))
    }
}
