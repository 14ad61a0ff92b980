// REST HTTP client
//
// Wraps `reqwest::Client` with PostgREST URL construction, predicate
// rendering, error-body decoding, and `Content-Range` count parsing.
// Every call is a single request; nothing here retries or caches.

use reqwest::header::{CONTENT_RANGE, HeaderMap};
use secrecy::SecretString;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{ALERTS_TABLE, AlertRecord, INTERSECTIONS_TABLE, IntersectionRecord};
use crate::query::Query;
use crate::transport::TransportConfig;

const REST_PREFIX: &str = "rest/v1";

/// Upper bound on how much of a response body goes into an error message.
const PREVIEW_BYTES: usize = 200;

/// Error body shape the backend sends on non-2xx responses.
#[derive(Deserialize)]
struct BackendErrorBody {
    message: Option<String>,
    code: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// HTTP client for the backend's table endpoints.
///
/// All methods return fully decoded payloads or an [`Error`]; a failed
/// call never yields a partial result.
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    /// Create a client from a `TransportConfig`. The `base_url` is the
    /// backend root (e.g. `https://xyzcompany.supabase.co`).
    pub fn new(
        base_url: Url,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client(api_key)?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for any auth headers.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Typed table helpers ──────────────────────────────────────────

    /// Fetch every intersection row (no ordering guarantee).
    pub async fn list_intersections(&self) -> Result<Vec<IntersectionRecord>, Error> {
        self.select(&Query::table(INTERSECTIONS_TABLE)).await
    }

    /// Fetch alerts matching the given status/category, newest first.
    ///
    /// `None` or `"all"` leaves that column unconstrained.
    pub async fn list_alerts(
        &self,
        status: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<AlertRecord>, Error> {
        let query = Query::table(ALERTS_TABLE)
            .filter("status", status)
            .filter("type", category)
            .order_desc("created_at");
        self.select(&query).await
    }

    // ── Generic SELECT / COUNT ───────────────────────────────────────

    /// `SELECT *` with the query's predicates and ordering.
    pub async fn select<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>, Error> {
        let url = self.table_url(query.table_name())?;
        debug!("GET {} {:?}", url, query.predicates());

        let resp = self
            .http
            .get(url)
            .query(&[("select", "*")])
            .query(&query.to_pairs())
            .send()
            .await
            .map_err(Error::Transport)?;

        let resp = check_status(resp).await?;
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(bytes = body.len(), "select response");

        serde_json::from_str(&body).map_err(|e| {
            let preview = preview(&body);
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    /// Exact row count for the query's predicates, without transferring rows.
    pub async fn count(&self, query: &Query) -> Result<u64, Error> {
        let url = self.table_url(query.table_name())?;
        debug!("HEAD {} {:?}", url, query.predicates());

        let resp = self
            .http
            .head(url)
            .header("Prefer", "count=exact")
            .query(&[("select", "*")])
            .query(&query.to_pairs())
            .send()
            .await
            .map_err(Error::Transport)?;

        let resp = check_status(resp).await?;
        parse_content_range(resp.headers()).ok_or_else(|| Error::MissingCount {
            table: query.table_name().to_owned(),
        })
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/rest/v1/{table}`
    pub(crate) fn table_url(&self, table: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{REST_PREFIX}/{table}"))?)
    }
}

/// Turn non-2xx responses into `Error::Backend`, decoding the error body
/// when the backend sent one.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let (message, code) = match serde_json::from_str::<BackendErrorBody>(&body) {
        Ok(parsed) => {
            let mut message = parsed
                .message
                .unwrap_or_else(|| format!("HTTP {status}"));
            if let Some(hint) = parsed.hint {
                message = format!("{message} ({hint})");
            }
            (message, parsed.code)
        }
        Err(_) if body.is_empty() => (format!("HTTP {status}"), None),
        Err(_) => (preview(&body).to_owned(), None),
    };

    Err(Error::Backend {
        message,
        code,
        status: status.as_u16(),
    })
}

/// At most `PREVIEW_BYTES` of `body`, cut on a char boundary.
fn preview(body: &str) -> &str {
    if body.len() <= PREVIEW_BYTES {
        return body;
    }
    let end = (0..=PREVIEW_BYTES)
        .rev()
        .find(|&i| body.is_char_boundary(i))
        .unwrap_or(0);
    &body[..end]
}

/// Extract the total from `Content-Range: 0-24/128` or `*/128`.
fn parse_content_range(headers: &HeaderMap) -> Option<u64> {
    let raw = headers.get(CONTENT_RANGE)?.to_str().ok()?;
    let (_, total) = raw.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn range(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_RANGE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn preview_cuts_on_char_boundary() {
        // 3-byte chars put byte 200 inside the 67th char.
        let body = "路口".repeat(100);
        let cut = preview(&body);
        assert_eq!(cut.len(), 198);
        assert!(body.starts_with(cut));
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn content_range_with_window() {
        assert_eq!(parse_content_range(&range("0-24/128")), Some(128));
    }

    #[test]
    fn content_range_head_only() {
        assert_eq!(parse_content_range(&range("*/0")), Some(0));
    }

    #[test]
    fn content_range_unknown_total() {
        assert_eq!(parse_content_range(&range("0-24/*")), None);
        assert_eq!(parse_content_range(&HeaderMap::new()), None);
    }

    #[test]
    fn table_url_tolerates_trailing_slash() {
        let client = RestClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://backend.example/").unwrap(),
        );
        assert_eq!(
            client.table_url("alerts").unwrap().as_str(),
            "https://backend.example/rest/v1/alerts"
        );
    }
}
