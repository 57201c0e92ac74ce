use reqwest::redirect::{Attempt, Policy};
use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;
use crate::error::PatentFetchError;

/// Browser-like identification string. The patents site serves stripped-down
/// pages (without asset links) to clients that look like scripts.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const MAX_REDIRECTS: usize = 5;

type Allowlist = Arc<RwLock<HashSet<String>>>;

/// HTTP client that only talks to approved hosts.
///
/// Every request goes through [`AllowlistClient::get`], which refuses URLs
/// whose host is not on the allowlist (or a subdomain of an allowed host)
/// before anything touches the network. Redirects are checked against the
/// same list on every hop.
///
/// Clones share one allowlist.
#[derive(Debug, Clone)]
pub struct AllowlistClient {
    client: Client,
    allowlist: Allowlist,
}

impl AllowlistClient {
    /// Builds a client with the given User-Agent and per-request timeout and
    /// an empty allowlist.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, PatentFetchError> {
        let allowlist: Allowlist = Arc::default();
        let client = ClientBuilder::new()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(redirect_policy(Arc::clone(&allowlist)))
            .build()
            .map_err(|e| PatentFetchError::Client(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(domain.to_ascii_lowercase());
    }

    /// Appends the host of `url` to the allowlist.
    pub fn allow_url_host(&mut self, url: &str) -> Result<(), PatentFetchError> {
        let parsed = Url::parse(url).map_err(|e| PatentFetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let host = parsed.host_str().ok_or_else(|| PatentFetchError::InvalidUrl {
            url: url.to_string(),
            reason: "URL has no host".to_string(),
        })?;
        self.allow_domain(host);
        Ok(())
    }

    /// Validates if a URL is permitted under the current allowlist.
    pub fn is_allowed(&self, url: &str) -> bool {
        Url::parse(url).is_ok_and(|parsed| host_allowed(&self.allowlist, &parsed))
    }

    /// Starts a GET request, refusing hosts outside the allowlist.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, PatentFetchError> {
        if !self.is_allowed(url) {
            tracing::debug!(url = %url, "Refusing request to host outside allowlist");
            return Err(PatentFetchError::HostNotAllowed(url.to_string()));
        }

        Ok(self.client.get(url))
    }
}

fn host_allowed(allowlist: &Allowlist, url: &Url) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = url.host_str() else { return false };
    let host = host.to_ascii_lowercase();

    allowlist
        .read()
        .unwrap_or_else(|p| p.into_inner())
        .iter()
        .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)))
}

/// At most [`MAX_REDIRECTS`] hops, each to an allowed host.
fn redirect_policy(allowlist: Allowlist) -> Policy {
    Policy::custom(move |attempt: Attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if host_allowed(&allowlist, attempt.url()) {
            attempt.follow()
        } else {
            tracing::debug!(url = %attempt.url(), "Refusing redirect to host outside allowlist");
            let refused = PatentFetchError::HostNotAllowed(attempt.url().to_string());
            attempt.error(refused)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AllowlistClient {
        let mut c = AllowlistClient::new(BROWSER_USER_AGENT, Duration::from_secs(5)).unwrap();
        c.allow_domain("patents.google.com");
        c.allow_domain("storage.googleapis.com");
        c
    }

    #[test]
    fn test_exact_host_allowed() {
        assert!(client().is_allowed("https://patents.google.com/patent/US1234567A"));
    }

    #[test]
    fn test_subdomain_allowed() {
        assert!(client().is_allowed("https://patentimages.storage.googleapis.com/a/b/US1.pdf"));
    }

    #[test]
    fn test_lookalike_host_refused() {
        let c = client();
        assert!(!c.is_allowed("https://evilpatents.google.com.attacker.net/x.pdf"));
        assert!(!c.is_allowed("https://notstorage.googleapis.com/x.pdf"));
    }

    #[test]
    fn test_non_http_scheme_refused() {
        assert!(!client().is_allowed("file:///etc/passwd"));
        assert!(!client().is_allowed("not a url"));
    }

    #[test]
    fn test_get_refuses_unlisted_host() {
        let err = client().get("https://example.com/x.pdf").unwrap_err();
        assert!(matches!(err, PatentFetchError::HostNotAllowed(_)));
    }

    #[test]
    fn test_allow_url_host_extracts_host() {
        let mut c = AllowlistClient::new(BROWSER_USER_AGENT, Duration::from_secs(5)).unwrap();
        c.allow_url_host("http://127.0.0.1:4321/patent/").unwrap();
        assert!(c.is_allowed("http://127.0.0.1:4321/assets/US1.pdf"));
        assert!(c.allow_url_host("no host here").is_err());
    }

    #[tokio::test]
    async fn test_redirect_to_unlisted_host_is_refused() {
        let mut allowed = mockito::Server::new_async().await;
        let mut other = mockito::Server::new_async().await;
        let target = format!("http://localhost:{}/patent/US1", other.socket_address().port());
        let _hop = allowed
            .mock("GET", "/patent/US1")
            .with_status(302)
            .with_header("location", &target)
            .create_async()
            .await;
        let untouched = other.mock("GET", "/patent/US1").expect(0).create_async().await;

        let mut c = AllowlistClient::new(BROWSER_USER_AGENT, Duration::from_secs(5)).unwrap();
        c.allow_url_host(&allowed.url()).unwrap();
        assert!(!c.is_allowed(&target));

        let err = c.get(&format!("{}/patent/US1", allowed.url())).unwrap().send().await.unwrap_err();
        assert!(err.is_redirect(), "expected redirect error, got {err}");
        untouched.assert_async().await;
    }

    #[tokio::test]
    async fn test_redirect_within_allowlist_is_followed() {
        let mut server = mockito::Server::new_async().await;
        let _hop = server
            .mock("GET", "/old")
            .with_status(301)
            .with_header("location", &format!("{}/new", server.url()))
            .create_async()
            .await;
        let _dest = server.mock("GET", "/new").with_status(200).with_body("ok").create_async().await;

        let mut c = AllowlistClient::new(BROWSER_USER_AGENT, Duration::from_secs(5)).unwrap();
        c.allow_url_host(&server.url()).unwrap();

        let resp = c.get(&format!("{}/old", server.url())).unwrap().send().await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_redirect_loop_stops_after_limit() {
        let mut server = mockito::Server::new_async().await;
        let _loop = server
            .mock("GET", "/loop")
            .with_status(302)
            .with_header("location", &format!("{}/loop", server.url()))
            .create_async()
            .await;

        let mut c = AllowlistClient::new(BROWSER_USER_AGENT, Duration::from_secs(5)).unwrap();
        c.allow_url_host(&server.url()).unwrap();

        let err = c.get(&format!("{}/loop", server.url())).unwrap().send().await.unwrap_err();
        assert!(err.is_redirect());
    }

    #[test]
    fn test_clones_share_allowlist() {
        let mut a = AllowlistClient::new(BROWSER_USER_AGENT, Duration::from_secs(5)).unwrap();
        let b = a.clone();
        a.allow_domain("patents.google.com");
        assert!(b.is_allowed("https://patents.google.com/patent/US1"));
    }
}
