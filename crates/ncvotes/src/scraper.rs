use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::OnceCell;

use crate::cache::Cache;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP status {status} from {url}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Client(_) => None,
            FetchError::Http { url, .. } | FetchError::Status { url, .. } => Some(url),
        }
    }
}

/// Anything that can turn a URL into page markup.
pub trait PageSource: Send + Sync {
    fn get_html(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client })
    }
}

impl PageSource for HttpSource {
    async fn get_html(&self, url: &str) -> Result<String, FetchError> {
        let http_err = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))
            .map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))
            .map_err(http_err)
    }
}

/// Caches page bodies by exact URL. Concurrent requests for one URL share a
/// single fetch; failures are not cached.
#[derive(Debug)]
pub struct Fetcher<S> {
    source: S,
    pages: Cache<String, Arc<OnceCell<String>>>,
}

impl<S: PageSource> Fetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            pages: Cache::new(),
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let cell = self
            .pages
            .get_or_insert_with(url.to_string(), || Arc::new(OnceCell::new()));

        if let Some(html) = cell.get() {
            log::debug!("Page cache hit: {}", url);
            return Ok(html.clone());
        }

        let html = cell
            .get_or_try_init(|| async {
                log::info!("Fetching {}", url);
                self.source.get_html(url).await
            })
            .await?;

        Ok(html.clone())
    }

    pub fn clear(&self) {
        self.pages.clear();
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StaticSource;
    use super::*;

    #[tokio::test]
    async fn test_fetch_is_cached_per_url() {
        let fetcher = Fetcher::new(StaticSource::new().with_page("https://a", "<p>a</p>"));

        assert_eq!(fetcher.fetch("https://a").await.unwrap(), "<p>a</p>");
        assert_eq!(fetcher.fetch("https://a").await.unwrap(), "<p>a</p>");
        assert_eq!(fetcher.source().hits("https://a"), 1);
    }

    #[tokio::test]
    async fn test_clear_invalidates_pages() {
        let fetcher = Fetcher::new(StaticSource::new().with_page("https://a", "<p>a</p>"));

        fetcher.fetch("https://a").await.unwrap();
        fetcher.clear();
        fetcher.fetch("https://a").await.unwrap();

        assert_eq!(fetcher.source().hits("https://a"), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let fetcher = Fetcher::new(StaticSource::new());

        let err = fetcher.fetch("https://missing").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(err.url(), Some("https://missing"));

        assert!(fetcher.fetch("https://missing").await.is_err());
        assert_eq!(fetcher.source().hits("https://missing"), 2);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_request() {
        let fetcher = Fetcher::new(StaticSource::new().with_page("https://a", "<p>a</p>"));

        let (a, b) =
            futures::future::join(fetcher.fetch("https://a"), fetcher.fetch("https://a")).await;

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(fetcher.source().hits("https://a"), 1);
    }
}
