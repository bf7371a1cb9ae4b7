//! Link resolution for submitted songs.
//!
//! Before an edit reaches the session layer its url may be rewritten into a
//! canonical form. Resolution is best effort: any failure leaves the item
//! exactly as submitted.

pub mod bilibili;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::queue::Item;

pub use bilibili::BilibiliResolver;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("short link request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// What a resolver learned about a url.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Canonical replacement url
    pub url: Option<String>,
    /// Appended to the item title
    pub title_suffix: Option<String>,
    /// Used as the item id when the client sent none
    pub id_hint: Option<String>,
}

#[async_trait]
pub trait LinkResolver: Send + Sync {
    /// Returns `Ok(None)` for urls this resolver does not handle.
    async fn resolve(&self, raw_url: &str) -> Result<Option<Resolution>, ResolveError>;
}

/// Applies `resolver` to `item`, falling back to the original payload.
pub async fn enrich(mut item: Item, resolver: &dyn LinkResolver) -> Item {
    let resolution = match resolver.resolve(&item.url).await {
        Ok(Some(resolution)) => resolution,
        Ok(None) => return item,
        Err(e) => {
            warn!(url = %item.url, "link resolution failed, keeping original: {}", e);
            return item;
        }
    };

    debug!(from = %item.url, ?resolution, "resolved link");
    if let Some(url) = resolution.url {
        item.url = url;
    }
    if let Some(suffix) = resolution.title_suffix {
        item.title.push_str(&suffix);
    }
    if item.id.is_empty() {
        if let Some(id) = resolution.id_hint {
            item.id = id;
        }
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Option<Resolution>, ()>);

    #[async_trait]
    impl LinkResolver for Fixed {
        async fn resolve(&self, _raw_url: &str) -> Result<Option<Resolution>, ResolveError> {
            match &self.0 {
                Ok(resolution) => Ok(resolution.clone()),
                Err(()) => Err(ResolveError::Client(
                    reqwest::Client::builder()
                        .user_agent("\u{0}")
                        .build()
                        .unwrap_err(),
                )),
            }
        }
    }

    #[tokio::test]
    async fn test_enrich_applies_resolution() {
        let resolver = Fixed(Ok(Some(Resolution {
            url: Some("bilibili://video/BV1xx411c7mD?page=1".into()),
            title_suffix: Some(" P2".into()),
            id_hint: Some("BV1xx411c7mD".into()),
        })));
        let item = Item::new("", "Song", "https://b23.tv/abc");

        let item = enrich(item, &resolver).await;

        assert_eq!(item.url, "bilibili://video/BV1xx411c7mD?page=1");
        assert_eq!(item.title, "Song P2");
        assert_eq!(item.id, "BV1xx411c7mD");
    }

    #[tokio::test]
    async fn test_enrich_keeps_existing_id() {
        let resolver = Fixed(Ok(Some(Resolution {
            id_hint: Some("BV1xx411c7mD".into()),
            ..Resolution::default()
        })));
        let item = enrich(Item::new("mine", "Song", "https://b23.tv/abc"), &resolver).await;
        assert_eq!(item.id, "mine");
    }

    #[tokio::test]
    async fn test_enrich_falls_back_on_error() {
        let original = Item::new("a", "Song", "https://b23.tv/abc");
        let item = enrich(original.clone(), &Fixed(Err(()))).await;
        assert_eq!(item, original);
    }

    #[tokio::test]
    async fn test_enrich_unhandled_url() {
        let original = Item::new("a", "Song", "https://example.com");
        let item = enrich(original.clone(), &Fixed(Ok(None))).await;
        assert_eq!(item, original);
    }
}
