//! Bilibili short link resolution.
//!
//! `b23.tv` short links are expanded by reading the `Location` header of a
//! non-following request. The BV id found in the target becomes a
//! `bilibili://video/<BV>` url; a `p` query parameter selects the page.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use tracing::debug;
use url::Url;

use crate::resolve::{LinkResolver, Resolution, ResolveError};

const SHORT_LINK_HOST: &str = "b23.tv";
const USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 14_0 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1";

static BV_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"BV[a-zA-Z0-9]{10}").expect("valid BV pattern"));

/// Resolves `b23.tv` links; every other url is left alone.
pub struct BilibiliResolver {
    client: reqwest::Client,
}

impl BilibiliResolver {
    pub fn new(timeout: Duration) -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ResolveError::Client)?;

        Ok(BilibiliResolver { client })
    }

    async fn expand(&self, short_url: &str) -> Result<String, ResolveError> {
        let response = self.client.get(short_url).send().await?;
        let target = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_else(|| short_url.to_owned());

        debug!(short_url, target = %target, status = %response.status(), "expanded short link");
        Ok(target)
    }
}

#[async_trait]
impl LinkResolver for BilibiliResolver {
    async fn resolve(&self, raw_url: &str) -> Result<Option<Resolution>, ResolveError> {
        if !raw_url.contains(SHORT_LINK_HOST) {
            return Ok(None);
        }
        let target = self.expand(raw_url).await?;
        Ok(canonicalize(&target))
    }
}

/// Builds the canonical form of a bilibili video url, if it names a video.
pub fn canonicalize(target: &str) -> Option<Resolution> {
    let normalized = if target.starts_with("http") {
        target.to_owned()
    } else {
        format!("https://{target}")
    };
    let parsed = Url::parse(&normalized).ok()?;
    let bvid = BV_PATTERN.find(parsed.path())?.as_str().to_owned();

    let page = parsed
        .query_pairs()
        .find(|(key, _)| key == "p")
        .and_then(|(_, value)| value.parse::<u32>().ok());

    let resolution = match page {
        Some(p) => Resolution {
            url: Some(format!("bilibili://video/{bvid}?page={}", p.saturating_sub(1))),
            title_suffix: Some(format!(" P{p}")),
            id_hint: Some(bvid),
        },
        None => Resolution {
            url: Some(format!("bilibili://video/{bvid}")),
            title_suffix: None,
            id_hint: Some(bvid),
        },
    };
    Some(resolution)
}
