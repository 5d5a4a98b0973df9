//! Thin asynchronous client for operator pages on the PRTS wiki.
//!
//! - Scrapes the (material, quantity) pairs shown on an operator page.
//! - Keeps fetched lists in an in-memory cache, optionally backed by disk,
//!   with stale fallbacks when the wiki is unreachable.

#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, OnceLock},
    time::Duration,
};

use regex::Regex;
use reqwest::{Client, Url};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{FetchError, FetchedItems, ItemSource, RawItemEntry};
use crate::infra::cache::{load_item_cache, save_item_cache, ItemListCache, ITEM_CACHE_TTL};
use crate::util::version::user_agent;

pub const DEFAULT_BASE_URL: &str = "https://prts.wiki/w/";

#[derive(Debug, Error)]
pub enum WikiClientError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => FetchError::Status {
                status: status.as_u16(),
                url: error.url().map(Url::to_string).unwrap_or_default(),
            },
            None => FetchError::Transport(Box::new(error)),
        }
    }
}

#[derive(Clone)]
pub struct WikiClient {
    http: Client,
    base_url: Url,
    cache: Arc<Mutex<ItemListCache>>,
    ttl: Duration,
    disk_cache: Option<PathBuf>,
}

impl WikiClient {
    pub fn new() -> Result<Self, WikiClientError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base: &str) -> Result<Self, WikiClientError> {
        let base_url = Url::parse(base)?;
        let http = Client::builder().user_agent(user_agent()).build()?;
        Ok(Self {
            http,
            base_url,
            cache: Arc::new(Mutex::new(ItemListCache::default())),
            ttl: ITEM_CACHE_TTL,
            disk_cache: None,
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Seeds the in-memory cache from `path` and writes it back on `persist`.
    pub fn with_disk_cache(mut self, path: PathBuf) -> Self {
        if let Some(cache) = load_item_cache(&path) {
            info!("[wiki] Using {} cached pages from {}", cache.len(), path.display());
            self.cache = Arc::new(Mutex::new(cache));
        }
        self.disk_cache = Some(path);
        self
    }

    /// Item list for one operator page, served from cache when fresh.
    /// Empty lists are never cached.
    pub async fn get_item_entries(&self, entity: &str) -> Result<FetchedItems, FetchError> {
        if let Some(entries) = self.cached_entries(entity).await {
            debug!("[wiki] Serving cached page for {entity}");
            return Ok(FetchedItems::fresh(entries));
        }

        let url = self.page_url(entity)?;
        debug!("[wiki] Requesting {url}");

        match self.fetch_page(url.clone()).await {
            Ok(html) => {
                let entries = extract_item_entries(&html);
                if entries.is_empty() {
                    warn!("[wiki] No items found on {url}");
                } else {
                    self.cache.lock().await.insert(entity, entries.clone());
                }
                Ok(FetchedItems::fresh(entries))
            }
            Err(error) => {
                if let Some(stale) = self.stale_entries(entity).await {
                    warn!("[wiki] Request for {url} failed ({error}); using stale cache");
                    return Ok(FetchedItems::stale(stale));
                }
                Err(error)
            }
        }
    }

    /// Writes the cache to disk when a disk cache is configured.
    pub async fn persist(&self) -> Result<(), std::io::Error> {
        let Some(path) = self.disk_cache.as_ref() else {
            return Ok(());
        };
        let cache = self.cache.lock().await;
        save_item_cache(path, &cache)
    }

    pub fn page_url(&self, entity: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(entity);
        Ok(url)
    }

    async fn cached_entries(&self, entity: &str) -> Option<Vec<RawItemEntry>> {
        let cache = self.cache.lock().await;
        cache
            .get_fresh(entity, self.ttl)
            .map(|page| page.entries.clone())
    }

    async fn stale_entries(&self, entity: &str) -> Option<Vec<RawItemEntry>> {
        let cache = self.cache.lock().await;
        cache.get_stale(entity).map(|page| {
            debug!("[wiki] Stale page for {entity} is {} old", page.age_string());
            page.entries.clone()
        })
    }

    async fn fetch_page(&self, url: Url) -> Result<String, FetchError> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

impl ItemSource for WikiClient {
    async fn fetch_items(&self, entity: &str) -> Result<FetchedItems, FetchError> {
        self.get_item_entries(entity).await
    }
}

fn item_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<div\s+style\s*=\s*"\s*display:\s*inline-block;\s*position:\s*relative;?\s*"[^>]*>"#)
            .expect("item block pattern")
    })
}

fn anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)<a\b[^>]*>"#).expect("anchor pattern"))
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\stitle\s*=\s*"([^"]*)""#).expect("title pattern"))
}

fn span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?is)<span\b[^>]*>(.*?)</span>"#).expect("span pattern"))
}

/// Pulls (title of first `<a>`, text of first `<span>`) out of every
/// material icon block, in document order. Blocks missing either are skipped.
pub fn extract_item_entries(html: &str) -> Vec<RawItemEntry> {
    let starts: Vec<_> = item_block_re().find_iter(html).collect();
    let mut entries = Vec::with_capacity(starts.len());

    for (index, start) in starts.iter().enumerate() {
        let end = starts
            .get(index + 1)
            .map(|next| next.start())
            .unwrap_or(html.len());
        let block = &html[start.end()..end];

        let Some(anchor) = anchor_re().find(block) else {
            continue;
        };
        let Some(title) = title_re().captures(anchor.as_str()).and_then(|c| c.get(1)) else {
            continue;
        };
        let Some(span) = span_re().captures(block).and_then(|c| c.get(1)) else {
            continue;
        };

        entries.push(RawItemEntry::new(
            decode_entities(title.as_str()),
            stripped_text(span.as_str()),
        ));
    }

    entries
}

/// Text content with tags removed and every text fragment trimmed.
fn stripped_text(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut piece = String::new();
    let mut in_tag = false;

    for ch in fragment.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push_str(decode_entities(&piece).trim());
                piece.clear();
            }
            '>' => in_tag = false,
            _ if !in_tag => piece.push(ch),
            _ => {}
        }
    }
    out.push_str(decode_entities(&piece).trim());
    out
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').and_then(|semi| {
            decode_entity(&tail[1..semi]).map(|ch| (ch, semi))
        }) {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
