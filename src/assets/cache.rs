use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use reqwest::{header, Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ============================================================================
// Constants
// ============================================================================

/// Naming prefix shared by every bucket generation.
const BUCKET_PREFIX: &str = "currency-converter-";

/// Version tag of the current bucket. Bumping it makes every previously
/// installed bucket stale on the next activation.
pub const BUCKET_VERSION: &str = "v1";

/// Application shell assets pre-populated at install time, resolved
/// against the configured application origin. A single fetch failure
/// fails the whole install.
pub const ASSET_MANIFEST: &[&str] = &[
    "/",
    "/js/app.js",
    "/css/app.css",
    "/manifest.json",
];

/// Maximum concurrent asset fetches during install.
const MAX_CONCURRENT_FETCHES: usize = 4;

/// Lifecycle of a bucket generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePhase {
    Installing,
    Activating,
    Active,
}

/// A cached response body for one asset URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAsset {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// How an intercepted request should be satisfied.
#[derive(Debug, Clone, PartialEq)]
pub enum ServeDecision {
    /// Rate-service traffic is never cached; always go to the network.
    Bypass,
    CacheHit(CachedAsset),
    /// Not cached; fall through to the network without write-back.
    NetworkFallback,
}

/// Versioned cache of static application assets.
///
/// One bucket file per version, named `{prefix}{version}.json`, mapping
/// request URL to cached response. Exactly one bucket is current; all
/// other same-prefix buckets are deleted on activation.
pub struct AssetCache {
    root: PathBuf,
    bucket_name: String,
    api_origin: Option<String>,
    entries: BTreeMap<String, CachedAsset>,
    phase: CachePhase,
}

impl AssetCache {
    /// Open the cache at the given directory for the given version,
    /// loading the current bucket if one was installed previously.
    /// Requests whose origin matches `api_url` always bypass the cache.
    pub fn open(root: PathBuf, version: &str, api_url: &str) -> Self {
        if let Err(e) = fs::create_dir_all(&root) {
            warn!(error = %e, path = %root.display(), "Failed to create asset cache directory");
        }

        let bucket_name = format!("{}{}", BUCKET_PREFIX, version);
        let bucket_path = root.join(format!("{}.json", bucket_name));
        let entries = match fs::read_to_string(&bucket_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(bucket = %bucket_name, error = %e, "Failed to parse bucket, starting empty");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };

        let phase = if entries.is_empty() {
            CachePhase::Installing
        } else {
            CachePhase::Active
        };

        Self {
            root,
            bucket_name,
            api_origin: parse_origin(api_url),
            entries,
            phase,
        }
    }

    fn bucket_path(&self) -> PathBuf {
        self.root.join(format!("{}.json", self.bucket_name))
    }

    /// Pre-populate the bucket with every asset in the manifest, resolved
    /// against the application origin. Any single failure fails install
    /// and leaves the previous bucket contents in place.
    pub async fn install(&mut self, client: &Client, app_base: &Url, manifest: &[&str]) -> Result<()> {
        self.phase = CachePhase::Installing;

        let urls: Vec<Url> = manifest
            .iter()
            .map(|path| app_base.join(path))
            .collect::<Result<_, _>>()
            .context("Invalid asset manifest entry")?;

        let fetched: Vec<Result<(String, CachedAsset), reqwest::Error>> = stream::iter(urls)
            .map(|url| {
                let client = client.clone();
                async move {
                    let response = client.get(url.clone()).send().await?.error_for_status()?;
                    let content_type = response
                        .headers()
                        .get(header::CONTENT_TYPE)
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    let body = response.bytes().await?.to_vec();
                    Ok((url.to_string(), CachedAsset { content_type, body }))
                }
            })
            .buffer_unordered(MAX_CONCURRENT_FETCHES)
            .collect()
            .await;

        let mut entries = BTreeMap::new();
        for result in fetched {
            let (url, asset) = result.context("Failed to fetch manifest asset")?;
            entries.insert(url, asset);
        }

        self.entries = entries;
        let contents = serde_json::to_string(&self.entries)?;
        fs::write(self.bucket_path(), contents)
            .with_context(|| format!("Failed to write bucket {}", self.bucket_name))?;

        info!(bucket = %self.bucket_name, assets = self.entries.len(), "Asset cache installed");
        Ok(())
    }

    /// Delete every same-prefix bucket except the current version's,
    /// then become active.
    pub fn activate(&mut self) -> Result<()> {
        self.phase = CachePhase::Activating;

        for entry in fs::read_dir(&self.root).context("Failed to enumerate asset cache buckets")? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(bucket) = name.strip_suffix(".json") else {
                continue;
            };
            if bucket.starts_with(BUCKET_PREFIX) && bucket != self.bucket_name {
                debug!(bucket, "Deleting stale asset bucket");
                fs::remove_file(entry.path())
                    .with_context(|| format!("Failed to delete stale bucket {}", bucket))?;
            }
        }

        self.phase = CachePhase::Active;
        info!(bucket = %self.bucket_name, "Asset cache active");
        Ok(())
    }

    /// Decide how an intercepted request should be satisfied.
    pub fn decide(&self, url: &str) -> ServeDecision {
        if let (Some(api_origin), Some(origin)) = (self.api_origin.as_deref(), parse_origin(url)) {
            if origin == api_origin {
                return ServeDecision::Bypass;
            }
        }

        match self.entries.get(url) {
            Some(asset) => ServeDecision::CacheHit(asset.clone()),
            None => ServeDecision::NetworkFallback,
        }
    }

    /// Serve a request cache-first. Misses and rate-service traffic go to
    /// the network; runtime fetches are never written back to the bucket.
    pub async fn serve(&self, client: &Client, url: &str) -> Result<CachedAsset> {
        match self.decide(url) {
            ServeDecision::CacheHit(asset) => {
                debug!(url, "Asset served from cache");
                Ok(asset)
            }
            ServeDecision::Bypass | ServeDecision::NetworkFallback => {
                let response = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("Failed to fetch {}", url))?
                    .error_for_status()?;
                let content_type = response
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                let body = response.bytes().await?.to_vec();
                Ok(CachedAsset { content_type, body })
            }
        }
    }
}

fn parse_origin(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|url| url.origin().ascii_serialization())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const API_URL: &str = "https://free.currencyconverterapi.com";

    fn asset(body: &str) -> CachedAsset {
        CachedAsset {
            content_type: Some("text/plain".to_string()),
            body: body.as_bytes().to_vec(),
        }
    }

    fn write_bucket(root: &std::path::Path, name: &str, entries: &BTreeMap<String, CachedAsset>) {
        fs::write(
            root.join(format!("{}.json", name)),
            serde_json::to_string(entries).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_activation_deletes_stale_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();

        write_bucket(&root, "currency-converter-v1", &BTreeMap::new());
        let mut current = BTreeMap::new();
        current.insert("https://example.com/js/app.js".to_string(), asset("app"));
        write_bucket(&root, "currency-converter-v2", &current);
        // Files outside the naming prefix are not ours to delete.
        fs::write(root.join("unrelated.json"), "{}").unwrap();

        let mut cache = AssetCache::open(root.clone(), "v2", API_URL);
        cache.activate().unwrap();

        assert!(!root.join("currency-converter-v1.json").exists());
        assert!(root.join("currency-converter-v2.json").exists());
        assert!(root.join("unrelated.json").exists());
        assert_eq!(cache.phase, CachePhase::Active);
    }

    #[test]
    fn test_api_origin_always_bypasses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();

        // Even a same-URL bucket entry must not be served for API traffic.
        let api_request = format!("{}/api/v5/convert?q=USD_EUR", API_URL);
        let mut entries = BTreeMap::new();
        entries.insert(api_request.clone(), asset("stale rate payload"));
        write_bucket(&root, "currency-converter-v1", &entries);

        let cache = AssetCache::open(root, "v1", API_URL);
        assert_eq!(cache.decide(&api_request), ServeDecision::Bypass);
    }

    #[test]
    fn test_cache_first_for_application_assets() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();

        let shell = "https://example.com/js/app.js".to_string();
        let mut entries = BTreeMap::new();
        entries.insert(shell.clone(), asset("shell"));
        write_bucket(&root, "currency-converter-v1", &entries);

        let cache = AssetCache::open(root, "v1", API_URL);
        assert_eq!(cache.decide(&shell), ServeDecision::CacheHit(asset("shell")));
        assert_eq!(
            cache.decide("https://example.com/css/app.css"),
            ServeDecision::NetworkFallback
        );
    }

    #[test]
    fn test_open_without_bucket_starts_installing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AssetCache::open(dir.path().to_path_buf(), "v1", API_URL);
        assert_eq!(cache.phase, CachePhase::Installing);
    }
}
