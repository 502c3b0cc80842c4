//! Overlay images shared between renderers.
//!
//! Entries are keyed by logical path (e.g. `/masks/jem-stars.png`) and move
//! from pending to loaded (or failed) exactly once. Lookups never block: a
//! pending entry reads as not ready and the caller skips its draw.

use crate::error::AssetError;
use anyhow::Result;
use image::RgbaImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};
use std::thread;
use tracing::{debug, warn};

type Loader = Arc<dyn Fn(&Path) -> Result<RgbaImage> + Send + Sync>;
type Slot = Arc<OnceLock<Result<Arc<RgbaImage>, AssetError>>>;

pub struct AssetCache {
    base: String,
    loader: Loader,
    entries: RwLock<HashMap<String, Slot>>,
}

impl AssetCache {
    /// Load from disk with `image::open`, resolving paths against `base`.
    pub fn new(base: impl Into<String>) -> AssetCache {
        AssetCache::with_loader(base, |path| Ok(image::open(path)?.to_rgba8()))
    }

    pub fn with_loader(
        base: impl Into<String>,
        loader: impl Fn(&Path) -> Result<RgbaImage> + Send + Sync + 'static,
    ) -> AssetCache {
        AssetCache {
            base: base.into(),
            loader: Arc::new(loader),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn resolve(&self, logical: &str) -> PathBuf {
        PathBuf::from(resolve_asset_path(&self.base, logical))
    }

    /// Image for `logical` if already loaded. The first request starts a
    /// background load.
    pub fn get(&self, logical: &str) -> Option<Arc<RgbaImage>> {
        self.try_get(logical).ok()
    }

    pub fn try_get(&self, logical: &str) -> Result<Arc<RgbaImage>, AssetError> {
        let slot = self.slot(logical);
        match slot.get() {
            Some(Ok(img)) => Ok(img.clone()),
            Some(Err(e)) => Err(e.clone()),
            None => Err(AssetError::NotReady(logical.to_string())),
        }
    }

    pub fn is_ready(&self, logical: &str) -> bool {
        self.read_slot(logical)
            .and_then(|s| s.get().map(|r| r.is_ok()))
            .unwrap_or(false)
    }

    /// Start loading every path that isn't cached yet.
    pub fn preload<'a>(&self, paths: impl IntoIterator<Item = &'a str>) {
        for path in paths {
            self.slot(path);
        }
    }

    /// Place an already decoded image in the cache. Ignored when the path
    /// has already resolved.
    pub fn insert(&self, logical: &str, img: RgbaImage) {
        let slot = {
            let mut entries = match self.entries.write() {
                Ok(e) => e,
                Err(poisoned) => poisoned.into_inner(),
            };
            entries
                .entry(logical.to_string())
                .or_insert_with(|| Arc::new(OnceLock::new()))
                .clone()
        };
        let _ = slot.set(Ok(Arc::new(img)));
    }

    fn read_slot(&self, logical: &str) -> Option<Slot> {
        let entries = match self.entries.read() {
            Ok(e) => e,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.get(logical).cloned()
    }

    fn slot(&self, logical: &str) -> Slot {
        if let Some(slot) = self.read_slot(logical) {
            return slot;
        }

        let mut entries = match self.entries.write() {
            Ok(e) => e,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(slot) = entries.get(logical) {
            return slot.clone();
        }

        let slot: Slot = Arc::new(OnceLock::new());
        entries.insert(logical.to_string(), slot.clone());
        drop(entries);

        self.spawn_load(logical, slot.clone());
        slot
    }

    fn spawn_load(&self, logical: &str, slot: Slot) {
        let path = self.resolve(logical);
        let logical = logical.to_string();
        let loader = self.loader.clone();

        let spawned = thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                let result = match loader(&path) {
                    Ok(img) => {
                        debug!("Loaded overlay {logical} ({}x{})", img.width(), img.height());
                        Ok(Arc::new(img))
                    }
                    Err(e) => {
                        // not retried: the renderer keeps drawing its accents
                        warn!("Failed to load overlay {logical} from {path:?}: {e}");
                        Err(AssetError::Failed {
                            path: logical,
                            reason: e.to_string(),
                        })
                    }
                };
                let _ = slot.set(result);
            });

        if let Err(e) = spawned {
            warn!("Could not start asset loader: {e}");
        }
    }
}

/// Join a logical asset path onto a deployment base path without doubling
/// or dropping separators.
pub fn resolve_asset_path(base: &str, logical: &str) -> String {
    let rel = logical.trim_start_matches('/');
    if base.is_empty() {
        return rel.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), rel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn wait_for(cache: &AssetCache, path: &str) -> Result<Arc<RgbaImage>, AssetError> {
        let start = Instant::now();
        loop {
            match cache.try_get(path) {
                Err(AssetError::NotReady(_)) if start.elapsed() < Duration::from_secs(5) => {
                    thread::sleep(Duration::from_millis(5))
                }
                other => return other,
            }
        }
    }

    #[test]
    fn test_resolve_asset_path() {
        assert_eq!(resolve_asset_path("", "/masks/a.png"), "masks/a.png");
        assert_eq!(resolve_asset_path("public", "/masks/a.png"), "public/masks/a.png");
        assert_eq!(resolve_asset_path("/app/", "/masks/a.png"), "/app/masks/a.png");
        assert_eq!(resolve_asset_path("/app", "masks/a.png"), "/app/masks/a.png");
    }

    #[test]
    fn test_loads_once_and_caches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let cache = AssetCache::with_loader("assets", move |path| {
            counter.fetch_add(1, Ordering::SeqCst);
            assert_eq!(path, Path::new("assets/masks/x.png"));
            Ok(RgbaImage::new(3, 2))
        });

        let img = wait_for(&cache, "/masks/x.png").unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert!(cache.is_ready("/masks/x.png"));
        for _ in 0..5 {
            assert!(cache.get("/masks/x.png").is_some());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first_lookup_is_not_ready() {
        let (tx, rx) = flume::bounded::<()>(1);
        let cache = AssetCache::with_loader("", move |_| {
            let _ = rx.recv();
            Ok(RgbaImage::new(1, 1))
        });

        assert!(matches!(
            cache.try_get("/masks/slow.png"),
            Err(AssetError::NotReady(_))
        ));
        assert!(!cache.is_ready("/masks/slow.png"));
        tx.send(()).unwrap();
        assert!(wait_for(&cache, "/masks/slow.png").is_ok());
    }

    #[test]
    fn test_failed_load_is_remembered() {
        let cache = AssetCache::with_loader("", |_| Err(Error::msg("missing")));
        let res = wait_for(&cache, "/masks/gone.png");
        assert!(matches!(res, Err(AssetError::Failed { .. })));
        assert!(cache.get("/masks/gone.png").is_none());
    }

    #[test]
    fn test_insert_is_immediately_ready() {
        let cache = AssetCache::with_loader("", |_| Err(Error::msg("unused")));
        cache.insert("/masks/inline.png", RgbaImage::new(4, 4));
        assert!(cache.is_ready("/masks/inline.png"));
        assert_eq!(cache.get("/masks/inline.png").unwrap().width(), 4);
    }
}
