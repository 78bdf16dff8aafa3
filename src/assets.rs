//! Asset manifest and load tracking
//!
//! The simulation never touches images. It only needs to know when every
//! resource named in the options has settled, successfully or not, before
//! the first frame is drawn.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::settings::AssetOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetCategory {
    Protagonist,
    Background,
    Tile,
    Award,
    Enemy,
    Flag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub category: AssetCategory,
    pub id: String,
}

/// Every distinct resource id named by the options
#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    entries: Vec<AssetRef>,
}

impl AssetManifest {
    pub fn from_options(assets: &AssetOptions) -> Self {
        let mut manifest = Self::default();
        let mut seen = HashSet::new();
        let mut add = |category: AssetCategory, id: &str| {
            if seen.insert(id.to_string()) {
                manifest.entries.push(AssetRef {
                    category,
                    id: id.to_string(),
                });
            }
        };

        if let Some(p) = &assets.protagonist {
            for id in p.running.iter().chain(&p.jumping).chain(&p.dead) {
                add(AssetCategory::Protagonist, id);
            }
        }
        for id in &assets.background {
            add(AssetCategory::Background, id);
        }
        for t in &assets.tiles {
            for id in t.left.iter().chain(&t.middle).chain(&t.right) {
                add(AssetCategory::Tile, id);
            }
        }
        for a in &assets.awards {
            for id in a.normal.iter().chain(&a.collected) {
                add(AssetCategory::Award, id);
            }
        }
        for e in &assets.enemies {
            for id in e.running.iter().chain(&e.dead) {
                add(AssetCategory::Enemy, id);
            }
        }
        for f in &assets.flags {
            for id in &f.normal {
                add(AssetCategory::Flag, id);
            }
        }
        manifest
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetRef> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, category: AssetCategory) -> usize {
        self.entries.iter().filter(|a| a.category == category).count()
    }
}

/// Outcome of resolving one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetEvent {
    Loaded(String),
    Failed { id: String, reason: String },
}

/// Outstanding resolutions. Failures count toward settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetLoadState {
    pending: usize,
    failed: Vec<String>,
}

impl AssetLoadState {
    pub fn new(total: usize) -> Self {
        Self {
            pending: total,
            failed: Vec::new(),
        }
    }

    /// Record a settled resolution. Returns true when this one settles the set.
    pub fn record(&mut self, event: &AssetEvent) -> bool {
        if self.pending == 0 {
            return false;
        }
        if let AssetEvent::Failed { id, reason } = event {
            log::warn!("Asset {id} failed to load: {reason}");
            self.failed.push(id.clone());
        }
        self.pending -= 1;
        self.pending == 0
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn is_settled(&self) -> bool {
        self.pending == 0
    }

    /// Ids left as placeholders
    pub fn failed(&self) -> &[String] {
        &self.failed
    }
}

/// Turns a resource id into a settled outcome
pub trait AssetResolver {
    fn resolve(&mut self, asset: &AssetRef) -> AssetEvent;
}

impl<F> AssetResolver for F
where
    F: FnMut(&AssetRef) -> AssetEvent,
{
    fn resolve(&mut self, asset: &AssetRef) -> AssetEvent {
        self(asset)
    }
}

/// Resolves ids as paths relative to a root directory
#[derive(Debug, Clone)]
pub struct FsAssetResolver {
    root: PathBuf,
}

impl FsAssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetResolver for FsAssetResolver {
    fn resolve(&mut self, asset: &AssetRef) -> AssetEvent {
        let path = self.root.join(&asset.id);
        if path.is_file() {
            log::debug!("Resolved {:?} asset {}", asset.category, path.display());
            AssetEvent::Loaded(asset.id.clone())
        } else {
            AssetEvent::Failed {
                id: asset.id.clone(),
                reason: format!("{} is not a file", path.display()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::GameOptions;

    #[test]
    fn test_manifest_covers_every_category() {
        let options = GameOptions::demo();
        let manifest = AssetManifest::from_options(options.assets.as_ref().unwrap());
        // 4 running + jump + dead
        assert_eq!(manifest.count(AssetCategory::Protagonist), 6);
        assert_eq!(manifest.count(AssetCategory::Background), 2);
        assert_eq!(manifest.count(AssetCategory::Tile), 12);
        assert_eq!(manifest.count(AssetCategory::Award), 2);
        assert_eq!(manifest.count(AssetCategory::Enemy), 3);
        assert_eq!(manifest.count(AssetCategory::Flag), 2);
        assert_eq!(manifest.len(), 27);
    }

    #[test]
    fn test_duplicate_ids_are_counted_once() {
        let mut options = GameOptions::demo();
        let assets = options.assets.as_mut().unwrap();
        assets.background = vec!["bg.png".into(), "bg.png".into()];
        let manifest = AssetManifest::from_options(assets);
        assert_eq!(manifest.count(AssetCategory::Background), 1);
    }

    #[test]
    fn test_failures_still_settle() {
        let mut state = AssetLoadState::new(2);
        assert!(!state.record(&AssetEvent::Loaded("a".into())));
        assert!(state.record(&AssetEvent::Failed {
            id: "b".into(),
            reason: "missing".into(),
        }));
        assert!(state.is_settled());
        assert_eq!(state.failed(), ["b".to_string()]);
        // Extra events after settling are ignored
        assert!(!state.record(&AssetEvent::Loaded("c".into())));
    }

    #[test]
    fn test_fs_resolver_reports_missing_files() {
        let mut resolver = FsAssetResolver::new(std::env::temp_dir());
        let event = resolver.resolve(&AssetRef {
            category: AssetCategory::Tile,
            id: "parkour-sim-no-such-asset.png".into(),
        });
        assert!(matches!(event, AssetEvent::Failed { .. }));
    }
}
