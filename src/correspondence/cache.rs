//! Correspondence cache shared by the measures of one evaluation session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use super::Correspondence;
use crate::Result;

/// Identifies the inputs a correspondence was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameKey {
    /// Identity of the ground-truth series (e.g. its folder)
    pub gt_series: String,
    /// Identity of the result series
    pub res_series: String,
    /// Frame index
    pub frame: usize,
    /// Slice of a volumetric RES frame the GT annotates, if any
    pub slice: Option<usize>,
}

impl FrameKey {
    pub fn new(gt_series: impl Into<String>, res_series: impl Into<String>, frame: usize) -> Self {
        Self {
            gt_series: gt_series.into(),
            res_series: res_series.into(),
            frame,
            slice: None,
        }
    }

    /// Same key restricted to one slice.
    pub fn with_slice(mut self, slice: Option<usize>) -> Self {
        self.slice = slice;
        self
    }
}

/// Thread-safe map from [`FrameKey`] to computed correspondences.
///
/// Entries are immutable snapshots; a changed input is handled by
/// invalidating its keys, never by mutating an entry.
#[derive(Debug, Default)]
pub struct CorrespondenceCache {
    entries: RwLock<HashMap<FrameKey, Arc<Correspondence>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl CorrespondenceCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached correspondence.
    pub fn get(&self, key: &FrameKey) -> Option<Arc<Correspondence>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    /// Store a correspondence, replacing any previous entry for the key.
    pub fn insert(&self, key: FrameKey, correspondence: Correspondence) -> Arc<Correspondence> {
        let value = Arc::new(correspondence);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, Arc::clone(&value));
        value
    }

    /// Return the cached correspondence or compute and store it.
    ///
    /// The computation runs without holding the lock, so concurrent workers
    /// processing different frames do not serialize on each other.
    pub fn get_or_try_insert_with<F>(&self, key: &FrameKey, compute: F) -> Result<Arc<Correspondence>>
    where
        F: FnOnce() -> Result<Correspondence>,
    {
        if let Some(hit) = self.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let computed = compute()?;
        Ok(self.insert(key.clone(), computed))
    }

    /// Drop one entry. Returns true if it was present.
    pub fn invalidate(&self, key: &FrameKey) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key).is_some()
    }

    /// Drop every entry computed from the given series (GT or RES side).
    ///
    /// Returns the number of removed entries.
    pub fn invalidate_series(&self, series: &str) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|k, _| k.gt_series != series && k.res_series != series);
        before - entries.len()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Number of cached correspondences.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lookups served from the cache.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that had to compute.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}
