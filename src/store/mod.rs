//! Prompt registry shared between the frame path and the editing surface.
//!
//! The store keeps its state behind an `Arc` that is swapped wholesale on
//! every mutation. `snapshot()` hands out the current `Arc`, so matchers read
//! a fully-consistent prompt set without holding any lock while scoring, and
//! editors never expose a half-applied change.

pub mod persist;

use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::embeddings::TextEncoder;
use crate::error::{ClipwatchError, Result};

/// Default minimum similarity to qualify as a match.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Default prefix prepended to prompt text before embedding, following the
/// usual CLIP prompt template.
pub const DEFAULT_TEXT_PREFIX: &str = "A photo of ";

/// Whether a prompt can win a match or only suppress others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn is_negative(self) -> bool {
        matches!(self, Polarity::Negative)
    }
}

/// A classification label with its precomputed reference vector.
///
/// The vector is computed once from `text_prefix + text` at creation time and
/// never re-embedded; changing the store prefix affects future prompts only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
    pub vector: Vec<f32>,
    pub polarity: Polarity,
    /// Prompts sharing a key are blended into one candidate before scoring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensemble_key: Option<String>,
}

/// Point-in-time view of the store: prompt list in insertion order plus the
/// scoring threshold and embedding prefix that were current when taken.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub prompts: Vec<Prompt>,
    pub threshold: f32,
    pub text_prefix: String,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self {
            prompts: Vec::new(),
            threshold: DEFAULT_THRESHOLD,
            text_prefix: DEFAULT_TEXT_PREFIX.to_string(),
        }
    }
}

/// Mutable, persisted registry of prompts.
///
/// Writers are serialized by the inner lock; readers only touch the lock long
/// enough to clone the current `Arc`.
pub struct PromptStore {
    state: RwLock<Arc<StoreSnapshot>>,
    encoder: Option<Arc<dyn TextEncoder>>,
}

/// Case- and whitespace-insensitive identity for prompt text.
fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

impl PromptStore {
    /// Create an empty store. Pass `None` for load-only mode: persisted
    /// prompts can still be loaded and matched, but `add` is rejected.
    pub fn new(encoder: Option<Arc<dyn TextEncoder>>) -> Self {
        Self {
            state: RwLock::new(Arc::new(StoreSnapshot::default())),
            encoder,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Arc<StoreSnapshot>> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arc<StoreSnapshot>> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Take a consistent view safe to read while editing proceeds.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        Arc::clone(&self.read())
    }

    /// Whether the embedding runtime is available for `add`.
    pub fn can_embed(&self) -> bool {
        self.encoder.as_ref().is_some_and(|e| e.is_ready())
    }

    /// Embed `text_prefix + text` and insert the prompt. A prompt whose
    /// normalized text already exists is replaced in place, keeping its
    /// insertion slot.
    pub fn add(
        &self,
        text: &str,
        polarity: Polarity,
        ensemble_key: Option<String>,
    ) -> Result<Prompt> {
        let encoder = self
            .encoder
            .as_ref()
            .filter(|e| e.is_ready())
            .ok_or(ClipwatchError::EmbeddingUnavailable)?;

        // Embed outside the lock; the frame path must not wait on the model.
        let prefix = self.snapshot().text_prefix.clone();
        let vector = encoder.embed(&format!("{}{}", prefix, text.trim()))?;
        let prompt = Prompt {
            text: text.trim().to_string(),
            vector,
            polarity,
            ensemble_key,
        };

        let mut guard = self.write();
        let mut next = StoreSnapshot::clone(&guard);
        let needle = normalize(&prompt.text);
        match next.prompts.iter().position(|p| normalize(&p.text) == needle) {
            Some(i) => next.prompts[i] = prompt.clone(),
            None => next.prompts.push(prompt.clone()),
        }
        *guard = Arc::new(next);
        Ok(prompt)
    }

    /// Remove a prompt by text. Returns false if not present.
    pub fn remove(&self, text: &str) -> bool {
        let needle = normalize(text);
        let mut guard = self.write();
        let Some(i) = guard.prompts.iter().position(|p| normalize(&p.text) == needle) else {
            return false;
        };
        let mut next = StoreSnapshot::clone(&guard);
        next.prompts.remove(i);
        *guard = Arc::new(next);
        true
    }

    /// Set the global match threshold, silently clamped to [0, 1].
    pub fn set_threshold(&self, value: f32) {
        let value = value.clamp(0.0, 1.0);
        let mut guard = self.write();
        if guard.threshold == value {
            return;
        }
        let mut next = StoreSnapshot::clone(&guard);
        next.threshold = value;
        *guard = Arc::new(next);
    }

    /// Set the embedding prefix. Existing prompt vectors are not recomputed.
    pub fn set_text_prefix(&self, prefix: &str) {
        let mut guard = self.write();
        if guard.text_prefix == prefix {
            return;
        }
        let mut next = StoreSnapshot::clone(&guard);
        next.text_prefix = prefix.to_string();
        *guard = Arc::new(next);
    }

    /// Atomically replace the whole store state.
    pub fn replace(&self, snapshot: StoreSnapshot) {
        *self.write() = Arc::new(snapshot);
    }

    /// Serialize the full store state to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        persist::write_store(path, &self.snapshot())
    }

    /// Load the store from `path`, atomically swapping the prompt set.
    ///
    /// A missing file is seeded with an empty default store and yields zero
    /// prompts; malformed content also yields zero prompts, leaving the
    /// current state untouched. Neither is an error — only a real read
    /// failure on an existing file is.
    pub fn load(&self, path: &Path) -> Result<usize> {
        match persist::read_store(path)? {
            Some(snapshot) => {
                let count = snapshot.prompts.len();
                self.replace(snapshot);
                Ok(count)
            }
            None => Ok(0),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testutil::{test_store, FixedEncoder};
    use super::*;
    use std::thread;

    #[test]
    fn test_add_appends_in_insertion_order() {
        let store = test_store();
        store.add("cat", Polarity::Positive, None).unwrap();
        store.add("dog", Polarity::Positive, None).unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.prompts.len(), 2);
        assert_eq!(snap.prompts[0].text, "cat");
        assert_eq!(snap.prompts[1].text, "dog");
    }

    #[test]
    fn test_add_uses_text_prefix_for_embedding_only() {
        let store = test_store();
        store.set_text_prefix("A photo of a ");
        let prompt = store.add("cat", Polarity::Positive, None).unwrap();
        // Label stays bare; only the embedded string carries the prefix.
        assert_eq!(prompt.text, "cat");
        assert_eq!(prompt.vector, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_add_duplicate_text_replaces_in_place() {
        let store = test_store();
        store.add("cat", Polarity::Positive, None).unwrap();
        store.add("dog", Polarity::Positive, None).unwrap();
        store.add("  Cat ", Polarity::Negative, None).unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.prompts.len(), 2);
        assert_eq!(snap.prompts[0].text, "Cat");
        assert_eq!(snap.prompts[0].polarity, Polarity::Negative);
        assert_eq!(snap.prompts[1].text, "dog");
    }

    #[test]
    fn test_add_without_runtime_is_rejected() {
        let store = PromptStore::new(Some(FixedEncoder::unavailable()));
        let err = store.add("cat", Polarity::Positive, None).unwrap_err();
        assert!(matches!(err, ClipwatchError::EmbeddingUnavailable));
        assert!(!store.can_embed());

        let store = PromptStore::new(None);
        let err = store.add("cat", Polarity::Positive, None).unwrap_err();
        assert!(matches!(err, ClipwatchError::EmbeddingUnavailable));
    }

    #[test]
    fn test_remove() {
        let store = test_store();
        store.add("cat", Polarity::Positive, None).unwrap();
        assert!(store.remove("CAT "));
        assert!(!store.remove("cat"));
        assert!(store.snapshot().prompts.is_empty());
    }

    #[test]
    fn test_set_threshold_clamps_and_is_idempotent() {
        let store = test_store();
        store.set_threshold(1.7);
        assert_eq!(store.snapshot().threshold, 1.0);
        store.set_threshold(-0.3);
        assert_eq!(store.snapshot().threshold, 0.0);

        store.set_threshold(0.42);
        let first = store.snapshot();
        store.set_threshold(0.42);
        assert_eq!(*store.snapshot(), *first);
    }

    #[test]
    fn test_prefix_change_does_not_reembed_existing_prompts() {
        let store = test_store();
        let before = store.add("cat", Polarity::Positive, None).unwrap();
        store.set_text_prefix("A drawing of ");
        let snap = store.snapshot();
        assert_eq!(snap.prompts[0].vector, before.vector);
        assert_eq!(snap.text_prefix, "A drawing of ");
    }

    #[test]
    fn test_snapshot_is_stable_across_mutation() {
        let store = test_store();
        store.add("cat", Polarity::Positive, None).unwrap();
        let snap = store.snapshot();

        store.add("dog", Polarity::Positive, None).unwrap();
        store.set_threshold(0.9);

        assert_eq!(snap.prompts.len(), 1);
        assert_eq!(snap.threshold, DEFAULT_THRESHOLD);
        assert_eq!(store.snapshot().prompts.len(), 2);
    }

    #[test]
    fn test_concurrent_snapshots_see_consistent_state() {
        let store = Arc::new(test_store());
        store.add("cat", Polarity::Positive, None).unwrap();
        store.add("dog", Polarity::Positive, None).unwrap();

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..500 {
                    store.add("bird", Polarity::Positive, None).unwrap();
                    store.remove("bird");
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let snap = store.snapshot();
                        // Either before or after the flicker, never torn.
                        assert!(snap.prompts.len() == 2 || snap.prompts.len() == 3);
                        assert_eq!(snap.prompts[0].text, "cat");
                        assert_eq!(snap.prompts[1].text, "dog");
                        for p in &snap.prompts {
                            assert_eq!(p.vector.len(), 3);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
    }
}
