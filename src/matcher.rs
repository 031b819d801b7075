//! Similarity scoring over a store snapshot.
//!
//! Runs on the per-frame path: every call takes one snapshot, then scores
//! lock-free. Malformed input (empty embedding, dimension mismatch) degrades
//! to an empty result set so the frame loop never stalls on an error.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;

use crate::store::{Polarity, Prompt, PromptStore, StoreSnapshot};

/// One qualifying prompt (or ensemble) for an embedding, ranked by score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub label: String,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
}

/// Scores incoming image embeddings against the live prompt registry.
pub struct Matcher {
    store: Arc<PromptStore>,
    negative_margin: f32,
}

impl Matcher {
    pub fn new(store: Arc<PromptStore>) -> Self {
        Self {
            store,
            negative_margin: 0.0,
        }
    }

    /// Require positives to beat the best qualifying negative by this much.
    pub fn with_negative_margin(mut self, margin: f32) -> Self {
        self.negative_margin = margin;
        self
    }

    /// Rank all qualifying positive prompts for one image embedding.
    /// Safe to call concurrently with store edits; no lock is held while
    /// scoring.
    pub fn match_embedding(&self, embedding: &[f32]) -> Vec<MatchResult> {
        match_against(&self.store.snapshot(), embedding, self.negative_margin)
    }
}

struct Group<'a> {
    label: &'a str,
    vector: Vec<f32>,
    negative: bool,
    /// Insertion index of the first member, for deterministic tie-breaking.
    order: usize,
}

/// Collapse ensemble members into effective candidates: mean vector, and
/// negative polarity if any member is negative.
fn group_prompts(prompts: &[Prompt]) -> Vec<Group<'_>> {
    let mut groups: Vec<Group<'_>> = Vec::new();
    for (order, prompt) in prompts.iter().enumerate() {
        let existing = prompt.ensemble_key.as_deref().and_then(|key| {
            groups
                .iter()
                .position(|g| prompts[g.order].ensemble_key.as_deref() == Some(key))
        });
        match existing {
            Some(i) => {
                let group = &mut groups[i];
                if group.vector.len() == prompt.vector.len() {
                    for (acc, v) in group.vector.iter_mut().zip(&prompt.vector) {
                        *acc += v;
                    }
                }
                group.negative |= prompt.polarity.is_negative();
            }
            None => groups.push(Group {
                label: &prompt.text,
                vector: prompt.vector.clone(),
                negative: prompt.polarity.is_negative(),
                order,
            }),
        }
    }
    // Summed vectors need no explicit mean: cosine is scale-invariant.
    groups
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(dot / (norm_a * norm_b))
}

/// Pure scoring procedure behind [`Matcher::match_embedding`].
pub fn match_against(
    snapshot: &StoreSnapshot,
    embedding: &[f32],
    negative_margin: f32,
) -> Vec<MatchResult> {
    if embedding.is_empty() || snapshot.prompts.is_empty() {
        return Vec::new();
    }

    struct Scored<'a> {
        group: Group<'a>,
        score: f32,
    }

    let qualifying: Vec<Scored<'_>> = group_prompts(&snapshot.prompts)
        .into_iter()
        .filter_map(|group| {
            let score = cosine_similarity(embedding, &group.vector)?;
            (score >= snapshot.threshold).then_some(Scored { group, score })
        })
        .collect();

    // Negatives are suppressors, never candidates: any positive that does
    // not clear the best qualifying negative by the margin is dropped.
    let best_negative = qualifying
        .iter()
        .filter(|s| s.group.negative)
        .map(|s| s.score)
        .fold(None, |best: Option<f32>, score| {
            Some(best.map_or(score, |b| b.max(score)))
        });

    let mut results: Vec<(usize, MatchResult)> = qualifying
        .into_iter()
        .filter(|s| !s.group.negative)
        .filter(|s| match best_negative {
            Some(neg) => s.score > neg + negative_margin,
            None => true,
        })
        .map(|s| {
            (
                s.group.order,
                MatchResult {
                    label: s.group.label.to_string(),
                    score: s.score,
                },
            )
        })
        .collect();

    results.sort_by(|(ord_a, a), (ord_b, b)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(ord_a.cmp(ord_b))
    });
    results.into_iter().map(|(_, r)| r).collect()
}
