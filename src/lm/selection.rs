//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of ZiAug.
//! The ZiAug project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Candidate Selection
//!
//! Turns the raw score vector a masked language model produces for one
//! position into a short list of candidate tokens.
//!
//! ## Order of operations
//!
//! 1. Temperature: every score is divided by `temperature`.
//! 2. Top-k: keep the `top_k` highest scores, ties resolved by vocabulary order.
//! 3. Top-p: softmax over what is left, keep the shortest descending prefix
//!    whose mass reaches `top_p` (never fewer than one entry).
//! 4. Skip predicate: drop tokens the caller cannot use, e.g. sub-word
//!    continuation pieces.
//! 5. Sample (weighted, without replacement) or rank `n` distinct candidates.
//!
//! An explicit target word bypasses steps 2–5 and reports that word's score.
//! Scores that are not finite never become candidates.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ZiError};
use crate::tokenizer::ZiVocabulary;

/// One score per vocabulary entry for a single masked position.
pub type ZiScoreVector = Vec<f32>;

/// How the final `n` candidates are drawn from the filtered distribution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZiSelectionMode {
    /// Weighted draw without replacement.
    #[default]
    Sample,
    /// Highest scores first; deterministic.
    Rank,
}

/// Filtering and sampling settings, validated once at construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZiSelectionConfig {
    pub temperature: f32,
    pub top_k: Option<usize>,
    pub top_p: Option<f32>,
    pub mode: ZiSelectionMode,
}

impl Default for ZiSelectionConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_k: None,
            top_p: None,
            mode: ZiSelectionMode::Sample,
        }
    }
}

impl ZiSelectionConfig {
    /// Checks temperature, top-k and top-p ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(ZiError::configuration(format!(
                "temperature must be a positive number, got {}",
                self.temperature
            )));
        }
        if self.top_k == Some(0) {
            return Err(ZiError::configuration("top_k must be positive"));
        }
        if let Some(p) = self.top_p {
            if !(p > 0.0 && p <= 1.0) {
                return Err(ZiError::configuration(format!(
                    "top_p must be in (0, 1], got {p}"
                )));
            }
        }
        Ok(())
    }
}

/// A token proposed for the masked position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZiCandidate {
    /// Vocabulary id.
    pub id: u32,
    /// Token text. The adapter rewrites it to the surface form.
    pub token: String,
    /// Temperature-scaled score.
    pub score: f32,
    /// Softmax mass of the candidate within the distribution it came from.
    pub probability: f32,
}

/// Applies temperature, top-k/top-p truncation and sampling to score vectors.
#[derive(Clone, Debug)]
pub struct ZiCandidateSelector {
    config: ZiSelectionConfig,
}

impl ZiCandidateSelector {
    /// Builds a selector, rejecting malformed configuration.
    pub fn new(config: ZiSelectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ZiSelectionConfig {
        &self.config
    }

    /// Selects up to `n` candidates from `scores`.
    ///
    /// Returns `None` when nothing qualifies: every entry was filtered or
    /// skipped, the target word is not in the vocabulary, or `n` is zero.
    pub fn select<V, R>(
        &self,
        scores: &[f32],
        vocabulary: &V,
        target_word: Option<&str>,
        n: usize,
        skip: &dyn Fn(&str) -> bool,
        rng: &mut R,
    ) -> Option<Vec<ZiCandidate>>
    where
        V: ZiVocabulary + ?Sized,
        R: Rng + ?Sized,
    {
        if n == 0 || scores.is_empty() {
            return None;
        }

        let scaled = apply_temperature(scores, self.config.temperature);

        if let Some(word) = target_word {
            return lookup(&scaled, vocabulary, word).map(|candidate| vec![candidate]);
        }

        let kept: Vec<(u32, String, f32)> = self
            .filter(&scaled)
            .into_iter()
            .filter_map(|idx| {
                let id = idx as u32;
                let token = vocabulary.token(id)?;
                if skip(&token) {
                    None
                } else {
                    Some((id, token, scaled[idx]))
                }
            })
            .collect();

        if kept.is_empty() {
            return None;
        }

        let kept_scores: Vec<f32> = kept.iter().map(|(_, _, score)| *score).collect();
        let probabilities = softmax(&kept_scores);

        let order: Vec<usize> = match self.config.mode {
            ZiSelectionMode::Rank => (0..kept.len()).collect(),
            ZiSelectionMode::Sample => weighted_order(&kept_scores, rng),
        };

        let mut slots: Vec<Option<(u32, String, f32)>> = kept.into_iter().map(Some).collect();
        let candidates = order
            .into_iter()
            .take(n)
            .filter_map(|pos| {
                let (id, token, score) = slots[pos].take()?;
                Some(ZiCandidate {
                    id,
                    token,
                    score,
                    probability: probabilities[pos],
                })
            })
            .collect();

        Some(candidates)
    }

    /// Indices retained by top-k and top-p, highest scaled score first.
    pub fn filter(&self, scaled: &[f32]) -> Vec<usize> {
        let mut order = descending_order(scaled);

        if let Some(k) = self.config.top_k {
            order.truncate(k);
        }

        if let Some(p) = self.config.top_p {
            let sorted: Vec<f32> = order.iter().map(|&idx| scaled[idx]).collect();
            order.truncate(top_p_len(&sorted, p));
        }

        order
    }
}

fn lookup<V>(scaled: &[f32], vocabulary: &V, word: &str) -> Option<ZiCandidate>
where
    V: ZiVocabulary + ?Sized,
{
    let id = vocabulary.id(word)?;
    let score = *scaled.get(id as usize)?;
    let probability = softmax(scaled)[id as usize];
    Some(ZiCandidate {
        id,
        token: word.to_string(),
        score,
        probability,
    })
}

/// Divides every score by `temperature`; non-finite scores become `-inf`.
/// Finite scores stay finite: results beyond the `f32` range saturate at
/// `f32::MAX` / `f32::MIN`.
pub fn apply_temperature(scores: &[f32], temperature: f32) -> Vec<f32> {
    scores
        .iter()
        .map(|&score| {
            if score.is_finite() {
                (score as f64 / temperature as f64).clamp(f32::MIN as f64, f32::MAX as f64)
                    as f32
            } else {
                f32::NEG_INFINITY
            }
        })
        .collect()
}

/// Numerically stable softmax. Non-finite entries get zero mass.
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![0.0; scores.len()];
    }

    let exps: Vec<f32> = scores
        .iter()
        .map(|&s| if s.is_finite() { (s - max).exp() } else { 0.0 })
        .collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Indices of finite scores sorted by score, descending. Equal scores keep
/// vocabulary order.
pub fn descending_order(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len())
        .filter(|&idx| scores[idx].is_finite())
        .collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

/// Length of the shortest prefix of `sorted` (descending scores) whose
/// softmax mass reaches `top_p`. At least one entry is kept.
pub fn top_p_len(sorted: &[f32], top_p: f32) -> usize {
    let probabilities = softmax(sorted);
    let mut cumulative = 0.0f32;
    for (idx, probability) in probabilities.iter().enumerate() {
        cumulative += probability;
        if cumulative >= top_p {
            return idx + 1;
        }
    }
    sorted.len()
}

/// Weighted order without replacement over log-weights (scaled scores).
/// Each position gets the Gumbel-perturbed key `score - ln(-ln u)` for a
/// uniform `u`, and positions are visited by key, largest first. Keys stay
/// in log space, so tail entries whose probability underflows still draw
/// random keys. Non-finite scores come last in their original order.
fn weighted_order<R: Rng + ?Sized>(scores: &[f32], rng: &mut R) -> Vec<usize> {
    let mut keyed: Vec<(f64, usize)> = scores
        .iter()
        .enumerate()
        .map(|(idx, &score)| {
            let unit: f64 = 1.0 - rng.gen::<f64>();
            let key = if score.is_finite() {
                score as f64 - (-unit.ln()).max(f64::MIN_POSITIVE).ln()
            } else {
                f64::NEG_INFINITY
            };
            (key, idx)
        })
        .collect();
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    keyed.into_iter().map(|(_, idx)| idx).collect()
}
