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

use std::collections::HashSet;

use rand::rngs::SmallRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, ZiError};
use crate::operator::ZiOperator;
use crate::operators::field::ZiFieldPath;
use crate::record::ZiRecordBatch;
use crate::tokenizer::{join_words, split_words};

const RANDOM_WORD: &str = "augment.random_word";
const DEFAULT_RANDOM_WORD_SEED: u64 = 0x1bad_b002;

/// Number of words to augment: `ceil(aug_p * size)` clamped to
/// `[aug_min, aug_max]` and never more than `size`.
pub(crate) fn augment_count(
    size: usize,
    aug_p: f64,
    aug_min: usize,
    aug_max: Option<usize>,
) -> usize {
    if size == 0 {
        return 0;
    }
    let mut count = (aug_p * size as f64).ceil() as usize;
    count = count.max(aug_min);
    if let Some(max) = aug_max {
        count = count.min(max);
    }
    count.min(size)
}

pub(crate) fn validate_rate(
    operator: &str,
    aug_p: f64,
    aug_min: usize,
    aug_max: Option<usize>,
) -> Result<()> {
    if !(0.0..=1.0).contains(&aug_p) {
        return Err(ZiError::configuration(format!(
            "{operator} 'aug_p' must be in [0,1], got {aug_p}"
        )));
    }
    if let Some(max) = aug_max {
        if max < aug_min {
            return Err(ZiError::configuration(format!(
                "{operator} 'aug_max' ({max}) is below 'aug_min' ({aug_min})"
            )));
        }
    }
    Ok(())
}

/// Stopword and target-word rules shared by the word-level augmenters.
#[derive(Debug, Clone, Default)]
pub(crate) struct ZiWordRules {
    stopwords: HashSet<String>,
    targets: HashSet<String>,
}

impl ZiWordRules {
    pub(crate) fn new(stopwords: &[String], targets: &[String]) -> Self {
        Self {
            stopwords: stopwords.iter().map(|w| w.to_lowercase()).collect(),
            targets: targets.iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Positions that may be augmented. When target words are configured,
    /// exactly their occurrences qualify.
    pub(crate) fn eligible(&self, words: &[String], extra: impl Fn(&str) -> bool) -> Vec<usize> {
        words
            .iter()
            .enumerate()
            .filter(|(_, word)| {
                let lowered = word.to_lowercase();
                if self.stopwords.contains(&lowered) || !extra(word.as_str()) {
                    return false;
                }
                self.targets.is_empty() || self.targets.contains(&lowered)
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    pub(crate) fn has_targets(&self) -> bool {
        !self.targets.is_empty()
    }
}

/// Picks `count` of the eligible positions (all of them in target-word
/// mode), returned in ascending order.
pub(crate) fn choose_positions<R: Rng + ?Sized>(
    rules: &ZiWordRules,
    eligible: &[usize],
    count: usize,
    rng: &mut R,
) -> Vec<usize> {
    if rules.has_targets() {
        return eligible.to_vec();
    }
    let amount = count.min(eligible.len());
    let mut picked: Vec<usize> = index::sample(rng, eligible.len(), amount)
        .into_iter()
        .map(|i| eligible[i])
        .collect();
    picked.sort_unstable();
    picked
}

/// Edit applied by [`ZiAugmentRandomWord`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZiRandomWordAction {
    /// Exchange a word with one of its neighbours.
    Swap,
    #[default]
    Delete,
    /// Replace a word with one of `target_words`.
    Substitute,
    /// Remove one contiguous span of words.
    Crop,
}

impl ZiRandomWordAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Swap => "swap",
            Self::Delete => "delete",
            Self::Substitute => "substitute",
            Self::Crop => "crop",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZiRandomWordConfig {
    pub action: ZiRandomWordAction,
    pub aug_p: f64,
    pub aug_min: usize,
    pub aug_max: Option<usize>,
    pub stopwords: Vec<String>,
    /// Restrict augmentation to every occurrence of these words.
    pub words: Vec<String>,
    /// Replacement pool for `substitute`.
    pub target_words: Vec<String>,
    pub seed: u64,
}

impl Default for ZiRandomWordConfig {
    fn default() -> Self {
        Self {
            action: ZiRandomWordAction::default(),
            aug_p: 0.3,
            aug_min: 1,
            aug_max: Some(10),
            stopwords: Vec::new(),
            words: Vec::new(),
            target_words: Vec::new(),
            seed: DEFAULT_RANDOM_WORD_SEED,
        }
    }
}

impl ZiRandomWordConfig {
    pub fn validate(&self) -> Result<()> {
        validate_rate(RANDOM_WORD, self.aug_p, self.aug_min, self.aug_max)?;
        if self.action == ZiRandomWordAction::Substitute && self.target_words.is_empty() {
            return Err(ZiError::configuration(
                "augment.random_word 'substitute' requires non-empty 'target_words'",
            ));
        }
        Ok(())
    }
}

/// Rule-based word augmenter: swap, delete, substitute or crop words.
#[derive(Debug)]
pub struct ZiAugmentRandomWord {
    path: ZiFieldPath,
    config: ZiRandomWordConfig,
    rules: ZiWordRules,
}

impl ZiAugmentRandomWord {
    #[allow(non_snake_case)]
    pub fn new(path: ZiFieldPath, config: ZiRandomWordConfig) -> Result<Self> {
        config.validate()?;
        let rules = ZiWordRules::new(&config.stopwords, &config.words);
        Ok(Self {
            path,
            config,
            rules,
        })
    }

    pub fn config(&self) -> &ZiRandomWordConfig {
        &self.config
    }

    /// Augments a single text with the caller's generator.
    pub fn augment_text<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> String {
        let mut words = split_words(text);
        let eligible = self.rules.eligible(&words, |_| true);
        if eligible.is_empty() {
            return text.to_string();
        }
        let count = augment_count(
            words.len(),
            self.config.aug_p,
            self.config.aug_min,
            self.config.aug_max,
        );

        match self.config.action {
            ZiRandomWordAction::Swap => {
                let positions = choose_positions(&self.rules, &eligible, count, &mut *rng);
                swap_words(&mut words, &positions, &mut *rng);
            }
            ZiRandomWordAction::Delete => {
                let mut positions =
                    choose_positions(&self.rules, &eligible, count, &mut *rng);
                if positions.len() >= words.len() {
                    let keep = rng.gen_range(0..positions.len());
                    positions.remove(keep);
                }
                for idx in positions.into_iter().rev() {
                    words.remove(idx);
                }
            }
            ZiRandomWordAction::Substitute => {
                for idx in choose_positions(&self.rules, &eligible, count, &mut *rng) {
                    if let Some(replacement) = self.config.target_words.choose(&mut *rng) {
                        words[idx] = replacement.clone();
                    }
                }
            }
            ZiRandomWordAction::Crop => {
                if let Some(span) = crop_span(&eligible, count.min(words.len() - 1), &mut *rng) {
                    words.drain(span);
                }
            }
        }

        join_words(&words)
    }
}

/// Swaps every position with a neighbour. An adjacent pair is swapped at
/// most once, and neighbours holding the same word are avoided.
fn swap_words<R: Rng + ?Sized>(words: &mut [String], positions: &[usize], rng: &mut R) {
    let mut used: HashSet<usize> = HashSet::new();
    for &idx in positions {
        let neighbours: Vec<usize> = [idx.checked_sub(1), Some(idx + 1)]
            .into_iter()
            .flatten()
            .filter(|&other| other < words.len())
            .filter(|&other| !used.contains(&idx.min(other)))
            .filter(|&other| words[other] != words[idx])
            .collect();
        if let Some(&other) = neighbours.choose(&mut *rng) {
            words.swap(idx, other);
            used.insert(idx.min(other));
        }
    }
}

/// Longest contiguous run of eligible positions, capped at `count`, placed
/// at a random start within that run.
fn crop_span<R: Rng + ?Sized>(
    eligible: &[usize],
    count: usize,
    rng: &mut R,
) -> Option<std::ops::Range<usize>> {
    if count == 0 || eligible.is_empty() {
        return None;
    }

    let mut runs: Vec<(usize, usize)> = Vec::new();
    for &idx in eligible {
        match runs.last_mut() {
            Some((start, len)) if *start + *len == idx => *len += 1,
            _ => runs.push((idx, 1)),
        }
    }

    let width = runs
        .iter()
        .map(|&(_, len)| len)
        .max()
        .unwrap_or(0)
        .min(count);
    let starts: Vec<usize> = runs
        .iter()
        .filter(|&&(_, len)| len >= width)
        .flat_map(|&(start, len)| start..=start + len - width)
        .collect();
    let start = *starts.choose(rng)?;
    Some(start..start + width)
}

impl ZiOperator for ZiAugmentRandomWord {
    fn name(&self) -> &'static str {
        RANDOM_WORD
    }

    fn apply(&self, mut batch: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let mut rng = SmallRng::seed_from_u64(self.config.seed);
        for record in &mut batch {
            let Some(text) = self.path.resolve_str(record) else {
                continue;
            };
            let augmented = self.augment_text(text, &mut rng);
            if augmented != text && self.path.set_value(record, Value::String(augmented)) {
                record.mark_augmented(RANDOM_WORD);
            }
        }
        Ok(batch)
    }
}

pub(crate) fn required_path(operator: &str, config: &Value) -> Result<ZiFieldPath> {
    let obj = config
        .as_object()
        .ok_or_else(|| ZiError::validation(format!("{operator} config must be object")))?;
    let path = obj
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| ZiError::validation(format!("{operator} requires string 'path'")))?;
    ZiFieldPath::parse(path)
}

#[allow(non_snake_case)]
pub fn augment_random_word_factory(config: &Value) -> Result<Box<dyn ZiOperator + Send + Sync>> {
    let path = required_path(RANDOM_WORD, config)?;
    let settings: ZiRandomWordConfig = serde_json::from_value(config.clone())
        .map_err(|err| ZiError::validation(format!("{RANDOM_WORD}: {err}")))?;
    Ok(Box::new(ZiAugmentRandomWord::new(path, settings)?))
}
