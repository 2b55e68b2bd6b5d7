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

//! # Masked Language Model Adapter
//!
//! [`ZiMaskedLM`] turns "text with a mask placeholder" into candidate words.
//! Per call it:
//!
//! 1. tokenizes the text and wraps it in the family's start/separator tokens,
//! 2. locates the first mask token,
//! 3. runs the [`ZiMaskedLMModel`] over the whole sequence,
//! 4. passes the score vector at the mask position to the
//!    [`ZiCandidateSelector`],
//! 5. rewrites the selected tokens into their surface form.
//!
//! The adapter holds no mutable state. Randomness comes from a generator
//! created per call (see [`ZiMaskedLMConfig::seed`]).

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::errors::{Result, ZiError};
use crate::lm::family::ZiMaskedLMFamily;
use crate::lm::selection::{ZiCandidate, ZiCandidateSelector, ZiScoreVector, ZiSelectionConfig};
use crate::lm::ZiLanguageModel;
use crate::tokenizer::words::is_alphanumeric_word;
use crate::tokenizer::ZiTokenizer;

/// Inference backend: token ids and attention mask in, one score vector per
/// input position out.
pub trait ZiMaskedLMModel: Send + Sync {
    fn forward(&self, input_ids: &[u32], attention_mask: &[u32]) -> Result<Vec<ZiScoreVector>>;
}

impl<M: ZiMaskedLMModel + ?Sized> ZiMaskedLMModel for Box<M> {
    fn forward(&self, input_ids: &[u32], attention_mask: &[u32]) -> Result<Vec<ZiScoreVector>> {
        (**self).forward(input_ids, attention_mask)
    }
}

impl<M: ZiMaskedLMModel + ?Sized> ZiMaskedLMModel for Arc<M> {
    fn forward(&self, input_ids: &[u32], attention_mask: &[u32]) -> Result<Vec<ZiScoreVector>> {
        (**self).forward(input_ids, attention_mask)
    }
}

/// Adapter configuration, immutable after construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZiMaskedLMConfig {
    pub family: ZiMaskedLMFamily,
    pub selection: ZiSelectionConfig,
    /// Offer sub-word continuation pieces as candidates.
    pub allow_subwords: bool,
    /// Offer punctuation tokens as candidates.
    pub include_punctuation: bool,
    /// When set, every call draws from a generator seeded with this value
    /// mixed with the input text. Otherwise each call uses fresh entropy.
    pub seed: Option<u64>,
}

impl Default for ZiMaskedLMConfig {
    fn default() -> Self {
        Self {
            family: ZiMaskedLMFamily::default(),
            selection: ZiSelectionConfig::default(),
            allow_subwords: false,
            include_punctuation: false,
            seed: None,
        }
    }
}

/// Masked language model adapter over a tokenizer `T` and model `M`.
pub struct ZiMaskedLM<T, M> {
    tokenizer: T,
    model: M,
    config: ZiMaskedLMConfig,
    selector: ZiCandidateSelector,
}

impl<T: ZiTokenizer, M> std::fmt::Debug for ZiMaskedLM<T, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZiMaskedLM")
            .field("family", &self.config.family)
            .field("vocab_size", &self.tokenizer.len())
            .field("selection", self.selector.config())
            .finish()
    }
}

impl<T: ZiTokenizer, M: ZiMaskedLMModel> ZiMaskedLM<T, M> {
    /// Builds an adapter. Fails on malformed selection settings or when the
    /// tokenizer lacks the family's start, separator or mask token.
    pub fn new(tokenizer: T, model: M, config: ZiMaskedLMConfig) -> Result<Self> {
        let selector = ZiCandidateSelector::new(config.selection.clone())?;

        let family = config.family;
        for special in [
            family.start_token(),
            family.separator_token(),
            family.mask_token(),
        ] {
            if tokenizer.id(special).is_none() {
                return Err(ZiError::configuration(format!(
                    "vocabulary has no '{special}' token required by {family:?}"
                )));
            }
        }

        Ok(Self {
            tokenizer,
            model,
            config,
            selector,
        })
    }

    pub fn config(&self) -> &ZiMaskedLMConfig {
        &self.config
    }

    pub fn family(&self) -> ZiMaskedLMFamily {
        self.config.family
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Candidates for the first mask token, drawn from `rng`.
    pub fn predict_using<R: Rng + ?Sized>(
        &self,
        text: &str,
        target_word: Option<&str>,
        n: usize,
        rng: &mut R,
    ) -> Result<Option<Vec<ZiCandidate>>> {
        if n == 0 {
            return Err(ZiError::validation("n must be at least 1"));
        }

        let (input_ids, mask_position) = self.encode(text)?;
        let attention_mask = vec![1u32; input_ids.len()];

        let outputs = self.model.forward(&input_ids, &attention_mask)?;
        let scores = outputs.get(mask_position).ok_or_else(|| {
            ZiError::inference(format!(
                "model returned {} positions for {} input tokens",
                outputs.len(),
                input_ids.len()
            ))
        })?;
        if scores.len() != self.tokenizer.len() {
            log::debug!(
                "score vector has {} entries, vocabulary has {}",
                scores.len(),
                self.tokenizer.len()
            );
        }

        let family = self.config.family;
        let skip = |token: &str| self.is_skip_candidate(token);

        let selected = match target_word {
            Some(word) => family.vocabulary_forms(word).iter().find_map(|form| {
                self.selector
                    .select(scores, &self.tokenizer, Some(form.as_str()), n, &skip, &mut *rng)
            }),
            None => self
                .selector
                .select(scores, &self.tokenizer, None, n, &skip, &mut *rng),
        };

        let Some(mut candidates) = selected else {
            log::debug!("no candidate for '{text}'");
            return Ok(None);
        };
        for candidate in &mut candidates {
            candidate.token = family.surface(&candidate.token).to_string();
        }
        Ok(Some(candidates))
    }

    /// Token ids with start/separator markers and the mask's position.
    fn encode(&self, text: &str) -> Result<(Vec<u32>, usize)> {
        let family = self.config.family;
        let mut tokens = Vec::new();
        tokens.push(family.start_token().to_string());
        tokens.extend(self.tokenizer.tokenize(text)?);
        tokens.push(family.separator_token().to_string());

        let mask_position = tokens
            .iter()
            .position(|token| token == family.mask_token())
            .ok_or_else(|| {
                ZiError::validation(format!(
                    "text contains no '{}' token",
                    family.mask_token()
                ))
            })?;

        let input_ids = self.tokenizer.convert_tokens_to_ids(&tokens)?;
        Ok((input_ids, mask_position))
    }

    fn call_rng(&self, text: &str) -> SmallRng {
        match self.config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed ^ xxh3_64(text.as_bytes())),
            None => SmallRng::from_entropy(),
        }
    }
}

impl<T: ZiTokenizer, M: ZiMaskedLMModel> ZiLanguageModel for ZiMaskedLM<T, M> {
    fn predict(
        &self,
        text: &str,
        target_word: Option<&str>,
        n: usize,
    ) -> Result<Option<Vec<ZiCandidate>>> {
        let mut rng = self.call_rng(text);
        self.predict_using(text, target_word, n, &mut rng)
    }

    fn predict_with_rng(
        &self,
        text: &str,
        target_word: Option<&str>,
        n: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Vec<ZiCandidate>>> {
        self.predict_using(text, target_word, n, rng)
    }

    fn id2token(&self, id: u32) -> Option<String> {
        self.tokenizer.token(id)
    }

    fn is_skip_candidate(&self, token: &str) -> bool {
        let family = self.config.family;
        if family.is_unusable(token) {
            return true;
        }
        if !self.config.allow_subwords && family.is_continuation(token) {
            return true;
        }
        let surface = family.surface(token);
        let surface = surface.strip_prefix("##").unwrap_or(surface);
        !self.config.include_punctuation && !is_alphanumeric_word(surface)
    }

    fn mask_token(&self) -> &str {
        self.config.family.mask_token()
    }
}
