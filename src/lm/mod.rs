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

//! # Language Model Module
//!
//! Candidate-word prediction for masked positions.
//!
//! - [`selection`]: temperature, top-k/top-p filtering and sampling over a
//!   raw score vector
//! - [`family`]: special tokens and sub-word conventions per model family
//! - [`masked`]: the adapter that tokenizes text, runs a
//!   [`ZiMaskedLMModel`] and hands the mask position's scores to the selector
//! - [`pretrained`]: loading a pretrained ModernBERT through candle
//!   (feature `candle`)
//!
//! Augmenters only see the object-safe [`ZiLanguageModel`] trait, so any
//! backend can be plugged in behind an `Arc`.

pub mod family;
pub mod masked;
pub mod pretrained;
pub mod selection;

pub use family::ZiMaskedLMFamily;
pub use masked::{ZiMaskedLM, ZiMaskedLMConfig, ZiMaskedLMModel};
pub use pretrained::ZiPretrainedMaskedLM;
pub use selection::{
    ZiCandidate, ZiCandidateSelector, ZiScoreVector, ZiSelectionConfig, ZiSelectionMode,
};

use rand::RngCore;

use crate::errors::Result;

/// Contract shared by every candidate-predicting language model.
pub trait ZiLanguageModel: Send + Sync + std::fmt::Debug {
    /// Up to `n` candidates for the first mask token in `text`.
    ///
    /// `Ok(None)` means no vocabulary entry qualified. With `target_word`
    /// the result is that word's own score, or `None` when it is not in the
    /// vocabulary.
    fn predict(
        &self,
        text: &str,
        target_word: Option<&str>,
        n: usize,
    ) -> Result<Option<Vec<ZiCandidate>>>;

    /// Same as [`predict`](Self::predict) but draws from the caller's generator.
    fn predict_with_rng(
        &self,
        text: &str,
        target_word: Option<&str>,
        n: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Vec<ZiCandidate>>>;

    /// Vocabulary token for `id`.
    fn id2token(&self, id: u32) -> Option<String>;

    /// Whether `token` must never be offered as a candidate.
    fn is_skip_candidate(&self, token: &str) -> bool;

    /// Placeholder the caller puts where a prediction is wanted.
    fn mask_token(&self) -> &str;
}
