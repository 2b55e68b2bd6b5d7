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

//! # Contextual Word Augmentation
//!
//! Substitutes or inserts words using a masked language model: the chosen
//! word (or the gap before it) is replaced with the model's mask token and
//! the model's candidate fills it in.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, ZiError};
use crate::lm::{ZiLanguageModel, ZiMaskedLMConfig, ZiMaskedLMFamily, ZiPretrainedMaskedLM};
use crate::operator::ZiOperator;
use crate::operators::augment::{
    augment_count, choose_positions, required_path, validate_rate, ZiWordRules,
};
use crate::operators::field::ZiFieldPath;
use crate::record::{ZiRecord, ZiRecordBatch};
use crate::tokenizer::words::is_alphanumeric_word;
use crate::tokenizer::{join_words, split_words};

const CONTEXT_WORD: &str = "augment.context_word";
const DEFAULT_CONTEXT_WORD_SEED: u64 = 0x5eed_c0de;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZiContextWordAction {
    #[default]
    Substitute,
    Insert,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZiContextWordConfig {
    pub action: ZiContextWordAction,
    pub aug_p: f64,
    pub aug_min: usize,
    pub aug_max: Option<usize>,
    pub stopwords: Vec<String>,
    /// Candidates requested from the model per position.
    pub candidates: usize,
    pub seed: u64,
}

impl Default for ZiContextWordConfig {
    fn default() -> Self {
        Self {
            action: ZiContextWordAction::default(),
            aug_p: 0.3,
            aug_min: 1,
            aug_max: Some(10),
            stopwords: Vec::new(),
            candidates: 5,
            seed: DEFAULT_CONTEXT_WORD_SEED,
        }
    }
}

impl ZiContextWordConfig {
    pub fn validate(&self) -> Result<()> {
        validate_rate(CONTEXT_WORD, self.aug_p, self.aug_min, self.aug_max)?;
        if self.candidates == 0 {
            return Err(ZiError::configuration(
                "augment.context_word 'candidates' must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Language-model driven word substitution and insertion.
///
/// Records are independent: each one gets its own generator seeded from
/// the configured seed and the record's position in the batch, so results
/// do not depend on whether the batch is processed in parallel.
#[derive(Debug)]
pub struct ZiAugmentContextWord {
    path: ZiFieldPath,
    model: Arc<dyn ZiLanguageModel>,
    config: ZiContextWordConfig,
    rules: ZiWordRules,
}

impl ZiAugmentContextWord {
    #[allow(non_snake_case)]
    pub fn new(
        path: ZiFieldPath,
        model: Arc<dyn ZiLanguageModel>,
        config: ZiContextWordConfig,
    ) -> Result<Self> {
        config.validate()?;
        let rules = ZiWordRules::new(&config.stopwords, &[]);
        Ok(Self {
            path,
            model,
            config,
            rules,
        })
    }

    pub fn config(&self) -> &ZiContextWordConfig {
        &self.config
    }

    /// Augments a single text with the caller's generator.
    pub fn augment_text(&self, text: &str, rng: &mut dyn RngCore) -> Result<String> {
        let mut words = split_words(text);
        let eligible = self.rules.eligible(&words, is_alphanumeric_word);
        let count = augment_count(
            words.len(),
            self.config.aug_p,
            self.config.aug_min,
            self.config.aug_max,
        );
        let positions = choose_positions(&self.rules, &eligible, count, &mut *rng);
        if positions.is_empty() {
            return Ok(text.to_string());
        }

        let mask = self.model.mask_token().to_string();
        match self.config.action {
            ZiContextWordAction::Substitute => {
                for idx in positions {
                    let original = std::mem::replace(&mut words[idx], mask.clone());
                    let masked = join_words(&words);
                    words[idx] = self
                        .fill(&masked, Some(&original), rng)?
                        .unwrap_or(original);
                }
            }
            ZiContextWordAction::Insert => {
                for idx in positions.into_iter().rev() {
                    words.insert(idx, mask.clone());
                    let masked = join_words(&words);
                    match self.fill(&masked, None, rng)? {
                        Some(word) => words[idx] = word,
                        None => {
                            words.remove(idx);
                        }
                    }
                }
            }
        }

        Ok(join_words(&words))
    }

    /// Best candidate for the mask in `masked` that differs from `original`.
    fn fill(
        &self,
        masked: &str,
        original: Option<&str>,
        rng: &mut dyn RngCore,
    ) -> Result<Option<String>> {
        let candidates = self
            .model
            .predict_with_rng(masked, None, self.config.candidates, rng)?
            .unwrap_or_default();
        let chosen = candidates
            .into_iter()
            .map(|candidate| candidate.token)
            .find(|token| {
                original.map_or(true, |word| token.to_lowercase() != word.to_lowercase())
            });
        if chosen.is_none() {
            log::warn!("no usable candidate for '{masked}'");
        }
        Ok(chosen)
    }

    fn augment_record(&self, index: usize, record: &mut ZiRecord) -> Result<()> {
        let Some(text) = self.path.resolve_str(record) else {
            return Ok(());
        };
        let mut rng = SmallRng::seed_from_u64(self.config.seed.wrapping_add(index as u64));
        let augmented = self.augment_text(text, &mut rng)?;
        if augmented != text && self.path.set_value(record, Value::String(augmented)) {
            record.mark_augmented(CONTEXT_WORD);
        }
        Ok(())
    }
}

impl ZiOperator for ZiAugmentContextWord {
    fn name(&self) -> &'static str {
        CONTEXT_WORD
    }

    fn apply(&self, mut batch: ZiRecordBatch) -> Result<ZiRecordBatch> {
        log::debug!("{CONTEXT_WORD}: augmenting {} records", batch.len());

        #[cfg(feature = "parallel")]
        batch
            .par_iter_mut()
            .enumerate()
            .try_for_each(|(index, record)| self.augment_record(index, record))?;

        #[cfg(not(feature = "parallel"))]
        batch
            .iter_mut()
            .enumerate()
            .try_for_each(|(index, record)| self.augment_record(index, record))?;

        Ok(batch)
    }
}

/// Builds the operator around an already loaded model.
#[allow(non_snake_case)]
pub fn context_word_with_model(
    model: Arc<dyn ZiLanguageModel>,
    config: &Value,
) -> Result<Box<dyn ZiOperator + Send + Sync>> {
    let path = required_path(CONTEXT_WORD, config)?;
    let settings: ZiContextWordConfig = serde_json::from_value(config.clone())
        .map_err(|err| ZiError::validation(format!("{CONTEXT_WORD}: {err}")))?;
    Ok(Box::new(ZiAugmentContextWord::new(path, model, settings)?))
}

/// Model settings read from an `augment.context_word` step.
struct ZiModelRequest {
    model_path: String,
    config: ZiMaskedLMConfig,
    silence: bool,
}

impl ZiModelRequest {
    /// Reads `model_path`, the optional `model` settings (family inferred from
    /// the path when omitted) and `silence` (default `true`).
    fn from_config(config: &Value) -> Result<Self> {
        let obj = config
            .as_object()
            .ok_or_else(|| ZiError::validation("augment.context_word config must be object"))?;
        let model_path = obj
            .get("model_path")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ZiError::validation("augment.context_word requires string 'model_path'")
            })?;
        let silence = obj.get("silence").and_then(Value::as_bool).unwrap_or(true);

        let model_value = obj.get("model").cloned().unwrap_or(Value::Null);
        let mut lm_config: ZiMaskedLMConfig = if model_value.is_null() {
            ZiMaskedLMConfig::default()
        } else {
            serde_json::from_value(model_value.clone())
                .map_err(|err| ZiError::validation(format!("{CONTEXT_WORD} 'model': {err}")))?
        };
        if model_value.get("family").is_none() {
            lm_config.family = ZiMaskedLMFamily::from_model_path(model_path)
                .unwrap_or(ZiMaskedLMFamily::ModernBert);
        }

        Ok(Self {
            model_path: model_path.to_string(),
            config: lm_config,
            silence,
        })
    }

    /// Identity of the loaded model. `silence` only affects logging.
    fn cache_key(&self) -> Result<String> {
        Ok(format!(
            "{}|{}",
            self.model_path,
            serde_json::to_string(&self.config)?
        ))
    }
}

/// Loads a pretrained masked language model as a shareable
/// [`ZiLanguageModel`].
#[allow(non_snake_case)]
pub fn load_pretrained_model(
    model_path: &str,
    config: ZiMaskedLMConfig,
    silence: bool,
) -> Result<Arc<dyn ZiLanguageModel>> {
    Ok(Arc::new(ZiPretrainedMaskedLM::from_pretrained(
        model_path, config, silence,
    )?))
}

/// Loads the pretrained model named by `model_path` and builds the operator.
///
/// Every call loads its own copy of the model. Pipelines built through
/// [`ZiPipelineBuilder::with_defaults`](crate::pipeline::ZiPipelineBuilder::with_defaults)
/// use [`shared_context_word_factory`] instead.
#[allow(non_snake_case)]
pub fn augment_context_word_factory(config: &Value) -> Result<Box<dyn ZiOperator + Send + Sync>> {
    let request = ZiModelRequest::from_config(config)?;
    let model = load_pretrained_model(&request.model_path, request.config, request.silence)?;
    context_word_with_model(model, config)
}

/// Operator factory that calls `loader` once per distinct model (path and
/// adapter settings) and shares the result between every operator it builds.
#[allow(non_snake_case)]
pub fn shared_context_word_factory<L>(
    loader: L,
) -> impl Fn(&Value) -> Result<Box<dyn ZiOperator + Send + Sync>> + Send + Sync + 'static
where
    L: Fn(&str, ZiMaskedLMConfig, bool) -> Result<Arc<dyn ZiLanguageModel>>
        + Send
        + Sync
        + 'static,
{
    let loaded: Mutex<HashMap<String, Arc<dyn ZiLanguageModel>>> = Mutex::new(HashMap::new());
    move |config: &Value| {
        let request = ZiModelRequest::from_config(config)?;
        let key = request.cache_key()?;
        let model = {
            let mut loaded = loaded
                .lock()
                .map_err(|_| ZiError::internal("language model cache lock poisoned"))?;
            match loaded.get(&key) {
                Some(model) => Arc::clone(model),
                None => {
                    let model = loader(&request.model_path, request.config, request.silence)?;
                    loaded.insert(key, Arc::clone(&model));
                    model
                }
            }
        };
        context_word_with_model(model, config)
    }
}
