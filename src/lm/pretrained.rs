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

//! # Pretrained Backend
//!
//! Loads a ModernBERT masked language model with candle. `model_path` is
//! either a local directory holding `tokenizer.json`, `config.json` and
//! `model.safetensors`, or a HuggingFace hub id such as
//! `answerdotai/ModernBERT-base`.
//!
//! Builds without the `candle` feature still expose
//! [`ZiPretrainedMaskedLM::from_pretrained`]; it fails immediately with
//! [`ZiError::MissingDependency`](crate::errors::ZiError::MissingDependency).

use crate::errors::Result;
use crate::lm::masked::{ZiMaskedLM, ZiMaskedLMConfig, ZiMaskedLMModel};
use crate::tokenizer::ZiTokenizer;

/// Adapter over type-erased tokenizer and model, as produced by
/// [`from_pretrained`](ZiPretrainedMaskedLM::from_pretrained).
pub type ZiPretrainedMaskedLM = ZiMaskedLM<Box<dyn ZiTokenizer>, Box<dyn ZiMaskedLMModel>>;

impl ZiPretrainedMaskedLM {
    /// Loads tokenizer and weights for `model_path`.
    ///
    /// With `silence`, log output below `Error` is muted while the weights
    /// load and the previous threshold is restored afterwards.
    #[allow(non_snake_case)]
    pub fn from_pretrained(
        model_path: &str,
        config: ZiMaskedLMConfig,
        silence: bool,
    ) -> Result<Self> {
        backend::load(model_path, config, silence)
    }
}

#[cfg(not(feature = "candle"))]
mod backend {
    use super::*;
    use crate::errors::ZiError;

    pub(super) fn load(
        model_path: &str,
        _config: ZiMaskedLMConfig,
        _silence: bool,
    ) -> Result<ZiPretrainedMaskedLM> {
        Err(ZiError::missing_dependency(
            "candle",
            format!("loading '{model_path}' requires rebuilding ziaug with `--features candle`"),
        ))
    }
}

#[cfg(feature = "candle")]
mod backend {
    use std::path::{Path, PathBuf};

    use candle_core::{DType, Device, Tensor};
    use candle_nn::VarBuilder;
    use candle_transformers::models::modernbert::{Config, ModernBertForMaskedLM};
    use hf_hub::api::sync::Api;
    use hf_hub::{Repo, RepoType};
    use log::LevelFilter;

    use super::*;
    use crate::errors::ZiError;
    use crate::lm::family::ZiMaskedLMFamily;
    use crate::lm::selection::ZiScoreVector;
    use crate::logging::ZiLogLevelGuard;
    use crate::tokenizer::ZiHfTokenizer;

    struct ZiModernBertModel {
        model: ModernBertForMaskedLM,
        device: Device,
    }

    impl ZiMaskedLMModel for ZiModernBertModel {
        fn forward(
            &self,
            input_ids: &[u32],
            attention_mask: &[u32],
        ) -> Result<Vec<ZiScoreVector>> {
            let input_ids = Tensor::new(input_ids, &self.device)?.unsqueeze(0)?;
            let attention_mask = Tensor::new(attention_mask, &self.device)?.unsqueeze(0)?;
            let logits = self.model.forward(&input_ids, &attention_mask)?;
            let logits = logits.squeeze(0)?.to_dtype(DType::F32)?;
            Ok(logits.to_vec2::<f32>()?)
        }
    }

    struct ZiModelFiles {
        tokenizer: PathBuf,
        config: PathBuf,
        weights: PathBuf,
    }

    fn resolve_files(model_path: &str) -> Result<ZiModelFiles> {
        let local = Path::new(model_path);
        if local.is_dir() {
            return Ok(ZiModelFiles {
                tokenizer: local.join("tokenizer.json"),
                config: local.join("config.json"),
                weights: local.join("model.safetensors"),
            });
        }

        let api = Api::new()?;
        let repo = api.repo(Repo::new(model_path.to_string(), RepoType::Model));
        Ok(ZiModelFiles {
            tokenizer: repo.get("tokenizer.json")?,
            config: repo.get("config.json")?,
            weights: repo.get("model.safetensors")?,
        })
    }

    pub(super) fn load(
        model_path: &str,
        config: ZiMaskedLMConfig,
        silence: bool,
    ) -> Result<ZiPretrainedMaskedLM> {
        if config.family != ZiMaskedLMFamily::ModernBert {
            return Err(ZiError::configuration(format!(
                "the candle backend only loads ModernBERT checkpoints, got {:?}",
                config.family
            )));
        }

        log::info!("loading masked language model '{model_path}'");
        let files = resolve_files(model_path)?;
        let tokenizer = ZiHfTokenizer::from_file(&files.tokenizer)?;

        let device = Device::Cpu;
        let model = {
            let _guard = silence.then(|| ZiLogLevelGuard::new(LevelFilter::Error));
            let model_config: Config =
                serde_json::from_str(&std::fs::read_to_string(&files.config)?)?;
            let vb = unsafe {
                VarBuilder::from_mmaped_safetensors(&[&files.weights], DType::F32, &device)?
            };
            ModernBertForMaskedLM::load(vb, &model_config)?
        };
        log::info!("loaded '{model_path}'");

        ZiMaskedLM::new(
            Box::new(tokenizer) as Box<dyn ZiTokenizer>,
            Box::new(ZiModernBertModel { model, device }) as Box<dyn ZiMaskedLMModel>,
            config,
        )
    }
}
