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

//! # ZiAug Core Library
//!
//! Text data augmentation: produce perturbed variants of input text (word
//! swap, deletion, cropping, masked-language-model substitution and
//! insertion) to expand training data.
//!
//! ## Module Overview
//!
//! - **lm**: masked language model adapter and candidate selection
//!   (temperature, top-k, top-p, sampling)
//! - **tokenizer**: vocabulary and tokenizer seams, WordPiece implementation
//! - **record**: ZiRecord and related data structures
//! - **operator**: the operator trait and execution helper
//! - **operators**: word-level augmenters (`augment.random_word`,
//!   `augment.context_word`) and field paths
//! - **pipeline**: pipeline building from JSON or YAML configuration
//! - **enrich**: multi-variant dataset expansion
//! - **logging**: scoped log-level override
//!
//! ## Feature Flags
//!
//! - `parallel`: process records of the contextual augmenter with rayon
//! - `candle`: load pretrained ModernBERT checkpoints with candle
//! - `full`: everything except `candle` (default)
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use ziaug::{ZiPipelineBuilder, ZiRecord};
//!
//! let pipeline = ZiPipelineBuilder::with_defaults().build_from_config(&[json!({
//!     "operator": "augment.random_word",
//!     "config": {"path": "payload.text", "action": "swap"}
//! })])?;
//!
//! let records = vec![ZiRecord::new(
//!     Some("1".to_string()),
//!     json!({"text": "The quick brown fox jumps over the lazy dog"}),
//! )];
//! let augmented = pipeline.run(records)?;
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return `Result<T, ZiError>`. A prediction that finds
//! no usable candidate is `Ok(None)`, not an error.

#![allow(non_snake_case)]

pub mod enrich;
pub mod errors;
pub mod lm;
pub mod logging;
pub mod operator;
pub mod operators;
pub mod pipeline;
pub mod record;
pub mod tokenizer;

pub use errors::{Result, ZiError};
pub use record::{ZiMetadata, ZiRecord, ZiRecordBatch};
pub use operator::{execute_operator, ZiOperator, ZiOperatorFactory};
pub use pipeline::{ZiPipeline, ZiPipelineBuilder};
pub use enrich::{ZiAugmentationConfig, ZiAugmenter};
pub use logging::ZiLogLevelGuard;

pub use lm::{
    ZiCandidate, ZiCandidateSelector, ZiLanguageModel, ZiMaskedLM, ZiMaskedLMConfig,
    ZiMaskedLMFamily, ZiMaskedLMModel, ZiPretrainedMaskedLM, ZiScoreVector, ZiSelectionConfig,
    ZiSelectionMode,
};
pub use tokenizer::{ZiTokenizer, ZiVocabulary, ZiWordPieceTokenizer};

pub use operators::augment::{ZiAugmentRandomWord, ZiRandomWordAction, ZiRandomWordConfig};
pub use operators::context::{ZiAugmentContextWord, ZiContextWordAction, ZiContextWordConfig};
pub use operators::field::ZiFieldPath;
