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

//! # Data Enrichment Module
//!
//! Grows a dataset with augmented copies of its records.
//!
//! [`ZiAugmenter`] runs a chain of augmentation operators several times with
//! different seeds and tags each copy with its provenance:
//!
//! - id: `{id}_aug_{variant}`
//! - metadata: `augmented`, `augmentation_method`, `augmentation_variant`
//!
//! ```rust
//! use serde_json::json;
//! use ziaug::enrich::{ZiAugmentationConfig, ZiAugmenter};
//! use ziaug::pipeline::ZiPipelineBuilder;
//!
//! let config = ZiAugmentationConfig {
//!     steps: vec![json!({
//!         "operator": "augment.random_word",
//!         "config": {"path": "payload.text", "action": "swap"}
//!     })],
//!     variants: 3,
//!     ..Default::default()
//! };
//! let augmenter = ZiAugmenter::new(&ZiPipelineBuilder::with_defaults(), config)?;
//! let expanded = augmenter.augment(&batch)?;
//! ```

pub mod augmentation;

pub use augmentation::{ZiAugmentationConfig, ZiAugmenter, AUGMENTATION_VARIANT_KEY};
