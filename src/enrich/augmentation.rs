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

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, ZiError};
use crate::pipeline::{ZiPipeline, ZiPipelineBuilder};
use crate::record::ZiRecordBatch;

/// Metadata key holding the index of the variant that produced a copy.
pub const AUGMENTATION_VARIANT_KEY: &str = "augmentation_variant";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZiAugmentationConfig {
    /// Pipeline steps, `{"operator": ..., "config": ...}`.
    pub steps: Vec<Value>,
    /// Augmented copies produced per input record.
    pub variants: usize,
    /// Emit the input records ahead of their copies.
    pub preserve_original: bool,
    /// Drop copies that came out identical to their input.
    pub skip_unchanged: bool,
    /// Base seed; every variant and step derives its own seed from it.
    pub seed: u64,
}

impl Default for ZiAugmentationConfig {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            variants: 1,
            preserve_original: true,
            skip_unchanged: true,
            seed: 0x0a06_2025,
        }
    }
}

/// Expands a batch with augmented copies of its records.
///
/// Each variant runs its own pipeline instance whose steps get distinct
/// seeds, so variants differ from each other while the whole expansion stays
/// reproducible.
#[derive(Debug)]
pub struct ZiAugmenter {
    config: ZiAugmentationConfig,
    pipelines: Vec<ZiPipeline>,
}

impl ZiAugmenter {
    #[allow(non_snake_case)]
    pub fn new(builder: &ZiPipelineBuilder, config: ZiAugmentationConfig) -> Result<Self> {
        if config.variants == 0 {
            return Err(ZiError::configuration("augmentation 'variants' must be at least 1"));
        }
        if config.steps.is_empty() {
            return Err(ZiError::configuration("augmentation requires at least one step"));
        }

        let pipelines = (0..config.variants)
            .map(|variant| {
                let steps = seeded_steps(&config.steps, config.seed, variant)?;
                builder.build_from_config(&steps)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { config, pipelines })
    }

    pub fn config(&self) -> &ZiAugmentationConfig {
        &self.config
    }

    /// Originals (when preserved) followed by each variant's copies.
    pub fn augment(&self, batch: &ZiRecordBatch) -> Result<ZiRecordBatch> {
        let mut out = Vec::with_capacity(batch.len() * (self.pipelines.len() + 1));
        if self.config.preserve_original {
            out.extend(batch.iter().cloned());
        }

        for (variant, pipeline) in self.pipelines.iter().enumerate() {
            let method = pipeline.stage_names().join("+");
            let copies = pipeline.run(batch.clone())?;
            let aligned = copies.len() == batch.len();

            for (idx, mut record) in copies.into_iter().enumerate() {
                if self.config.skip_unchanged && aligned && record.payload == batch[idx].payload {
                    continue;
                }
                if let Some(id) = &record.id {
                    record.id = Some(format!("{id}_aug_{variant}"));
                }
                if !record.is_augmented() {
                    record.mark_augmented(&method);
                }
                record
                    .metadata_mut()
                    .insert(AUGMENTATION_VARIANT_KEY.to_string(), Value::from(variant));
                out.push(record);
            }
        }

        log::debug!(
            "augmented {} records into {} ({} variants)",
            batch.len(),
            out.len(),
            self.pipelines.len()
        );
        Ok(out)
    }
}

/// Copies `steps`, giving every step config a seed unique to
/// `(variant, step)`.
fn seeded_steps(steps: &[Value], seed: u64, variant: usize) -> Result<Vec<Value>> {
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let mut step = step.clone();
            let object = step.as_object_mut().ok_or_else(|| {
                ZiError::validation(format!("augmentation step #{index} must be an object"))
            })?;
            let config = object
                .entry("config")
                .or_insert_with(|| Value::Object(Default::default()));
            if let Value::Object(map) = config {
                let step_seed = seed
                    .wrapping_add((variant as u64) << 32)
                    .wrapping_add(index as u64);
                map.insert("seed".to_string(), Value::from(step_seed));
            }
            Ok(step)
        })
        .collect()
}
