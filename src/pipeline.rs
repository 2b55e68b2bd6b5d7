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

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::{Result, ZiError};
use crate::lm::ZiLanguageModel;
use crate::operator::{execute_operator, ZiOperator, ZiOperatorFactory};
use crate::operators::augment::augment_random_word_factory;
use crate::operators::context::{
    context_word_with_model, load_pretrained_model, shared_context_word_factory,
};
use crate::record::ZiRecordBatch;

/// Linear pipeline of operators applied one after another.
#[derive(Debug)]
pub struct ZiPipeline {
    stages: Vec<Box<dyn ZiOperator + Send + Sync>>,
}

impl ZiPipeline {
    #[allow(non_snake_case)]
    pub fn new(stages: Vec<Box<dyn ZiOperator + Send + Sync>>) -> Self {
        ZiPipeline { stages }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Names of the stages in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Runs the batch through every stage.
    pub fn run(&self, mut batch: ZiRecordBatch) -> Result<ZiRecordBatch> {
        for stage in &self.stages {
            batch = execute_operator(stage.as_ref(), batch)?;
        }
        Ok(batch)
    }

    /// Like [`run`](Self::run), calling `progress(stage, before, after)`
    /// with the batch size around each stage.
    pub fn run_with_progress(
        &self,
        mut batch: ZiRecordBatch,
        progress: impl Fn(&str, usize, usize),
    ) -> Result<ZiRecordBatch> {
        for stage in &self.stages {
            let before = batch.len();
            batch = execute_operator(stage.as_ref(), batch)?;
            progress(stage.name(), before, batch.len());
        }
        Ok(batch)
    }

    /// Ensures the pipeline contains at least one stage.
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(ZiError::pipeline("pipeline", "no stages configured"));
        }
        Ok(())
    }
}

/// Builder that knows how to instantiate operators from configuration.
#[derive(Clone, Default)]
pub struct ZiPipelineBuilder {
    factories: HashMap<String, ZiOperatorFactory>,
}

impl std::fmt::Debug for ZiPipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("ZiPipelineBuilder")
            .field("operators", &names)
            .finish()
    }
}

impl ZiPipelineBuilder {
    /// Creates an empty builder.
    #[allow(non_snake_case)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with `augment.random_word` and
    /// `augment.context_word` registered. Pretrained models are loaded once
    /// per builder (and its clones) and shared between pipelines.
    #[allow(non_snake_case)]
    pub fn with_defaults() -> Self {
        let mut builder = Self::new();
        builder.register("augment.random_word", augment_random_word_factory);
        builder.register(
            "augment.context_word",
            shared_context_word_factory(load_pretrained_model),
        );
        builder
    }

    /// Registers a factory for the given operator name, replacing any
    /// previous registration.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Value) -> Result<Box<dyn ZiOperator + Send + Sync>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Binds a loaded language model to `name`: steps using that operator
    /// name build a contextual word augmenter around `model` instead of
    /// loading one from `model_path`.
    pub fn register_language_model(
        &mut self,
        name: impl Into<String>,
        model: Arc<dyn ZiLanguageModel>,
    ) {
        self.register(name, move |config: &Value| {
            context_word_with_model(Arc::clone(&model), config)
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Builds a pipeline from `{"operator": ..., "config": ...}` steps.
    pub fn build_from_config(&self, steps: &[Value]) -> Result<ZiPipeline> {
        let mut stages = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let object = step.as_object().ok_or_else(|| {
                ZiError::validation(format!("pipeline step #{index} must be an object"))
            })?;

            let operator_name = object
                .get("operator")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ZiError::validation(format!("pipeline step #{index} missing string 'operator'"))
                })?;

            let factory = self.factories.get(operator_name).ok_or_else(|| {
                ZiError::validation(format!("unknown operator '{operator_name}'"))
            })?;

            let config_value = object.get("config").cloned().unwrap_or(Value::Null);
            let operator = factory(&config_value)
                .map_err(|err| ZiError::pipeline(operator_name, err.to_string()))?;
            stages.push(operator);
        }

        let pipeline = ZiPipeline::new(stages);
        pipeline.validate()?;
        log::info!("built pipeline: {}", pipeline.stage_names().join(" -> "));
        Ok(pipeline)
    }

    /// Builds a pipeline from a YAML document that is either a list of steps
    /// or a mapping with a `steps` list.
    pub fn build_from_yaml(&self, document: &str) -> Result<ZiPipeline> {
        let value: Value = serde_yaml::from_str(document)?;
        let steps = match &value {
            Value::Array(steps) => steps.as_slice(),
            Value::Object(map) => map
                .get("steps")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .ok_or_else(|| ZiError::validation("pipeline document requires a 'steps' list"))?,
            _ => {
                return Err(ZiError::validation(
                    "pipeline document must be a list or a mapping",
                ))
            }
        };
        self.build_from_config(steps)
    }
}
