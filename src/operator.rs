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

//! # Operator Module
//!
//! The [`ZiOperator`] trait is the seam every augmenter plugs into. Operators
//! take a batch of records and return the (possibly perturbed) batch.

use std::sync::Arc;

use serde_json::Value;

use crate::errors::{Result, ZiError};
use crate::record::ZiRecordBatch;

/// Factory used by the pipeline registry to build an operator from its JSON config.
pub type ZiOperatorFactory =
    Arc<dyn Fn(&Value) -> Result<Box<dyn ZiOperator + Send + Sync>> + Send + Sync>;

/// Contract that every augmentation operator fulfills.
///
/// Operators hold only immutable configuration (and shared read-only models),
/// so one instance can be applied to many batches. Randomised operators seed
/// their generator from their configured seed on every `apply`, which keeps
/// the output of a given batch reproducible.
pub trait ZiOperator: std::fmt::Debug {
    /// Unique, human-readable name for the operator, e.g. `augment.random_word`.
    fn name(&self) -> &'static str;

    /// Applies the operator to an incoming batch of records.
    fn apply(&self, batch: ZiRecordBatch) -> Result<ZiRecordBatch>;
}

/// Executes an operator and tags any failure with the operator's name.
#[allow(non_snake_case)]
pub fn execute_operator(
    operator: &dyn ZiOperator,
    batch: ZiRecordBatch,
) -> Result<ZiRecordBatch> {
    operator
        .apply(batch)
        .map_err(|err| ZiError::operator(operator.name(), err.to_string()))
}
