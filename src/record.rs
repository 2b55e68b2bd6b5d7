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

//! # Record Module
//!
//! Records are the unit of work for augmentation operators. The text to be
//! perturbed lives somewhere inside the JSON payload (addressed with a
//! [`ZiFieldPath`](crate::operators::field::ZiFieldPath)); augmentation
//! bookkeeping is written to the metadata map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key set to `true` on records whose text was changed.
pub const AUGMENTED_KEY: &str = "augmented";

/// Metadata key naming the operator that changed the record.
pub const AUGMENTATION_METHOD_KEY: &str = "augmentation_method";

/// Generic metadata map that may accompany a record.
pub type ZiMetadata = Map<String, Value>;

/// A single text-bearing record flowing through augmentation operators.
///
/// The payload is free-form JSON so that the same operators can augment a
/// bare string, a `{"text": ...}` object, or a field nested deeper in a
/// structured sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZiRecord {
    /// Optional stable identifier. Augmented copies derive their ids from it.
    pub id: Option<String>,

    /// Primary payload carrying user content.
    pub payload: Value,

    /// Additional attributes such as augmentation provenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ZiMetadata>,
}

impl ZiRecord {
    /// Constructs a record with the given payload and optional identifier.
    #[allow(non_snake_case)]
    pub fn new(id: impl Into<Option<String>>, payload: Value) -> Self {
        ZiRecord {
            id: id.into(),
            payload,
            metadata: None,
        }
    }

    /// Attaches metadata to the record.
    #[allow(non_snake_case)]
    pub fn with_metadata(mut self, metadata: ZiMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns a mutable reference to the metadata map, creating it if necessary.
    #[allow(non_snake_case)]
    pub fn metadata_mut(&mut self) -> &mut ZiMetadata {
        self.metadata.get_or_insert_with(ZiMetadata::new)
    }

    /// Records that `method` changed this record's text.
    #[allow(non_snake_case)]
    pub fn mark_augmented(&mut self, method: &str) {
        let metadata = self.metadata_mut();
        metadata.insert(AUGMENTED_KEY.to_string(), Value::Bool(true));
        metadata.insert(
            AUGMENTATION_METHOD_KEY.to_string(),
            Value::String(method.to_string()),
        );
    }

    /// Whether an operator has marked this record as augmented.
    pub fn is_augmented(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(AUGMENTED_KEY))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Convenience alias for working on batches of records.
pub type ZiRecordBatch = Vec<ZiRecord>;
