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

use serde_json::{Map, Value};

use crate::errors::{Result, ZiError};
use crate::record::ZiRecord;

/// Dotted path into a record, rooted at `payload` or `metadata`.
///
/// `payload` on its own addresses the whole payload, which lets operators
/// augment records whose payload is a bare string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZiFieldPath {
    segments: Vec<String>,
}

impl ZiFieldPath {
    #[allow(non_snake_case)]
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<String> = path
            .split('.')
            .map(|segment| segment.trim().to_string())
            .filter(|segment| !segment.is_empty())
            .collect();

        let first = match segments.first() {
            Some(first) => first.as_str(),
            None => return Err(ZiError::validation("field path may not be empty")),
        };

        if first != "payload" && first != "metadata" {
            return Err(ZiError::validation(
                "field path must start with 'payload' or 'metadata'",
            ));
        }

        if first == "metadata" && segments.len() == 1 {
            return Err(ZiError::validation(
                "metadata paths must include at least one key",
            ));
        }

        Ok(Self { segments })
    }

    /// Resolves the path and returns the string stored there, if any.
    #[allow(non_snake_case)]
    pub fn resolve_str<'a>(&self, record: &'a ZiRecord) -> Option<&'a str> {
        self.resolve(record).and_then(Value::as_str)
    }

    #[allow(non_snake_case)]
    pub fn resolve<'a>(&self, record: &'a ZiRecord) -> Option<&'a Value> {
        let (root, rest) = self.segments.split_first()?;
        let mut current = match root.as_str() {
            "payload" => &record.payload,
            "metadata" => {
                let (key, _) = rest.split_first()?;
                record.metadata.as_ref()?.get(key)?
            }
            _ => return None,
        };
        let rest = if root == "metadata" { &rest[1..] } else { rest };
        for segment in rest {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Writes `value` at the path, creating intermediate objects as needed.
    ///
    /// Returns `false` when an intermediate segment holds a non-object value.
    #[allow(non_snake_case)]
    pub fn set_value(&self, record: &mut ZiRecord, value: Value) -> bool {
        let (root, rest) = match self.segments.split_first() {
            Some(parts) => parts,
            None => return false,
        };
        match root.as_str() {
            "payload" => {
                if rest.is_empty() {
                    record.payload = value;
                    return true;
                }
                if !record.payload.is_object() {
                    record.payload = Value::Object(Map::new());
                }
                match &mut record.payload {
                    Value::Object(map) => Self::insert_nested(map, rest, value),
                    _ => false,
                }
            }
            "metadata" => Self::insert_nested(record.metadata_mut(), rest, value),
            _ => false,
        }
    }

    fn insert_nested(map: &mut Map<String, Value>, segments: &[String], value: Value) -> bool {
        let (last, parents) = match segments.split_last() {
            Some(parts) => parts,
            None => return false,
        };
        let mut current = map;
        for seg in parents {
            current = match current
                .entry(seg.clone())
                .or_insert_with(|| Value::Object(Map::new()))
            {
                Value::Object(inner) => inner,
                _ => return false,
            };
        }
        current.insert(last.clone(), value);
        true
    }
}
