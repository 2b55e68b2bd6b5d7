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

//! # Operators Module
//!
//! Built-in augmentation operators.
//!
//! - **augment**: `augment.random_word` (swap, delete, substitute, crop)
//! - **context**: `augment.context_word` (language-model substitution and
//!   insertion)
//! - **field**: addressing the text inside a record
//!
//! Operators are usually created through their factory functions from JSON
//! configuration and applied to record batches through [`ZiOperator`](crate::operator::ZiOperator).

pub mod augment;
pub mod context;
pub mod field;
