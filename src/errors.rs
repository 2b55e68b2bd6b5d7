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

//! # ZiAug Error Module
//!
//! This module defines the error types and utilities used throughout ZiAug
//! for consistent error handling and reporting.
//!
//! ## Error Categories
//!
//! - **Configuration**: Invalid selection or operator settings, rejected when
//!   the component is constructed
//! - **Inference**: Failures raised by the masked language model backend
//! - **Tokenizer**: Failures raised by the tokenizer backend
//! - **MissingDependency**: A capability that was not compiled into this build
//! - **Validation**: Invalid call-time inputs
//! - **Operator**: Failures in operator implementations
//! - **Pipeline**: Pipeline orchestration failures
//! - **Io** / **Serde**: Filesystem and serialization errors
//! - **Internal**: Unexpected internal failures
//!
//! "No qualifying candidate" is not an error: prediction APIs return
//! `Ok(None)` for it so callers can tell an empty answer from a failed call.
//!
//! ## Usage
//!
//! ```rust
//! use ziaug::errors::{Result, ZiError};
//!
//! fn temperature(value: f32) -> Result<f32> {
//!     if value <= 0.0 {
//!         return Err(ZiError::configuration("temperature must be positive"));
//!     }
//!     Ok(value)
//! }
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout ZiAug.
pub type Result<T> = std::result::Result<T, ZiError>;

/// Canonical error enumeration for ZiAug.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ZiError {
    /// Errors originating from filesystem or network IO.
    #[error("io error: {0}")]
    Io(String),

    /// Invalid configuration detected while constructing a component.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Validation errors triggered by invalid call-time inputs.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Failures reported by the masked language model backend.
    #[error("inference error: {message}")]
    Inference { message: String },

    /// Failures reported by the tokenizer backend.
    #[error("tokenizer error: {message}")]
    Tokenizer { message: String },

    /// A capability was requested that this build does not provide.
    #[error("missing dependency '{dependency}': {hint}")]
    MissingDependency { dependency: String, hint: String },

    /// Any failure raised by an operator implementation.
    #[error("operator '{operator}' failed: {message}")]
    Operator { operator: String, message: String },

    /// Failures that occur while orchestrating a pipeline.
    #[error("pipeline error at stage '{stage}': {message}")]
    Pipeline { stage: String, message: String },

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for ZiError {
    fn from(err: io::Error) -> Self {
        ZiError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ZiError {
    fn from(err: serde_json::Error) -> Self {
        ZiError::Serde(err.to_string())
    }
}

impl From<serde_yaml::Error> for ZiError {
    fn from(err: serde_yaml::Error) -> Self {
        ZiError::Serde(err.to_string())
    }
}

#[cfg(feature = "candle")]
impl From<candle_core::Error> for ZiError {
    fn from(err: candle_core::Error) -> Self {
        ZiError::inference(err.to_string())
    }
}

#[cfg(feature = "candle")]
impl From<hf_hub::api::sync::ApiError> for ZiError {
    fn from(err: hf_hub::api::sync::ApiError) -> Self {
        ZiError::Io(format!("model download failed: {err}"))
    }
}

impl ZiError {
    /// Helper to construct configuration errors.
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        ZiError::Configuration {
            message: message.into(),
        }
    }

    /// Helper to construct simple validation errors.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        ZiError::Validation {
            message: message.into(),
        }
    }

    /// Helper to construct inference errors.
    pub fn inference<T: Into<String>>(message: T) -> Self {
        ZiError::Inference {
            message: message.into(),
        }
    }

    /// Helper to construct tokenizer errors.
    pub fn tokenizer<T: Into<String>>(message: T) -> Self {
        ZiError::Tokenizer {
            message: message.into(),
        }
    }

    /// Helper to construct missing dependency errors.
    pub fn missing_dependency(dependency: impl Into<String>, hint: impl Into<String>) -> Self {
        ZiError::MissingDependency {
            dependency: dependency.into(),
            hint: hint.into(),
        }
    }

    /// Helper to construct operator errors.
    pub fn operator(name: impl Into<String>, message: impl Into<String>) -> Self {
        ZiError::Operator {
            operator: name.into(),
            message: message.into(),
        }
    }

    /// Helper to construct pipeline errors.
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        ZiError::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        ZiError::Internal(message.into())
    }
}
