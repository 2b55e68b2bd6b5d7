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

use std::path::Path;

use tokenizers::Tokenizer;

use crate::errors::{Result, ZiError};
use crate::tokenizer::{ZiTokenizer, ZiVocabulary};

/// [`ZiTokenizer`] over a HuggingFace `tokenizer.json`.
pub struct ZiHfTokenizer {
    inner: Tokenizer,
}

impl std::fmt::Debug for ZiHfTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZiHfTokenizer")
            .field("vocab_size", &self.inner.get_vocab_size(true))
            .finish()
    }
}

impl ZiHfTokenizer {
    pub fn new(inner: Tokenizer) -> Self {
        Self { inner }
    }

    #[allow(non_snake_case)]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = Tokenizer::from_file(path).map_err(|err| {
            ZiError::tokenizer(format!(
                "failed to load tokenizer from '{}': {err}",
                path.display()
            ))
        })?;
        Ok(Self { inner })
    }
}

impl ZiVocabulary for ZiHfTokenizer {
    fn token(&self, id: u32) -> Option<String> {
        self.inner.id_to_token(id)
    }

    fn id(&self, token: &str) -> Option<u32> {
        self.inner.token_to_id(token)
    }

    fn len(&self) -> usize {
        self.inner.get_vocab_size(true)
    }
}

impl ZiTokenizer for ZiHfTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let encoding = self.inner.encode(text, false).map_err(|err| {
            let preview: String = text.chars().take(50).collect();
            ZiError::tokenizer(format!("tokenization failed on '{preview}': {err}"))
        })?;
        Ok(encoding.get_tokens().to_vec())
    }
}
