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

//! # Tokenizer Module
//!
//! Tokenization is an external collaborator of the masked language model
//! adapter. This module defines the seams it talks through:
//!
//! - [`ZiVocabulary`]: id ↔ token lookup over an ordered vocabulary
//! - [`ZiTokenizer`]: text → token strings, plus the vocabulary
//!
//! Bundled implementations:
//!
//! - **wordpiece**: BERT-style basic tokenization followed by greedy
//!   longest-match WordPiece, loaded from a `vocab.txt`
//! - **words**: whitespace word splitting used by the word-level augmenters
//! - **hf** (feature `candle`): adapter over a HuggingFace `tokenizer.json`

pub mod wordpiece;
pub mod words;

#[cfg(feature = "candle")]
pub mod hf;

pub use wordpiece::ZiWordPieceTokenizer;
pub use words::{join_words, split_words};

#[cfg(feature = "candle")]
pub use hf::ZiHfTokenizer;

use crate::errors::{Result, ZiError};

/// Ordered vocabulary indexed by integer id.
pub trait ZiVocabulary {
    /// Token string for `id`, if the id is in range.
    fn token(&self, id: u32) -> Option<String>;

    /// Id of `token`, if it is part of the vocabulary.
    fn id(&self, token: &str) -> Option<u32>;

    /// Number of entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Text tokenizer backing a masked language model.
pub trait ZiTokenizer: ZiVocabulary + Send + Sync {
    /// Splits `text` into vocabulary tokens without adding start or separator
    /// markers. Special tokens present in the text (such as the mask token)
    /// must come back unchanged.
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;

    /// Maps tokens to ids, failing on tokens outside the vocabulary.
    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Result<Vec<u32>> {
        tokens
            .iter()
            .map(|token| {
                self.id(token).ok_or_else(|| {
                    ZiError::tokenizer(format!("token '{token}' is not in the vocabulary"))
                })
            })
            .collect()
    }
}

impl<S: AsRef<str>> ZiVocabulary for [S] {
    fn token(&self, id: u32) -> Option<String> {
        self.get(id as usize).map(|s| s.as_ref().to_string())
    }

    fn id(&self, token: &str) -> Option<u32> {
        self.iter()
            .position(|s| s.as_ref() == token)
            .map(|idx| idx as u32)
    }

    fn len(&self) -> usize {
        <[S]>::len(self)
    }
}

impl<S: AsRef<str>> ZiVocabulary for Vec<S> {
    fn token(&self, id: u32) -> Option<String> {
        self.as_slice().token(id)
    }

    fn id(&self, token: &str) -> Option<u32> {
        self.as_slice().id(token)
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl<T: ZiVocabulary + ?Sized> ZiVocabulary for Box<T> {
    fn token(&self, id: u32) -> Option<String> {
        (**self).token(id)
    }

    fn id(&self, token: &str) -> Option<u32> {
        (**self).id(token)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

impl<T: ZiTokenizer + ?Sized> ZiTokenizer for Box<T> {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        (**self).tokenize(text)
    }
}
