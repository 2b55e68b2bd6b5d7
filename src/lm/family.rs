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

const WORD_START_MARKER: &str = "\u{0120}";
const CONTINUATION_PREFIX: &str = "##";

/// Masked language model families and their token conventions.
///
/// BERT-style vocabularies mark word *continuations* with `##`, while the
/// byte-level BPE vocabularies of RoBERTa and ModernBERT mark word *starts*
/// with `Ġ`; everything without the marker continues the previous word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZiMaskedLMFamily {
    #[default]
    DistilBert,
    Bert,
    Roberta,
    ModernBert,
}

impl ZiMaskedLMFamily {
    /// Guesses the family from a hub id or local directory name.
    pub fn from_model_path(model_path: &str) -> Option<Self> {
        let lowered = model_path.to_lowercase();
        if lowered.contains("modernbert") {
            Some(Self::ModernBert)
        } else if lowered.contains("distilbert") {
            Some(Self::DistilBert)
        } else if lowered.contains("roberta") {
            Some(Self::Roberta)
        } else if lowered.contains("bert") {
            Some(Self::Bert)
        } else {
            None
        }
    }

    fn angle_bracket_specials(self) -> bool {
        matches!(self, Self::Roberta)
    }

    pub fn start_token(self) -> &'static str {
        if self.angle_bracket_specials() {
            "<s>"
        } else {
            "[CLS]"
        }
    }

    pub fn separator_token(self) -> &'static str {
        if self.angle_bracket_specials() {
            "</s>"
        } else {
            "[SEP]"
        }
    }

    pub fn mask_token(self) -> &'static str {
        if self.angle_bracket_specials() {
            "<mask>"
        } else {
            "[MASK]"
        }
    }

    pub fn unknown_token(self) -> &'static str {
        if self.angle_bracket_specials() {
            "<unk>"
        } else {
            "[UNK]"
        }
    }

    /// Marker a token carries when it is a sub-word piece (`##`) or a word
    /// start (`Ġ`), depending on the family.
    pub fn subword_marker(self) -> &'static str {
        match self {
            Self::DistilBert | Self::Bert => CONTINUATION_PREFIX,
            Self::Roberta | Self::ModernBert => WORD_START_MARKER,
        }
    }

    /// Whether `token` continues the previous word and therefore cannot stand
    /// on its own in the surface text.
    pub fn is_continuation(self, token: &str) -> bool {
        match self {
            Self::DistilBert | Self::Bert => token.starts_with(CONTINUATION_PREFIX),
            Self::Roberta | Self::ModernBert => !token.starts_with(WORD_START_MARKER),
        }
    }

    /// Surface form of a vocabulary token.
    pub fn surface<'a>(self, token: &'a str) -> &'a str {
        match self {
            Self::DistilBert | Self::Bert => token,
            Self::Roberta | Self::ModernBert => {
                token.strip_prefix(WORD_START_MARKER).unwrap_or(token)
            }
        }
    }

    /// Vocabulary spellings to try, in order, when looking up a surface word.
    pub fn vocabulary_forms(self, word: &str) -> Vec<String> {
        let mut forms = match self {
            Self::DistilBert | Self::Bert => vec![word.to_string(), word.to_lowercase()],
            Self::Roberta | Self::ModernBert => {
                vec![format!("{WORD_START_MARKER}{word}"), word.to_string()]
            }
        };
        forms.dedup();
        forms
    }

    /// Tokens that are never useful as a replacement word: empty strings, the
    /// unknown token, bracketed specials, a bare marker and `unused` slots.
    pub fn is_unusable(self, token: &str) -> bool {
        if token.is_empty() || token == self.unknown_token() || token == self.subword_marker() {
            return true;
        }
        let bracketed = (token.starts_with('[') && token.ends_with(']'))
            || (token.starts_with('<') && token.ends_with('>'));
        (bracketed && token.len() > 2) || token.contains("unused")
    }
}
