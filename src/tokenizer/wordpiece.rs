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
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::errors::{Result, ZiError};
use crate::tokenizer::{ZiTokenizer, ZiVocabulary};

const DEFAULT_UNK_TOKEN: &str = "[UNK]";
const DEFAULT_CONTINUATION_PREFIX: &str = "##";
const MAX_CHARS_PER_WORD: usize = 100;

/// BERT-style tokenizer: whitespace and punctuation splitting followed by
/// greedy longest-match-first WordPiece over a fixed vocabulary.
///
/// Bracketed entries of the vocabulary (`[CLS]`, `[MASK]`, `<s>`, ...) are
/// treated as special tokens: they are matched verbatim in the input and
/// never lowercased or split.
#[derive(Debug, Clone)]
pub struct ZiWordPieceTokenizer {
    tokens: Vec<String>,
    ids: HashMap<String, u32>,
    special_pattern: Option<Regex>,
    lowercase: bool,
    unk_token: String,
    continuation_prefix: String,
}

impl ZiWordPieceTokenizer {
    /// Builds a tokenizer from vocabulary entries in id order.
    #[allow(non_snake_case)]
    pub fn from_tokens<I, S>(tokens: I, lowercase: bool) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if tokens.is_empty() {
            return Err(ZiError::configuration("wordpiece vocabulary may not be empty"));
        }

        let mut ids = HashMap::with_capacity(tokens.len());
        for (idx, token) in tokens.iter().enumerate() {
            ids.entry(token.clone()).or_insert(idx as u32);
        }

        let mut specials: Vec<&String> = tokens.iter().filter(|t| is_special(t)).collect();
        specials.sort_by(|a, b| b.len().cmp(&a.len()));
        let special_pattern = if specials.is_empty() {
            None
        } else {
            let alternation = specials
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&alternation).map_err(|err| {
                ZiError::configuration(format!("invalid special token pattern: {err}"))
            })?)
        };

        Ok(Self {
            tokens,
            ids,
            special_pattern,
            lowercase,
            unk_token: DEFAULT_UNK_TOKEN.to_string(),
            continuation_prefix: DEFAULT_CONTINUATION_PREFIX.to_string(),
        })
    }

    /// Loads a `vocab.txt` file with one token per line.
    #[allow(non_snake_case)]
    pub fn from_file(path: impl AsRef<Path>, lowercase: bool) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let tokens = contents
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty());
        log::debug!("loading wordpiece vocabulary from {}", path.display());
        Self::from_tokens(tokens, lowercase)
    }

    /// Overrides the token emitted for words that cannot be pieced together.
    pub fn with_unk_token(mut self, token: impl Into<String>) -> Self {
        self.unk_token = token.into();
        self
    }

    pub fn unk_token(&self) -> &str {
        &self.unk_token
    }

    pub fn continuation_prefix(&self) -> &str {
        &self.continuation_prefix
    }

    fn basic_tokenize(&self, text: &str, out: &mut Vec<String>) {
        let normalized;
        let text = if self.lowercase {
            normalized = text.to_lowercase();
            normalized.as_str()
        } else {
            text
        };

        for word in text.split_whitespace() {
            let mut current = String::new();
            for ch in word.chars() {
                if is_punctuation(ch) {
                    if !current.is_empty() {
                        out.push(std::mem::take(&mut current));
                    }
                    out.push(ch.to_string());
                } else if !ch.is_control() {
                    current.push(ch);
                }
            }
            if !current.is_empty() {
                out.push(current);
            }
        }
    }

    fn wordpiece(&self, word: &str, out: &mut Vec<String>) -> Result<()> {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() > MAX_CHARS_PER_WORD {
            return self.push_unknown(word, out);
        }

        let mut pieces = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let mut end = chars.len();
            let mut found = None;
            while start < end {
                let piece: String = chars[start..end].iter().collect();
                let piece = if start > 0 {
                    format!("{}{}", self.continuation_prefix, piece)
                } else {
                    piece
                };
                if self.ids.contains_key(&piece) {
                    found = Some(piece);
                    break;
                }
                end -= 1;
            }
            match found {
                Some(piece) => {
                    pieces.push(piece);
                    start = end;
                }
                None => return self.push_unknown(word, out),
            }
        }

        out.extend(pieces);
        Ok(())
    }

    fn push_unknown(&self, word: &str, out: &mut Vec<String>) -> Result<()> {
        if self.ids.contains_key(&self.unk_token) {
            out.push(self.unk_token.clone());
            Ok(())
        } else {
            Err(ZiError::tokenizer(format!(
                "cannot tokenize '{word}' and vocabulary has no '{}' token",
                self.unk_token
            )))
        }
    }
}

impl ZiVocabulary for ZiWordPieceTokenizer {
    fn token(&self, id: u32) -> Option<String> {
        self.tokens.get(id as usize).cloned()
    }

    fn id(&self, token: &str) -> Option<u32> {
        self.ids.get(token).copied()
    }

    fn len(&self) -> usize {
        self.tokens.len()
    }
}

impl ZiTokenizer for ZiWordPieceTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let mut words = Vec::new();
        let mut tokens = Vec::new();
        let mut cursor = 0;

        let mut flush = |segment: &str, tokens: &mut Vec<String>| -> Result<()> {
            words.clear();
            self.basic_tokenize(segment, &mut words);
            for word in &words {
                self.wordpiece(word, tokens)?;
            }
            Ok(())
        };

        if let Some(pattern) = &self.special_pattern {
            for found in pattern.find_iter(text) {
                flush(&text[cursor..found.start()], &mut tokens)?;
                tokens.push(found.as_str().to_string());
                cursor = found.end();
            }
        }
        flush(&text[cursor..], &mut tokens)?;

        Ok(tokens)
    }
}

fn is_special(token: &str) -> bool {
    let bracketed = (token.starts_with('[') && token.ends_with(']'))
        || (token.starts_with('<') && token.ends_with('>'));
    bracketed && token.chars().count() > 2 && !token.chars().any(char::is_whitespace)
}

fn is_punctuation(ch: char) -> bool {
    ch.is_ascii_punctuation()
        || (!ch.is_alphanumeric() && !ch.is_whitespace() && !ch.is_control())
}
