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

use std::io::Write;

use tempfile::NamedTempFile;
use ziaug::tokenizer::{join_words, split_words};
use ziaug::{ZiError, ZiTokenizer, ZiVocabulary, ZiWordPieceTokenizer};

fn vocab_file(tokens: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for token in tokens {
        writeln!(file, "{token}").unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn loads_vocabulary_from_file_in_line_order() {
    let file = vocab_file(&["[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "hello", "world"]);
    let tokenizer = ZiWordPieceTokenizer::from_file(file.path(), true).unwrap();

    assert_eq!(tokenizer.len(), 7);
    assert_eq!(tokenizer.id("[MASK]"), Some(4));
    assert_eq!(tokenizer.token(5).as_deref(), Some("hello"));
    assert_eq!(tokenizer.token(99), None);
}

#[test]
fn missing_vocabulary_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ZiWordPieceTokenizer::from_file(dir.path().join("vocab.txt"), true);
    assert!(matches!(result, Err(ZiError::Io(_))));
}

#[test]
fn special_tokens_survive_lowercasing_and_punctuation_splits() {
    let tokenizer = ZiWordPieceTokenizer::from_tokens(
        ["[UNK]", "[MASK]", "hello", ",", "world", "!"],
        true,
    )
    .unwrap();
    let tokens = tokenizer.tokenize("Hello, [MASK] World!").unwrap();
    assert_eq!(tokens, vec!["hello", ",", "[MASK]", "world", "!"]);
}

#[test]
fn words_are_split_into_longest_matching_pieces() {
    let tokenizer = ZiWordPieceTokenizer::from_tokens(
        ["[UNK]", "play", "##ing", "##s", "un", "##play", "##able"],
        true,
    )
    .unwrap();
    assert_eq!(tokenizer.tokenize("playing").unwrap(), vec!["play", "##ing"]);
    assert_eq!(
        tokenizer.tokenize("unplayable plays").unwrap(),
        vec!["un", "##play", "##able", "play", "##s"]
    );
}

#[test]
fn unknown_words_map_to_the_unknown_token() {
    let tokenizer = ZiWordPieceTokenizer::from_tokens(["[UNK]", "fox"], true).unwrap();
    assert_eq!(tokenizer.tokenize("fox zebra").unwrap(), vec!["fox", "[UNK]"]);

    let without_unk = ZiWordPieceTokenizer::from_tokens(["fox"], true).unwrap();
    assert!(matches!(
        without_unk.tokenize("zebra"),
        Err(ZiError::Tokenizer { .. })
    ));
}

#[test]
fn case_is_kept_when_lowercasing_is_off() {
    let tokenizer = ZiWordPieceTokenizer::from_tokens(["[UNK]", "Fox", "fox"], false).unwrap();
    assert_eq!(tokenizer.tokenize("Fox fox").unwrap(), vec!["Fox", "fox"]);
}

#[test]
fn converting_unknown_tokens_fails() {
    let tokenizer = ZiWordPieceTokenizer::from_tokens(["[UNK]", "fox"], true).unwrap();
    assert_eq!(
        tokenizer
            .convert_tokens_to_ids(&["fox".to_string(), "[UNK]".to_string()])
            .unwrap(),
        vec![1, 0]
    );
    assert!(matches!(
        tokenizer.convert_tokens_to_ids(&["dog".to_string()]),
        Err(ZiError::Tokenizer { .. })
    ));
}

#[test]
fn empty_vocabulary_is_rejected() {
    let empty: [&str; 0] = [];
    assert!(matches!(
        ZiWordPieceTokenizer::from_tokens(empty, true),
        Err(ZiError::Configuration { .. })
    ));
}

#[test]
fn word_helpers_normalise_whitespace() {
    let words = split_words("  The quick\tbrown \n fox ");
    assert_eq!(words, vec!["The", "quick", "brown", "fox"]);
    assert_eq!(join_words(&words), "The quick brown fox");
}
