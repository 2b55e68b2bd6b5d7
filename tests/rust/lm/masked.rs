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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ziaug::lm::ZiPretrainedMaskedLM;
use ziaug::{
    Result, ZiError, ZiLanguageModel, ZiMaskedLM, ZiMaskedLMConfig, ZiMaskedLMFamily,
    ZiMaskedLMModel, ZiScoreVector, ZiSelectionConfig, ZiSelectionMode, ZiWordPieceTokenizer,
};

const BERT_VOCAB: &[&str] = &[
    "[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "the", "quick", "brown", "fox", "jumps",
    "dog", "##s", ",", "cat",
];

fn bert_tokenizer() -> ZiWordPieceTokenizer {
    ZiWordPieceTokenizer::from_tokens(BERT_VOCAB.iter().copied(), true).unwrap()
}

fn id_of(token: &str) -> usize {
    BERT_VOCAB.iter().position(|t| *t == token).unwrap()
}

/// Returns the same scores for every position and remembers its inputs.
#[derive(Default)]
struct FixedModel {
    scores: Vec<f32>,
    calls: AtomicUsize,
    last_input: Mutex<Vec<u32>>,
}

impl FixedModel {
    fn peaked(size: usize, peaks: &[(usize, f32)]) -> Self {
        let mut scores = vec![0.0; size];
        for &(idx, score) in peaks {
            scores[idx] = score;
        }
        Self {
            scores,
            ..Default::default()
        }
    }
}

impl ZiMaskedLMModel for FixedModel {
    fn forward(&self, input_ids: &[u32], attention_mask: &[u32]) -> Result<Vec<ZiScoreVector>> {
        assert_eq!(input_ids.len(), attention_mask.len());
        assert!(attention_mask.iter().all(|&m| m == 1));
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = input_ids.to_vec();
        Ok(vec![self.scores.clone(); input_ids.len()])
    }
}

struct FailingModel;

impl ZiMaskedLMModel for FailingModel {
    fn forward(&self, _: &[u32], _: &[u32]) -> Result<Vec<ZiScoreVector>> {
        Err(ZiError::inference("device lost"))
    }
}

struct TruncatingModel;

impl ZiMaskedLMModel for TruncatingModel {
    fn forward(&self, _: &[u32], _: &[u32]) -> Result<Vec<ZiScoreVector>> {
        Ok(vec![vec![0.0; BERT_VOCAB.len()]])
    }
}

fn rank_config(top_k: Option<usize>) -> ZiMaskedLMConfig {
    ZiMaskedLMConfig {
        selection: ZiSelectionConfig {
            temperature: 1.0,
            top_k,
            top_p: None,
            mode: ZiSelectionMode::Rank,
        },
        ..Default::default()
    }
}

#[test]
fn predicts_the_highest_scoring_word_for_the_mask() {
    let model = FixedModel::peaked(BERT_VOCAB.len(), &[(id_of("fox"), 9.0), (id_of("dog"), 5.0)]);
    let config = ZiMaskedLMConfig {
        selection: ZiSelectionConfig {
            temperature: 1.0,
            top_k: Some(1),
            ..Default::default()
        },
        ..Default::default()
    };
    let lm = ZiMaskedLM::new(bert_tokenizer(), model, config).unwrap();

    let out = lm
        .predict("The quick brown [MASK] jumps", None, 1)
        .unwrap()
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].token, "fox");
    assert_eq!(out[0].id as usize, id_of("fox"));
}

#[test]
fn input_is_wrapped_in_start_and_separator_tokens() {
    let model = Arc::new(FixedModel::peaked(BERT_VOCAB.len(), &[(id_of("dog"), 3.0)]));
    let lm = ZiMaskedLM::new(bert_tokenizer(), Arc::clone(&model), rank_config(None)).unwrap();

    lm.predict("the [MASK]", None, 1).unwrap();

    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    let expected: Vec<u32> = ["[CLS]", "the", "[MASK]", "[SEP]"]
        .iter()
        .map(|t| id_of(t) as u32)
        .collect();
    assert_eq!(*model.last_input.lock().unwrap(), expected);
}

#[test]
fn missing_mask_is_a_validation_error() {
    let lm = ZiMaskedLM::new(
        bert_tokenizer(),
        FixedModel::peaked(BERT_VOCAB.len(), &[]),
        rank_config(None),
    )
    .unwrap();
    match lm.predict("the quick fox", None, 1) {
        Err(ZiError::Validation { message }) => assert!(message.contains("[MASK]")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn zero_candidates_is_a_validation_error() {
    let lm = ZiMaskedLM::new(
        bert_tokenizer(),
        FixedModel::peaked(BERT_VOCAB.len(), &[]),
        rank_config(None),
    )
    .unwrap();
    assert!(matches!(
        lm.predict("the [MASK]", None, 0),
        Err(ZiError::Validation { .. })
    ));
}

#[test]
fn inference_failures_propagate_unchanged() {
    let lm = ZiMaskedLM::new(bert_tokenizer(), FailingModel, rank_config(None)).unwrap();
    match lm.predict("the [MASK]", None, 1) {
        Err(ZiError::Inference { message }) => assert_eq!(message, "device lost"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn short_model_output_is_an_inference_error() {
    let lm = ZiMaskedLM::new(bert_tokenizer(), TruncatingModel, rank_config(None)).unwrap();
    assert!(matches!(
        lm.predict("the [MASK]", None, 1),
        Err(ZiError::Inference { .. })
    ));
}

#[test]
fn construction_checks_special_tokens_and_selection() {
    let no_mask = ZiWordPieceTokenizer::from_tokens(["[UNK]", "[CLS]", "[SEP]", "fox"], true).unwrap();
    assert!(matches!(
        ZiMaskedLM::new(no_mask, FixedModel::default(), ZiMaskedLMConfig::default()),
        Err(ZiError::Configuration { .. })
    ));

    let mut config = ZiMaskedLMConfig::default();
    config.selection.temperature = 0.0;
    assert!(matches!(
        ZiMaskedLM::new(bert_tokenizer(), FixedModel::default(), config),
        Err(ZiError::Configuration { .. })
    ));
}

#[test]
fn subword_pieces_and_punctuation_are_skipped_unless_allowed() {
    let peaks = [(id_of("##s"), 9.0), (id_of(","), 8.0), (id_of("dog"), 7.0)];

    let strict = ZiMaskedLM::new(
        bert_tokenizer(),
        FixedModel::peaked(BERT_VOCAB.len(), &peaks),
        rank_config(Some(3)),
    )
    .unwrap();
    let out = strict.predict("the [MASK]", None, 3).unwrap().unwrap();
    let tokens: Vec<&str> = out.iter().map(|c| c.token.as_str()).collect();
    assert_eq!(tokens, vec!["dog"]);

    let relaxed = ZiMaskedLM::new(
        bert_tokenizer(),
        FixedModel::peaked(BERT_VOCAB.len(), &peaks),
        ZiMaskedLMConfig {
            allow_subwords: true,
            include_punctuation: true,
            ..rank_config(Some(3))
        },
    )
    .unwrap();
    let out = relaxed.predict("the [MASK]", None, 3).unwrap().unwrap();
    let tokens: Vec<&str> = out.iter().map(|c| c.token.as_str()).collect();
    assert_eq!(tokens, vec!["##s", ",", "dog"]);
}

#[test]
fn no_usable_candidate_is_none_not_an_error() {
    let lm = ZiMaskedLM::new(
        bert_tokenizer(),
        FixedModel::peaked(BERT_VOCAB.len(), &[(id_of("##s"), 9.0)]),
        rank_config(Some(1)),
    )
    .unwrap();
    assert_eq!(lm.predict("the [MASK]", None, 1).unwrap(), None);
}

#[test]
fn target_word_lookup_uses_the_vocabulary_spelling() {
    let lm = ZiMaskedLM::new(
        bert_tokenizer(),
        FixedModel::peaked(BERT_VOCAB.len(), &[(id_of("fox"), 9.0), (id_of("cat"), 2.5)]),
        rank_config(Some(1)),
    )
    .unwrap();

    let out = lm.predict("the [MASK]", Some("Cat"), 5).unwrap().unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].token, "cat");
    assert_eq!(out[0].score, 2.5);

    assert_eq!(lm.predict("the [MASK]", Some("zebra"), 1).unwrap(), None);
}

#[test]
fn seeded_predictions_are_reproducible() {
    let peaks: Vec<(usize, f32)> = (5..BERT_VOCAB.len()).map(|i| (i, 1.0)).collect();
    let lm = ZiMaskedLM::new(
        bert_tokenizer(),
        FixedModel::peaked(BERT_VOCAB.len(), &peaks),
        ZiMaskedLMConfig {
            seed: Some(42),
            ..Default::default()
        },
    )
    .unwrap();

    let first = lm.predict("the quick [MASK]", None, 3).unwrap();
    let second = lm.predict("the quick [MASK]", None, 3).unwrap();
    assert_eq!(first, second);
}

#[test]
fn word_start_families_report_surface_forms() {
    let vocab = ["[CLS]", "[SEP]", "[MASK]", "[UNK]", "the", "cat", "\u{0120}dog", "\u{0120}cat"];
    let tokenizer = ZiWordPieceTokenizer::from_tokens(vocab, true).unwrap();
    let mut scores = vec![0.0; vocab.len()];
    scores[5] = 9.0;
    scores[6] = 8.0;
    scores[7] = 1.0;
    let model = FixedModel {
        scores,
        ..Default::default()
    };
    let config = ZiMaskedLMConfig {
        family: ZiMaskedLMFamily::ModernBert,
        ..rank_config(Some(2))
    };
    let lm: Arc<dyn ZiLanguageModel> = Arc::new(ZiMaskedLM::new(tokenizer, model, config).unwrap());

    let out = lm.predict("the [MASK]", None, 2).unwrap().unwrap();
    let tokens: Vec<&str> = out.iter().map(|c| c.token.as_str()).collect();
    assert_eq!(tokens, vec!["dog"]);

    let target = lm.predict("the [MASK]", Some("cat"), 1).unwrap().unwrap();
    assert_eq!(target[0].id, 7);
    assert_eq!(target[0].token, "cat");

    assert_eq!(lm.id2token(6).as_deref(), Some("\u{0120}dog"));
    assert!(lm.is_skip_candidate("cat"));
    assert!(!lm.is_skip_candidate("\u{0120}cat"));
    assert_eq!(lm.mask_token(), "[MASK]");
}

#[cfg(not(feature = "candle"))]
#[test]
fn pretrained_loading_requires_the_candle_feature() {
    match ZiPretrainedMaskedLM::from_pretrained(
        "answerdotai/ModernBERT-base",
        ZiMaskedLMConfig::default(),
        true,
    ) {
        Err(ZiError::MissingDependency { dependency, .. }) => assert_eq!(dependency, "candle"),
        other => panic!("unexpected result: {other:?}"),
    }
}
