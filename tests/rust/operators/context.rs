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
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use serde_json::json;
use ziaug::operator::ZiOperator;
use ziaug::operators::context::{augment_context_word_factory, context_word_with_model};
use ziaug::{
    execute_operator, Result, ZiAugmentContextWord, ZiCandidate, ZiContextWordAction,
    ZiContextWordConfig, ZiError, ZiFieldPath, ZiLanguageModel, ZiMaskedLM, ZiMaskedLMConfig,
    ZiMaskedLMModel, ZiRecord, ZiScoreVector, ZiSelectionConfig, ZiSelectionMode,
    ZiWordPieceTokenizer,
};

/// Answers every mask with a fixed list of words, best first.
#[derive(Debug)]
struct Scripted {
    replies: Vec<&'static str>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(replies: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            replies: replies.to_vec(),
            calls: AtomicUsize::new(0),
        })
    }
}

impl ZiLanguageModel for Scripted {
    fn predict(&self, text: &str, target: Option<&str>, n: usize) -> Result<Option<Vec<ZiCandidate>>> {
        self.predict_with_rng(text, target, n, &mut SmallRng::seed_from_u64(0))
    }

    fn predict_with_rng(
        &self,
        text: &str,
        _: Option<&str>,
        n: usize,
        _: &mut dyn RngCore,
    ) -> Result<Option<Vec<ZiCandidate>>> {
        assert!(text.contains("[MASK]"), "no mask in {text}");
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.replies.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            self.replies
                .iter()
                .take(n)
                .enumerate()
                .map(|(id, token)| ZiCandidate {
                    id: id as u32,
                    token: token.to_string(),
                    score: 1.0,
                    probability: 1.0 / self.replies.len() as f32,
                })
                .collect(),
        ))
    }

    fn id2token(&self, id: u32) -> Option<String> {
        self.replies.get(id as usize).map(|t| t.to_string())
    }

    fn is_skip_candidate(&self, _: &str) -> bool {
        false
    }

    fn mask_token(&self) -> &str {
        "[MASK]"
    }
}

#[derive(Debug)]
struct Broken;

impl ZiLanguageModel for Broken {
    fn predict(&self, _: &str, _: Option<&str>, _: usize) -> Result<Option<Vec<ZiCandidate>>> {
        Err(ZiError::inference("out of memory"))
    }

    fn predict_with_rng(
        &self,
        _: &str,
        _: Option<&str>,
        _: usize,
        _: &mut dyn RngCore,
    ) -> Result<Option<Vec<ZiCandidate>>> {
        Err(ZiError::inference("out of memory"))
    }

    fn id2token(&self, _: u32) -> Option<String> {
        None
    }

    fn is_skip_candidate(&self, _: &str) -> bool {
        true
    }

    fn mask_token(&self) -> &str {
        "[MASK]"
    }
}

fn operator(model: Arc<dyn ZiLanguageModel>, config: ZiContextWordConfig) -> ZiAugmentContextWord {
    ZiAugmentContextWord::new(ZiFieldPath::parse("payload.text").unwrap(), model, config).unwrap()
}

fn everything() -> ZiContextWordConfig {
    ZiContextWordConfig {
        aug_p: 1.0,
        aug_max: None,
        ..Default::default()
    }
}

#[test]
fn substitute_replaces_words_with_candidates() {
    let op = operator(Scripted::new(&["swift"]), everything());
    let mut rng = SmallRng::seed_from_u64(1);
    assert_eq!(op.augment_text("quick fox", &mut rng).unwrap(), "swift swift");
}

#[test]
fn candidates_equal_to_the_original_are_discarded() {
    let op = operator(Scripted::new(&["FOX", "dog"]), everything());
    let mut rng = SmallRng::seed_from_u64(1);
    assert_eq!(op.augment_text("fox", &mut rng).unwrap(), "dog");

    let only_original = operator(Scripted::new(&["fox"]), everything());
    assert_eq!(only_original.augment_text("fox", &mut rng).unwrap(), "fox");

    let silent = operator(Scripted::new(&[]), everything());
    assert_eq!(silent.augment_text("fox", &mut rng).unwrap(), "fox");
}

#[test]
fn insert_adds_a_word_before_each_position() {
    let op = operator(
        Scripted::new(&["very"]),
        ZiContextWordConfig {
            action: ZiContextWordAction::Insert,
            ..everything()
        },
    );
    let mut rng = SmallRng::seed_from_u64(1);
    assert_eq!(
        op.augment_text("quick fox", &mut rng).unwrap(),
        "very quick very fox"
    );
}

#[test]
fn punctuation_and_stopwords_are_left_alone() {
    let model = Scripted::new(&["x"]);
    let op = operator(
        model.clone(),
        ZiContextWordConfig {
            stopwords: vec!["the".to_string()],
            ..everything()
        },
    );
    let mut rng = SmallRng::seed_from_u64(1);
    assert_eq!(
        op.augment_text("The fox , the dog !", &mut rng).unwrap(),
        "The x , the x !"
    );
    assert_eq!(model.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn apply_is_deterministic_and_marks_records() {
    let model: Arc<dyn ZiLanguageModel> = Scripted::new(&["alpha", "beta", "gamma"]);
    let op = operator(model, ZiContextWordConfig::default());

    let batch: Vec<ZiRecord> = (0..32)
        .map(|i| ZiRecord::new(Some(i.to_string()), json!({"text": "one two three four five"})))
        .collect();
    let first = op.apply(batch.clone()).unwrap();
    let second = op.apply(batch).unwrap();

    assert_eq!(first, second);
    for record in &first {
        assert!(record.is_augmented());
        assert_eq!(
            record.metadata.as_ref().unwrap()["augmentation_method"],
            json!("augment.context_word")
        );
    }
}

#[test]
fn model_failures_surface_as_operator_errors() {
    let op = operator(Arc::new(Broken), everything());
    let batch = vec![ZiRecord::new(None, json!({"text": "quick fox"}))];
    match execute_operator(&op, batch) {
        Err(ZiError::Operator { operator, message }) => {
            assert_eq!(operator, "augment.context_word");
            assert!(message.contains("out of memory"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn works_with_the_masked_lm_adapter() {
    struct CatLover;

    impl ZiMaskedLMModel for CatLover {
        fn forward(&self, input_ids: &[u32], _: &[u32]) -> Result<Vec<ZiScoreVector>> {
            let mut scores = vec![0.0; 11];
            scores[9] = 5.0;
            scores[8] = 4.0;
            Ok(vec![scores; input_ids.len()])
        }
    }

    let tokenizer = ZiWordPieceTokenizer::from_tokens(
        [
            "[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "the", "quick", "brown", "fox", "cat",
            "jumps",
        ],
        true,
    )
    .unwrap();
    let config = ZiMaskedLMConfig {
        selection: ZiSelectionConfig {
            mode: ZiSelectionMode::Rank,
            ..Default::default()
        },
        ..Default::default()
    };
    let lm: Arc<dyn ZiLanguageModel> = Arc::new(ZiMaskedLM::new(tokenizer, CatLover, config).unwrap());

    let op = context_word_with_model(
        lm,
        &json!({
            "path": "payload.text",
            "aug_p": 1.0,
            "stopwords": ["the", "quick", "brown", "jumps"]
        }),
    )
    .unwrap();
    let out = op
        .apply(vec![
            ZiRecord::new(None, json!({"text": "the quick brown fox jumps"})),
            ZiRecord::new(None, json!({"text": "the quick brown cat jumps"})),
        ])
        .unwrap();
    assert_eq!(out[0].payload["text"], json!("the quick brown cat jumps"));
    assert_eq!(out[1].payload["text"], json!("the quick brown fox jumps"));
}

#[test]
fn factory_and_constructor_validate_configuration() {
    assert!(matches!(
        augment_context_word_factory(&json!({"path": "payload.text"})),
        Err(ZiError::Validation { .. })
    ));

    let model: Arc<dyn ZiLanguageModel> = Scripted::new(&["x"]);
    assert!(matches!(
        context_word_with_model(model.clone(), &json!({"path": "payload.text", "candidates": 0})),
        Err(ZiError::Configuration { .. })
    ));
    assert!(matches!(
        context_word_with_model(model, &json!({"path": "payload.text", "action": "delete"})),
        Err(ZiError::Validation { .. })
    ));
}

#[cfg(not(feature = "candle"))]
#[test]
fn factory_reports_the_missing_backend() {
    let result = augment_context_word_factory(&json!({
        "path": "payload.text",
        "model_path": "answerdotai/ModernBERT-base"
    }));
    assert!(matches!(result, Err(ZiError::MissingDependency { .. })));
}
