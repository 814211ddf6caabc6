//! 问答编排器
//!
//! 每问题状态机: 开作用域 -> 装事实 -> 翻译 -> 求值 -> 作答 -> 关作用域。
//! 作用域内任何失败都在单问题边界捕获并记日志, 按放弃处理, 运行继续;
//! 帧弹出在所有退出路径上执行 (含提前放弃)。
//!
//! 严格串行: 一个问题完整开-评-关后才轮到下一个, 这是帧栈事实库的要求。

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, warn};

use vq_core::{QuestionRecord, QuestionType, Result, VqaError};
use vq_facts::FactStore;
use vq_features::FeatureStore;
use vq_scorer::NeuralScorer;

use crate::bridge::{QueryEngine, QuestionTranslator};
use crate::oracle::CachingOracle;
use crate::ranking::{self, Candidate};
use crate::stats::Statistics;

/// 问答流水线
pub struct VqaPipeline<B> {
    features: FeatureStore,
    scorer: Box<dyn NeuralScorer>,
    bridge: B,
    facts: FactStore,
    stats: Statistics,
}

impl<B> VqaPipeline<B>
where
    B: QuestionTranslator + QueryEngine,
{
    pub fn new(
        features: FeatureStore,
        scorer: Box<dyn NeuralScorer>,
        bridge: B,
        facts: FactStore,
    ) -> Self {
        Self {
            features,
            scorer,
            bridge,
            facts,
            stats: Statistics::new(),
        }
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn facts(&self) -> &FactStore {
        &self.facts
    }

    /// 拆出桥接 (运行结束后停机用)
    pub fn into_bridge(self) -> B {
        self.bridge
    }

    /// 处理单个问题, 产出答案则返回之
    pub async fn answer_question(&mut self, record: &QuestionRecord) -> Option<String> {
        debug!(question_id = %record.question_id, question = %record.question, "processing question");
        self.stats.on_question();

        self.facts.push();
        let outcome = self.answer_in_scope(record).await;
        // 所有退出路径都走到这里弹帧; 栈在本方法内配平, 下溢即编程错误
        self.facts.pop().expect("question scope must be balanced");

        match outcome {
            Ok(answer) => {
                self.stats.on_answer(&answer, &record.answer);
                println!("{}", record.result_line(&answer));
                Some(answer)
            }
            Err(e) => {
                warn!(question_id = %record.question_id, error = %e, "question abandoned");
                None
            }
        }
    }

    /// 作用域内的主干: 装事实 -> 翻译 -> 按题型求值
    async fn answer_in_scope(&mut self, record: &QuestionRecord) -> Result<String> {
        for (region, features) in self.features.load(record.image_id)?.into_iter().enumerate() {
            self.facts.insert_region(region, features);
        }

        let query = self
            .bridge
            .translate(&record.question)
            .await?
            .ok_or_else(|| VqaError::TranslationFailure(record.question.clone()))?;
        debug!(%query, "question translated");

        match record.question_type {
            QuestionType::YesNo => self.answer_yes_no(&query).await,
            QuestionType::Other => self.answer_open(&query).await,
        }
    }

    /// 是非题: 单一真值, >= 0.5 为 "yes" (边界含)
    async fn answer_yes_no(&mut self, query: &str) -> Result<String> {
        let mut oracle = CachingOracle::new(&mut self.facts, self.scorer.as_ref());
        let truth = self.bridge.evaluate(query, &mut oracle).await?;
        debug!(truth, "yes/no query evaluated");
        let answer = if truth >= 0.5 { "yes" } else { "no" };
        Ok(answer.to_string())
    }

    /// 开放题: 求值得三元组, 读缓存打分构造候选, 排序取最高者的属性名
    async fn answer_open(&mut self, query: &str) -> Result<String> {
        let bindings = {
            let mut oracle = CachingOracle::new(&mut self.facts, self.scorer.as_ref());
            self.bridge.execute(query, &mut oracle).await?
        };
        debug!(results = bindings.len(), "open query executed");
        if bindings.is_empty() {
            return Err(VqaError::EmptyResultSet);
        }

        let mut candidates = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let attribute = self.facts.concept(&binding.attribute);
            let object = self.facts.concept(&binding.object);
            let attribute_score = self.facts.score(binding.region, attribute).unwrap_or_else(|| {
                warn!(region = binding.region, word = %binding.attribute, "no cached score");
                0.0
            });
            let object_score = self.facts.score(binding.region, object).unwrap_or_else(|| {
                warn!(region = binding.region, word = %binding.object, "no cached score");
                0.0
            });
            candidates.push(Candidate {
                region: binding.region,
                attribute: binding.attribute,
                object: binding.object,
                attribute_score,
                object_score,
            });
        }

        for candidate in &candidates {
            debug!(%candidate, "candidate");
        }

        let best = ranking::best(&candidates).ok_or(VqaError::EmptyResultSet)?;
        Ok(best.attribute.clone())
    }

    /// 逐行处理问题文件; 坏行跳过记日志, 运行继续
    pub async fn run_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::open(path.as_ref())?;
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = match QuestionRecord::from_line(&line) {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "skipping malformed question line");
                    continue;
                }
            };
            self.answer_question(&record).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;

    use async_trait::async_trait;

    use vq_facts::RegionId;
    use vq_features::FeatureSource;

    use crate::bridge::ResultBinding;
    use crate::oracle::ScoreOracle;

    /// 固定词打分器, 词表外报 UnknownWord
    struct ConstScorer {
        scores: HashMap<String, f32>,
    }

    impl ConstScorer {
        fn new(pairs: &[(&str, f32)]) -> Self {
            Self {
                scores: pairs
                    .iter()
                    .map(|(word, score)| (word.to_string(), *score))
                    .collect(),
            }
        }
    }

    impl NeuralScorer for ConstScorer {
        fn score(&self, _features: &[f32], word: &str) -> vq_core::Result<f32> {
            self.scores
                .get(word)
                .copied()
                .ok_or_else(|| VqaError::UnknownWord(word.to_string()))
        }
    }

    /// 可编程桥接替身: 翻译结果、打分回调序列、终结应答都可注入
    struct MockBridge {
        query: Option<String>,
        truth: f64,
        bindings: Vec<ResultBinding>,
        score_requests: Vec<(RegionId, String)>,
    }

    impl MockBridge {
        fn yes_no(truth: f64) -> Self {
            Self {
                query: Some("(truth-query)".to_string()),
                truth,
                bindings: Vec::new(),
                score_requests: Vec::new(),
            }
        }

        fn declines() -> Self {
            Self {
                query: None,
                truth: 0.0,
                bindings: Vec::new(),
                score_requests: Vec::new(),
            }
        }

        fn open(bindings: Vec<ResultBinding>, score_requests: Vec<(RegionId, String)>) -> Self {
            Self {
                query: Some("(bind-query)".to_string()),
                truth: 0.0,
                bindings,
                score_requests,
            }
        }
    }

    #[async_trait]
    impl QuestionTranslator for MockBridge {
        async fn translate(&mut self, _question: &str) -> vq_core::Result<Option<String>> {
            Ok(self.query.clone())
        }
    }

    #[async_trait]
    impl QueryEngine for MockBridge {
        async fn evaluate(
            &mut self,
            _query: &str,
            oracle: &mut dyn ScoreOracle,
        ) -> vq_core::Result<f64> {
            for (region, word) in &self.score_requests {
                oracle.score(*region, word);
            }
            Ok(self.truth)
        }

        async fn execute(
            &mut self,
            _query: &str,
            oracle: &mut dyn ScoreOracle,
        ) -> vq_core::Result<Vec<ResultBinding>> {
            for (region, word) in &self.score_requests {
                oracle.score(*region, word);
            }
            Ok(self.bindings.clone())
        }
    }

    /// 三区域特征文件, 图像 ID 7
    fn feature_fixture() -> (PathBuf, FeatureStore) {
        let dir = std::env::temp_dir().join(format!("vq_pipeline_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let store = FeatureStore::new(FeatureSource::Directory(dir.clone()), "img_");
        let mut file = File::create(dir.join(store.file_name(7))).unwrap();
        file.write_all(
            b"0 0 0 0 0 0 0 0 0 0 0.1 0.2\n\
              0 0 0 0 0 0 0 0 0 0 0.3 0.4\n\
              0 0 0 0 0 0 0 0 0 0 0.5 0.6\n",
        )
        .unwrap();
        (dir, store)
    }

    fn pipeline(bridge: MockBridge, scorer: ConstScorer) -> (PathBuf, VqaPipeline<MockBridge>) {
        let (dir, features) = feature_fixture();
        (
            dir,
            VqaPipeline::new(features, Box::new(scorer), bridge, FactStore::new()),
        )
    }

    fn yes_no_record() -> QuestionRecord {
        QuestionRecord::from_line("1::yes/no::Is the sky blue?::7::yes").unwrap()
    }

    fn open_record(gold: &str) -> QuestionRecord {
        QuestionRecord::from_line(&format!("2::other::What color is the car?::7::{gold}"))
            .unwrap()
    }

    #[tokio::test]
    async fn test_yes_no_truth_boundary() {
        for (truth, expected) in [(0.73, "yes"), (0.42, "no"), (0.5, "yes")] {
            let (dir, mut pipeline) =
                pipeline(MockBridge::yes_no(truth), ConstScorer::new(&[]));
            let answer = pipeline.answer_question(&yes_no_record()).await;
            assert_eq!(answer.as_deref(), Some(expected), "truth {truth}");
            assert_eq!(pipeline.stats().answered(), 1);
            std::fs::remove_dir_all(dir).unwrap();
        }
    }

    #[tokio::test]
    async fn test_translator_decline_abandons_but_run_continues() {
        let (dir, mut pipeline) = pipeline(MockBridge::declines(), ConstScorer::new(&[]));

        assert!(pipeline.answer_question(&yes_no_record()).await.is_none());
        assert_eq!(pipeline.stats().processed(), 1);
        assert_eq!(pipeline.stats().answered(), 0);
        // 作用域已关闭, 区域事实不可见
        assert_eq!(pipeline.facts().depth(), 0);
        assert!(pipeline.facts().region_features(0).is_none());

        // 下一个问题照常处理
        assert!(pipeline.answer_question(&yes_no_record()).await.is_none());
        assert_eq!(pipeline.stats().processed(), 2);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_open_question_tie_breaks_on_attribute() {
        let bindings = vec![
            ResultBinding {
                region: 0,
                attribute: "red".to_string(),
                object: "car".to_string(),
            },
            ResultBinding {
                region: 1,
                attribute: "blue".to_string(),
                object: "cab".to_string(),
            },
            ResultBinding {
                region: 2,
                attribute: "green".to_string(),
                object: "dog".to_string(),
            },
        ];
        let score_requests = vec![
            (0, "red".to_string()),
            (0, "car".to_string()),
            (1, "blue".to_string()),
            (1, "cab".to_string()),
            (2, "green".to_string()),
            (2, "dog".to_string()),
        ];
        let scorer = ConstScorer::new(&[
            ("red", 0.1),
            ("car", 0.9),
            ("blue", 0.5),
            ("cab", 0.9),
            ("green", 0.99),
            ("dog", 0.2),
        ]);

        let (dir, mut pipeline) =
            pipeline(MockBridge::open(bindings, score_requests), scorer);
        let answer = pipeline.answer_question(&open_record("blue")).await;
        // 对象分并列 (0.9 vs 0.9), 属性分破并列
        assert_eq!(answer.as_deref(), Some("blue"));
        assert_eq!(pipeline.stats().correct(), 1);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_empty_result_set_is_unanswerable() {
        let (dir, mut pipeline) = pipeline(
            MockBridge::open(Vec::new(), Vec::new()),
            ConstScorer::new(&[]),
        );
        assert!(pipeline.answer_question(&open_record("red")).await.is_none());
        assert_eq!(pipeline.stats().processed(), 1);
        assert_eq!(pipeline.stats().answered(), 0);
        assert_eq!(pipeline.facts().depth(), 0);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_unknown_word_does_not_crash_question() {
        // 打分器对一切词报 UnknownWord, 回调折算 0.0, 问题照常作答
        let bridge = MockBridge {
            query: Some("(truth-query)".to_string()),
            truth: 0.7,
            bindings: Vec::new(),
            score_requests: vec![(0, "zebra".to_string())],
        };
        let (dir, mut pipeline) = pipeline(bridge, ConstScorer::new(&[]));
        let answer = pipeline.answer_question(&yes_no_record()).await;
        assert_eq!(answer.as_deref(), Some("yes"));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_missing_feature_file_abandons_question() {
        let (dir, mut pipeline) = pipeline(MockBridge::yes_no(0.9), ConstScorer::new(&[]));
        let record = QuestionRecord::from_line("9::yes/no::Is it real?::999::yes").unwrap();
        assert!(pipeline.answer_question(&record).await.is_none());
        assert_eq!(pipeline.stats().processed(), 1);
        assert_eq!(pipeline.stats().answered(), 0);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_run_from_file_skips_malformed_lines() {
        let (dir, mut pipeline) = pipeline(MockBridge::yes_no(0.8), ConstScorer::new(&[]));
        let questions = dir.join("questions.txt");
        File::create(&questions)
            .unwrap()
            .write_all(
                b"1::yes/no::Is the sky blue?::7::yes\n\
                  this line is garbage\n\
                  2::yes/no::Is the grass red?::7::no\n",
            )
            .unwrap();

        pipeline.run_from_file(&questions).await.unwrap();
        assert_eq!(pipeline.stats().processed(), 2);
        assert_eq!(pipeline.stats().answered(), 2);
        // 第一题答对 ("yes"), 第二题答错 (真值 0.8 -> "yes", 标准 "no")
        assert_eq!(pipeline.stats().correct(), 1);
        std::fs::remove_dir_all(dir).unwrap();
    }
}
