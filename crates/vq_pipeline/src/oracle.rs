//! 打分回调
//!
//! 查询引擎求值期间对每个待验证的 (区域, 词) 对回调一次。
//! 结果先作为打分关联写入活动帧再返回, 同一对只打一次分。
//!
//! 打分器是显式注入的能力对象, 不是进程级单例。

use tracing::{error, warn};

use vq_core::VqaError;
use vq_facts::{FactStore, RegionId};
use vq_scorer::NeuralScorer;

/// 查询引擎可用的打分能力
pub trait ScoreOracle: Send {
    /// 对 (区域, 词) 给出 [0,1] 打分; 失败一律折算为 0.0 ("无证据")
    fn score(&mut self, region: RegionId, word: &str) -> f32;
}

/// 带缓存的打分回调: 命中打分关联直接返回, 未命中才跑神经网络
pub struct CachingOracle<'a> {
    facts: &'a mut FactStore,
    scorer: &'a dyn NeuralScorer,
}

impl<'a> CachingOracle<'a> {
    pub fn new(facts: &'a mut FactStore, scorer: &'a dyn NeuralScorer) -> Self {
        Self { facts, scorer }
    }
}

impl ScoreOracle for CachingOracle<'_> {
    fn score(&mut self, region: RegionId, word: &str) -> f32 {
        let concept = self.facts.concept(word);
        if let Some(cached) = self.facts.score(region, concept) {
            return cached;
        }

        let value = match self.facts.region_features(region) {
            Some(features) => match self.scorer.score(features, word) {
                Ok(value) => value,
                Err(VqaError::UnknownWord(word)) => {
                    // 无证据, 不是崩溃
                    warn!(region, word = %word, "no model for word, scoring 0.0");
                    0.0
                }
                Err(e) => {
                    error!(region, word, error = %e, "scorer failed, scoring 0.0");
                    0.0
                }
            },
            None => {
                error!(region, word, "no features for region, scoring 0.0");
                return 0.0;
            }
        };

        self.facts.assert_score(region, concept, value);
        value
    }
}
