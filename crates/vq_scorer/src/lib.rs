//! # vq_scorer - VisuaLoom Neural Scorer
//!
//! 契约: `score(featureVector, word) -> [0,1]`,
//! 表示 "这个区域描绘该概念的强度"。
//!
//! 两个封闭变体, 启动期一次性解析:
//! - [`EnsembleScorer`] (MULTIDNN): 词 -> 专属子网络的映射;
//! - [`HypernetScorer`] (HYPERNET): 词嵌入条件化的超网络, 动态生成打分权重。
//!
//! 打分器构造后无状态 (权重不可变), 调用之间无副作用。

pub mod embedding;
pub mod ensemble;
pub mod hypernet;
pub mod mlp;

use std::path::Path;

pub use embedding::WordEmbeddings;
pub use ensemble::EnsembleScorer;
pub use hypernet::HypernetScorer;
pub use mlp::{Activation, DenseLayer, Mlp};

use vq_core::{Result, VqaError};

/// 神经打分能力接口
pub trait NeuralScorer: Send + Sync {
    /// 对 (特征向量, 词) 给出 [0,1] 合理性打分
    fn score(&self, features: &[f32], word: &str) -> Result<f32>;
}

/// 打分器变体 (封闭集合)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerKind {
    /// 词表集成: 每词一个子网络
    MultiDnn,
    /// 超网络: 词嵌入条件化的共享网络
    Hypernet,
}

/// 按变体装载打分器 (启动期一次性解析)
///
/// `words` / `embeddings` 仅 Hypernet 变体需要。
pub fn load_scorer(
    kind: ScorerKind,
    models: &Path,
    words: Option<&Path>,
    embeddings: Option<&Path>,
) -> Result<Box<dyn NeuralScorer>> {
    match kind {
        ScorerKind::MultiDnn => Ok(Box::new(EnsembleScorer::load(models)?)),
        ScorerKind::Hypernet => {
            let words = words.ok_or_else(|| {
                VqaError::Model("hypernet scorer requires a words file".to_string())
            })?;
            let embeddings = embeddings.ok_or_else(|| {
                VqaError::Model("hypernet scorer requires an embeddings file".to_string())
            })?;
            Ok(Box::new(HypernetScorer::load(words, embeddings, models)?))
        }
    }
}
