//! 超网络打分器 (HYPERNET)
//!
//! 词经固定嵌入表映射为条件向量; 共享超网络把条件向量变换为
//! 线性打分单元的有效权重 `[w..., b]`, 再作用到特征向量:
//! `score = sigmoid(w . x + b)`。
//!
//! 没有 "无子网络" 失败模式 —— 只有词不在嵌入词表时报 `UnknownWord`。

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vq_core::{Result, VqaError};

use crate::embedding::WordEmbeddings;
use crate::mlp::{sigmoid, Mlp};
use crate::NeuralScorer;

/// 超网络模型文件内容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypernetModel {
    /// 特征向量维度 (生成的权重向量长度 = feature_dim + 1)
    pub feature_dim: usize,
    /// 嵌入 -> 有效权重 的共享网络
    pub hyper: Mlp,
}

/// 超网络打分器
pub struct HypernetScorer {
    embeddings: WordEmbeddings,
    model: HypernetModel,
}

impl HypernetScorer {
    /// 从词表、嵌入、模型三个文件装载
    pub fn load(words: &Path, embeddings: &Path, models: &Path) -> Result<Self> {
        let embeddings = WordEmbeddings::load(words, embeddings)?;
        let file = File::open(models)?;
        let model: HypernetModel = serde_json::from_reader(BufReader::new(file))?;
        debug!(
            vocabulary = embeddings.len(),
            feature_dim = model.feature_dim,
            "hypernet scorer loaded"
        );
        Ok(Self { embeddings, model })
    }

    /// 直接构造 (测试用)
    pub fn from_parts(embeddings: WordEmbeddings, model: HypernetModel) -> Self {
        Self { embeddings, model }
    }
}

impl NeuralScorer for HypernetScorer {
    fn score(&self, features: &[f32], word: &str) -> Result<f32> {
        let embedding = self
            .embeddings
            .vector(word)
            .ok_or_else(|| VqaError::UnknownWord(word.to_string()))?;

        if features.len() != self.model.feature_dim {
            return Err(VqaError::Model(format!(
                "hypernet expects feature dim {}, got {}",
                self.model.feature_dim,
                features.len()
            )));
        }

        let params = self.model.hyper.forward(embedding)?;
        if params.len() != self.model.feature_dim + 1 {
            return Err(VqaError::Model(format!(
                "hypernet generated {} params, expected {}",
                params.len(),
                self.model.feature_dim + 1
            )));
        }

        let (weights, bias) = params.split_at(self.model.feature_dim);
        let z: f32 = weights.iter().zip(features).map(|(w, x)| w * x).sum::<f32>() + bias[0];
        Ok(sigmoid(z))
    }
}
