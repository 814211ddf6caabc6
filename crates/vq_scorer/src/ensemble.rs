//! 词表集成打分器 (MULTIDNN)
//!
//! 模型文件是 JSON: 词 -> 该词专属子网络。没有子网络的词
//! 返回 `UnknownWord`, 调用方按 "无证据" 处理而不是崩溃。

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use vq_core::{Result, VqaError};

use crate::mlp::Mlp;
use crate::NeuralScorer;

/// 词表集成打分器
pub struct EnsembleScorer {
    nets: HashMap<String, Mlp>,
}

impl EnsembleScorer {
    /// 从 JSON 模型文件装载
    pub fn load(models: &Path) -> Result<Self> {
        let file = File::open(models)?;
        let nets: HashMap<String, Mlp> = serde_json::from_reader(BufReader::new(file))?;
        debug!(words = nets.len(), "ensemble scorer loaded");
        Ok(Self { nets })
    }

    /// 直接从网络映射构造 (测试用)
    pub fn from_nets(nets: HashMap<String, Mlp>) -> Self {
        Self { nets }
    }

    /// 词表大小
    pub fn vocabulary_size(&self) -> usize {
        self.nets.len()
    }
}

impl NeuralScorer for EnsembleScorer {
    fn score(&self, features: &[f32], word: &str) -> Result<f32> {
        let net = self
            .nets
            .get(word)
            .ok_or_else(|| VqaError::UnknownWord(word.to_string()))?;
        let output = net.forward(features)?;
        let value = output
            .first()
            .copied()
            .ok_or_else(|| VqaError::Model(format!("empty network output for {word}")))?;
        Ok(value.clamp(0.0, 1.0))
    }
}
