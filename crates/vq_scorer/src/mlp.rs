//! 多层感知机前向推理基座
//!
//! 只做推理, 不做训练: 权重从模型文件反序列化, 构造后不可变。

use serde::{Deserialize, Serialize};

use vq_core::{Result, VqaError};

/// 激活函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Identity,
    Relu,
    Sigmoid,
}

impl Activation {
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Identity => x,
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => sigmoid(x),
        }
    }
}

/// 标准 sigmoid, 输出落在 (0,1)
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// 全连接层: 行 = 输出单元, 列 = 输入维
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    pub activation: Activation,
}

impl DenseLayer {
    /// 单层前向
    pub fn forward(&self, input: &[f32]) -> Result<Vec<f32>> {
        if self.weights.len() != self.bias.len() {
            return Err(VqaError::Model(format!(
                "layer weight rows {} != bias len {}",
                self.weights.len(),
                self.bias.len()
            )));
        }

        let mut output = Vec::with_capacity(self.weights.len());
        for (row, bias) in self.weights.iter().zip(&self.bias) {
            if row.len() != input.len() {
                return Err(VqaError::Model(format!(
                    "layer expects input dim {}, got {}",
                    row.len(),
                    input.len()
                )));
            }
            let z: f32 = row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + bias;
            output.push(self.activation.apply(z));
        }
        Ok(output)
    }
}

/// 多层感知机
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mlp {
    pub layers: Vec<DenseLayer>,
}

impl Mlp {
    /// 逐层前向
    pub fn forward(&self, input: &[f32]) -> Result<Vec<f32>> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.forward(&current)?;
        }
        Ok(current)
    }
}
