//! 词嵌入表
//!
//! 词表文件一行一词; 嵌入文件一行一向量 (空白分隔浮点), 行序与词表对齐。

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use vq_core::{Result, VqaError};

/// 固定词嵌入表 (装载后不可变)
pub struct WordEmbeddings {
    index: HashMap<String, usize>,
    vectors: Vec<Vec<f32>>,
}

impl WordEmbeddings {
    /// 从词表 + 嵌入两个文件装载
    pub fn load(words_path: &Path, embeddings_path: &Path) -> Result<Self> {
        let words = read_lines(words_path)?;

        let mut vectors = Vec::with_capacity(words.len());
        for (line_no, line) in read_lines(embeddings_path)?.iter().enumerate() {
            let mut vector = Vec::new();
            for field in line.split_whitespace() {
                let value = field.parse::<f32>().map_err(|_| {
                    VqaError::Model(format!(
                        "embeddings line {}: bad number: {field}",
                        line_no + 1
                    ))
                })?;
                vector.push(value);
            }
            vectors.push(vector);
        }

        if words.len() != vectors.len() {
            return Err(VqaError::Model(format!(
                "words/embeddings row count mismatch: {} vs {}",
                words.len(),
                vectors.len()
            )));
        }

        let index = words
            .into_iter()
            .enumerate()
            .map(|(i, word)| (word, i))
            .collect::<HashMap<_, _>>();

        debug!(vocabulary = index.len(), "word embeddings loaded");
        Ok(Self { index, vectors })
    }

    /// 查词得嵌入向量, 词表外为 None
    pub fn vector(&self, word: &str) -> Option<&[f32]> {
        self.index
            .get(word)
            .map(|&i| self.vectors[i].as_slice())
    }

    /// 词表大小
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}
