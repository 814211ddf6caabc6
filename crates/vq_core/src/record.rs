//! 问题记录定义
//!
//! 每行一条问题记录, `::` 分隔五个字段:
//! `questionId::questionType::question::imageId::answer`。

use serde::{Deserialize, Serialize};

use crate::error::{Result, VqaError};

/// 问题类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QuestionType {
    /// 是非题: 单一真值计算
    YesNo,
    /// 开放题: 结构化结果计算 (属性/对象/区域三元组)
    Other,
}

impl QuestionType {
    /// 从记录字段解析 ("yes/no" 之外的一切类型都按开放题处理)
    pub fn from_token(token: &str) -> Self {
        if token == "yes/no" {
            QuestionType::YesNo
        } else {
            QuestionType::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::YesNo => "yes/no",
            QuestionType::Other => "other",
        }
    }
}

/// 问题记录 (读入后不可变)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// 问题 ID
    pub question_id: String,
    /// 问题类型
    pub question_type: QuestionType,
    /// 问题文本
    pub question: String,
    /// 图像 ID
    pub image_id: u64,
    /// 标准答案 (评测用)
    pub answer: String,
}

impl QuestionRecord {
    /// 从一行文本解析记录
    pub fn from_line(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.splitn(5, "::").collect();
        if fields.len() != 5 {
            return Err(VqaError::RecordParse(format!(
                "expected 5 '::'-separated fields, got {}: {}",
                fields.len(),
                line
            )));
        }

        let image_id = fields[3].trim().parse::<u64>().map_err(|_| {
            VqaError::RecordParse(format!("invalid image id: {}", fields[3]))
        })?;

        Ok(Self {
            question_id: fields[0].to_string(),
            question_type: QuestionType::from_token(fields[1]),
            question: fields[2].to_string(),
            image_id,
            answer: fields[4].to_string(),
        })
    }

    /// 生成单问题结果行: `questionId::question::answer::gold::imageId`
    pub fn result_line(&self, answer: &str) -> String {
        format!(
            "{}::{}::{}::{}::{}",
            self.question_id, self.question, answer, self.answer, self.image_id
        )
    }
}
