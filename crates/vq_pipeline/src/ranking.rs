//! 开放题候选排序
//!
//! 双键全序: 对象打分降序为主键; 两者之差小于 [`SCORE_EPSILON`] 视为并列,
//! 以属性打分降序破并列。比较器显式喂给通用选取, 不做运算符重载。

use std::cmp::Ordering;
use std::fmt;

use vq_facts::RegionId;

/// 浮点并列判定阈值。承袭自原始实现的启发式常量, 可调, 并非保证正确的界。
pub const SCORE_EPSILON: f64 = 1e-6;

/// 候选三元组, 两个打分在构造时截取, 排序期间不重算
#[derive(Debug, Clone)]
pub struct Candidate {
    pub region: RegionId,
    pub attribute: String,
    pub object: String,
    pub attribute_score: f32,
    pub object_score: f32,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "region {} is {} {}({}), score = {}",
            self.region, self.attribute, self.object, self.object_score, self.attribute_score
        )
    }
}

/// 排序比较器: Greater 表示 a 排名更高
pub fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    let object_delta = (a.object_score as f64) - (b.object_score as f64);
    if object_delta.abs() > SCORE_EPSILON {
        return a
            .object_score
            .partial_cmp(&b.object_score)
            .unwrap_or(Ordering::Equal);
    }
    a.attribute_score
        .partial_cmp(&b.attribute_score)
        .unwrap_or(Ordering::Equal)
}

/// 选取排名最高的候选; 空序列不该到这里 (上游按空结果集处理)
pub fn best(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().max_by(|a, b| compare(a, b))
}
