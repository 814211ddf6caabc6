//! 运行统计
//!
//! 不变量: correct <= answered <= processed。

use std::fmt;

use tracing::debug;

/// 统计收集器
#[derive(Debug, Default, Clone)]
pub struct Statistics {
    processed: u64,
    answered: u64,
    correct: u64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每看到一个问题记一次
    pub fn on_question(&mut self) {
        self.processed += 1;
    }

    /// 只有产出答案才记; 与标准答案逐字符相等记正确
    pub fn on_answer(&mut self, answer: &str, gold: &str) {
        self.answered += 1;
        if answer == gold {
            self.correct += 1;
        }
        if let Some(accuracy) = self.accuracy() {
            debug!(accuracy, "running accuracy");
        }
    }

    /// 运行准确率 correct/answered*100; answered 为 0 时未定义
    pub fn accuracy(&self) -> Option<f64> {
        if self.answered == 0 {
            None
        } else {
            Some(self.correct as f64 / self.answered as f64 * 100.0)
        }
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn answered(&self) -> u64 {
        self.answered
    }

    pub fn correct(&self) -> u64 {
        self.correct
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.accuracy() {
            Some(accuracy) => write!(
                f,
                "Questions processed: {}, answered: {}, correct answers: {}% ({})",
                self.processed, self.answered, accuracy, self.correct
            ),
            None => write!(
                f,
                "Questions processed: {}, answered: 0, correct answers: n/a",
                self.processed
            ),
        }
    }
}
