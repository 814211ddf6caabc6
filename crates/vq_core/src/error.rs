//! 全局错误处理机制

use thiserror::Error;

/// VisuaLoom 统一错误类型
///
/// 问题级错误 (特征缺失、翻译失败、空结果集等) 在单问题边界被捕获并记日志,
/// 流水线继续处理下一个问题; 只有启动期错误允许终止整个运行。
#[derive(Error, Debug)]
pub enum VqaError {
    #[error("feature file not found: {0}")]
    FeatureNotFound(String),

    #[error("feature parse error: {0}")]
    FeatureParse(String),

    #[error("no model for word: {0}")]
    UnknownWord(String),

    #[error("question translation failed: {0}")]
    TranslationFailure(String),

    #[error("query produced an empty result set")]
    EmptyResultSet,

    // 编程不变量被破坏, 不可恢复
    #[error("fact store scope underflow: pop without matching push")]
    ScopeUnderflow,

    #[error("bridge error: {0}")]
    Bridge(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("question record parse error: {0}")]
    RecordParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 统一 Result 类型别名
pub type Result<T> = std::result::Result<T, VqaError>;
