//! # vq_pipeline - VisuaLoom Question Answering Orchestrator
//!
//! 单问题生命周期驱动:
//! 开作用域 -> 装载区域事实 -> 外部编译器翻译 -> 按题型求值
//! (求值期间查询引擎经回调逐对打分并缓存) -> 排序取答 -> 记统计 -> 关作用域。
//!
//! 外部查询编译器/查询引擎经 [`bridge`] 的子进程 JSON 行协议接入;
//! 编排器只做接线与聚合, 不实现模式匹配本身。

pub mod bridge;
pub mod oracle;
pub mod pipeline;
pub mod ranking;
pub mod stats;

pub use bridge::{BridgeConfig, QueryBridge, QueryEngine, QuestionTranslator, ResultBinding};
pub use oracle::{CachingOracle, ScoreOracle};
pub use pipeline::VqaPipeline;
pub use ranking::{Candidate, SCORE_EPSILON};
pub use stats::Statistics;
