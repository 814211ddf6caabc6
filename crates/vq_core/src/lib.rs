//! # vq_core - VisuaLoom Core Primitives
//!
//! 核心原语层，定义问题记录、全局错误处理机制。
//! 此 crate 是整个项目的基础依赖，不依赖其他业务 crate。

pub mod error;
pub mod record;

pub use error::{Result, VqaError};
pub use record::{QuestionRecord, QuestionType};
