//! # vq_facts - VisuaLoom Symbolic Fact Store
//!
//! 作用域符号事实库: 帧栈 push/pop 生命周期、概念驻留、区域/打分断言。
//! 单问题的全部事实写入子帧, 弹出后父帧状态原样恢复。

pub mod concept;
pub mod frame;
pub mod store;

pub use concept::{ConceptId, ConceptTable};
pub use frame::RegionId;
pub use store::FactStore;
