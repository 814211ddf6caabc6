//! 概念驻留表
//!
//! 概念是跨作用域共享的符号记号: 同名查询永远得到同一个 id,
//! 任何帧都不独占概念本身。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 驻留后的概念 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConceptId(u32);

/// 概念驻留表 (事实库全局唯一, 不随帧弹出回收)
#[derive(Debug, Default)]
pub struct ConceptTable {
    index: HashMap<String, ConceptId>,
    names: Vec<String>,
}

impl ConceptTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 驻留概念名, 返回稳定 id
    pub fn intern(&mut self, name: &str) -> ConceptId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = ConceptId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }

    /// 按名查找 (不驻留)
    pub fn lookup(&self, name: &str) -> Option<ConceptId> {
        self.index.get(name).copied()
    }

    /// 获取概念名
    pub fn name(&self, id: ConceptId) -> &str {
        &self.names[id.0 as usize]
    }

    /// 获取概念数量
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
