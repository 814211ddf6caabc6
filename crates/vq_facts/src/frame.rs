//! 事实帧
//!
//! 单个作用域内的事实集合: 区域特征、打分关联、继承链接。
//! 帧本身只存数据, 祖先回落逻辑在 [`crate::store::FactStore`]。

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::concept::ConceptId;

/// 区域 ID (图像内的包围盒序号)
pub type RegionId = usize;

/// 事实帧
#[derive(Debug, Default)]
pub(crate) struct Frame {
    /// 区域特征 (BTreeMap 保证区域枚举有序)
    pub(crate) regions: BTreeMap<RegionId, Vec<f32>>,
    /// 打分关联: (区域, 概念) -> [0,1] 打分, 每对至多一条, 重算覆盖
    pub(crate) scores: HashMap<(RegionId, ConceptId), f32>,
    /// 继承链接: (子概念, 父概念)
    pub(crate) links: HashSet<(ConceptId, ConceptId)>,
}

impl Frame {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.scores.is_empty() && self.links.is_empty()
    }
}
