//! 作用域事实库
//!
//! 显式帧栈取代共享句柄上的 push/pop 副作用: 栈由 `FactStore` 值自身持有,
//! push/pop 是纯粹的栈状态转移。写入只落在活动帧; 读取从活动帧起逐层
//! 回落到基帧。弹出子帧后, 父帧先前的可见状态被精确恢复 (零泄漏)。
//!
//! 并发模型: 一个编排器线程独占一个实例, `&mut self` 即约束, 无内部锁。
//! 并行批处理时每个并发问题各建一个实例。

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use vq_core::{Result, VqaError};

use crate::concept::{ConceptId, ConceptTable};
use crate::frame::{Frame, RegionId};

/// 作用域事实库
pub struct FactStore {
    concepts: ConceptTable,
    /// frames[0] 为基帧, 永不弹出
    frames: Vec<Frame>,
}

impl FactStore {
    /// 创建只含基帧的事实库
    pub fn new() -> Self {
        Self {
            concepts: ConceptTable::new(),
            frames: vec![Frame::new()],
        }
    }

    /// 进入子作用域: 新空帧成为活动帧, 读取回落到祖先
    pub fn push(&mut self) {
        self.frames.push(Frame::new());
        debug!(depth = self.depth(), "fact store frame pushed");
    }

    /// 离开子作用域: 丢弃活动帧全部事实, 恢复父帧
    ///
    /// 基帧上调用是编程不变量违规, 返回 `ScopeUnderflow`。
    pub fn pop(&mut self) -> Result<()> {
        if self.frames.len() <= 1 {
            return Err(VqaError::ScopeUnderflow);
        }
        let dropped = self.frames.pop().unwrap_or_default();
        debug!(
            depth = self.depth(),
            dropped_empty = dropped.is_empty(),
            "fact store frame popped"
        );
        Ok(())
    }

    /// 当前嵌套深度 (基帧为 0)
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// 驻留概念名
    pub fn concept(&mut self, name: &str) -> ConceptId {
        self.concepts.intern(name)
    }

    /// 获取概念名
    pub fn concept_name(&self, id: ConceptId) -> &str {
        self.concepts.name(id)
    }

    /// 在活动帧写入区域事实 (特征向量不可变)
    pub fn insert_region(&mut self, region: RegionId, features: Vec<f32>) {
        self.active_mut().regions.insert(region, features);
    }

    /// 查询区域特征: 活动帧优先, 逐层回落
    pub fn region_features(&self, region: RegionId) -> Option<&[f32]> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.regions.get(&region))
            .map(Vec::as_slice)
    }

    /// 当前可见的全部区域 (跨帧并集, 有序)
    pub fn regions(&self) -> Vec<RegionId> {
        let mut visible = BTreeSet::new();
        for frame in &self.frames {
            visible.extend(frame.regions.keys().copied());
        }
        visible.into_iter().collect()
    }

    /// 在活动帧断言打分关联, 同 (区域, 概念) 覆盖旧值
    pub fn assert_score(&mut self, region: RegionId, concept: ConceptId, score: f32) {
        self.active_mut().scores.insert((region, concept), score);
    }

    /// 查询打分关联: 活动帧优先, 逐层回落, 找不到为 None
    pub fn score(&self, region: RegionId, concept: ConceptId) -> Option<f32> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.scores.get(&(region, concept)))
            .copied()
    }

    /// 在活动帧断言继承链接
    pub fn assert_link(&mut self, child: ConceptId, parent: ConceptId) {
        self.active_mut().links.insert((child, parent));
    }

    /// 查询继承链接是否可见
    pub fn has_link(&self, child: ConceptId, parent: ConceptId) -> bool {
        self.frames
            .iter()
            .rev()
            .any(|frame| frame.links.contains(&(child, parent)))
    }

    /// 从文本文件预载继承事实到活动帧
    ///
    /// 每行 `child parent` (空白分隔), `#` 开头为注释。返回载入条数。
    pub fn load_facts(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let mut loaded = 0usize;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (child, parent) = match (fields.next(), fields.next()) {
                (Some(child), Some(parent)) => (child, parent),
                _ => {
                    return Err(VqaError::RecordParse(format!(
                        "fact line needs 'child parent': {line}"
                    )))
                }
            };
            let child = self.concept(child);
            let parent = self.concept(parent);
            self.assert_link(child, parent);
            loaded += 1;
        }

        debug!(loaded, "preloaded facts");
        Ok(loaded)
    }

    fn active_mut(&mut self) -> &mut Frame {
        // frames 始终至少含基帧
        self.frames.last_mut().expect("fact store has no base frame")
    }
}

impl Default for FactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_round_trip_restores_state() {
        let mut store = FactStore::new();
        let red = store.concept("red");
        store.insert_region(0, vec![1.0, 2.0]);
        store.assert_score(0, red, 0.8);

        store.push();
        let car = store.concept("car");
        store.insert_region(1, vec![3.0]);
        store.assert_score(0, red, 0.1);
        store.assert_score(1, car, 0.9);
        assert_eq!(store.regions(), vec![0, 1]);

        store.pop().unwrap();
        // 父帧状态原样恢复
        assert_eq!(store.score(0, red), Some(0.8));
        assert_eq!(store.score(1, car), None);
        assert_eq!(store.regions(), vec![0]);
        assert!(store.region_features(1).is_none());
    }

    #[test]
    fn test_query_prefers_active_frame_then_falls_through() {
        let mut store = FactStore::new();
        let sky = store.concept("sky");
        store.assert_score(2, sky, 0.3);

        store.push();
        // 活动帧命中优先
        store.assert_score(2, sky, 0.7);
        assert_eq!(store.score(2, sky), Some(0.7));

        // 活动帧未命中则回落祖先
        let blue = store.concept("blue");
        assert_eq!(store.score(2, blue), None);
        store.pop().unwrap();
        assert_eq!(store.score(2, sky), Some(0.3));
    }

    #[test]
    fn test_reassert_overwrites_in_same_frame() {
        let mut store = FactStore::new();
        let dog = store.concept("dog");
        store.push();
        store.assert_score(0, dog, 0.4);
        store.assert_score(0, dog, 0.6);
        assert_eq!(store.score(0, dog), Some(0.6));
        store.pop().unwrap();
    }

    #[test]
    fn test_pop_on_base_frame_underflows() {
        let mut store = FactStore::new();
        assert!(matches!(store.pop(), Err(VqaError::ScopeUnderflow)));
    }

    #[test]
    fn test_concepts_survive_pop() {
        let mut store = FactStore::new();
        store.push();
        let cat = store.concept("cat");
        store.pop().unwrap();
        // 概念驻留跨作用域共享, 不随帧回收
        assert_eq!(store.concept("cat"), cat);
        assert_eq!(store.concept_name(cat), "cat");
    }

    #[test]
    fn test_links_scoped_like_scores() {
        let mut store = FactStore::new();
        let bb0 = store.concept("BoundingBox-0");
        let bb = store.concept("BoundingBox");
        store.push();
        store.assert_link(bb0, bb);
        assert!(store.has_link(bb0, bb));
        store.pop().unwrap();
        assert!(!store.has_link(bb0, bb));
    }

    #[test]
    fn test_nested_frames() {
        let mut store = FactStore::new();
        let w = store.concept("w");
        store.assert_score(0, w, 0.1);
        store.push();
        store.assert_score(0, w, 0.2);
        store.push();
        assert_eq!(store.depth(), 2);
        assert_eq!(store.score(0, w), Some(0.2));
        store.assert_score(0, w, 0.3);
        assert_eq!(store.score(0, w), Some(0.3));
        store.pop().unwrap();
        assert_eq!(store.score(0, w), Some(0.2));
        store.pop().unwrap();
        assert_eq!(store.score(0, w), Some(0.1));
    }
}
