//! 跟踪公共数据结构
//! Common data structures for obstacle tracking

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Shape;

// ========== 标识 ==========

/// 跟踪ID (单个平滑器实例内单调递增, 永不复用)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 输出槽位: 物化顺序的稳定句柄
///
/// 槽位只增不减, 删除一个已确认对象不会影响其它对象的槽位。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmissionSlot(pub u64);

// ========== 生命周期状态 ==========

/// 跟踪对象的生命周期状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackState {
    /// 待确认: 连续出现/丢失帧数
    Unconfirmed { found: u32, lost: u32 },
    /// 已确认 (物化): 连续丢失帧数 + 输出槽位
    Confirmed { lost: u32, slot: EmissionSlot },
}

impl TrackState {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, TrackState::Confirmed { .. })
    }

    /// 连续出现帧数 (已确认对象不再累计)
    pub fn found(&self) -> Option<u32> {
        match self {
            TrackState::Unconfirmed { found, .. } => Some(*found),
            TrackState::Confirmed { .. } => None,
        }
    }

    pub fn lost(&self) -> u32 {
        match self {
            TrackState::Unconfirmed { lost, .. } | TrackState::Confirmed { lost, .. } => *lost,
        }
    }

    pub fn slot(&self) -> Option<EmissionSlot> {
        match self {
            TrackState::Confirmed { slot, .. } => Some(*slot),
            TrackState::Unconfirmed { .. } => None,
        }
    }
}

/// 跟踪对象
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub id: TrackId,
    /// 当前几何估计 (平滑后)
    pub shape: Shape,
    pub state: TrackState,
}

impl Track {
    /// 新对象: 待确认, 计数器为0 (本帧的生命周期更新会把 found 置为 1)
    pub fn new(id: TrackId, shape: Shape) -> Self {
        Self {
            id,
            shape,
            state: TrackState::Unconfirmed { found: 0, lost: 0 },
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.state.is_confirmed()
    }
}

// ========== 单帧匹配结果 ==========

/// 跟踪ID → 当前帧观测下标
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Correspondence {
    matches: BTreeMap<TrackId, usize>,
}

impl Correspondence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: TrackId, observation: usize) {
        self.matches.insert(id, observation);
    }

    pub fn get(&self, id: TrackId) -> Option<usize> {
        self.matches.get(&id).copied()
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.matches.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// 按ID升序遍历
    pub fn iter(&self) -> impl Iterator<Item = (TrackId, usize)> + '_ {
        self.matches.iter().map(|(id, idx)| (*id, *idx))
    }
}

// ========== 输出 ==========

/// 已确认障碍物 (输出给下游)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: TrackId,
    pub shape: Shape,
}

/// 单帧输出快照 (按物化顺序)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSnapshot {
    /// 帧序号 (从1开始)
    pub frame: u64,
    pub obstacles: Vec<Obstacle>,
}

impl ObstacleSnapshot {
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn ids(&self) -> Vec<TrackId> {
        self.obstacles.iter().map(|o| o.id).collect()
    }
}

/// 单帧处理统计
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    /// 匹配到已有对象的观测数
    pub matched: usize,
    /// 新建跟踪ID
    pub created: Vec<TrackId>,
    /// 本帧被删除的ID
    pub evicted: Vec<TrackId>,
    /// 本帧被确认的ID
    pub promoted: Vec<TrackId>,
    /// 输出的障碍物数量
    pub emitted: usize,
}
