//! 跟踪表: 以ID为键的唯一状态存储
//!
//! 计数器、确认标记、输出槽位都保存在同一个 `Track` 里,
//! 物化集合只是按槽位排序的投影, 不存在需要手动同步的镜像结构。

use std::collections::BTreeMap;

use super::types::{EmissionSlot, Track, TrackId, TrackState};

#[derive(Clone, Debug, Default)]
pub struct TrackTable {
    tracks: BTreeMap<TrackId, Track>,
    /// 下一个可分配的ID
    next_id: u64,
    /// 下一个可分配的输出槽位
    next_slot: u64,
}

impl TrackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 分配新ID, 保证不会重复
    pub fn allocate_id(&mut self) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;
        id
    }

    /// 下一个将被分配的ID (用于统计)
    pub fn peek_next_id(&self) -> TrackId {
        TrackId(self.next_id)
    }

    pub fn insert(&mut self, track: Track) {
        debug_assert!(
            !self.tracks.contains_key(&track.id),
            "track {} inserted twice",
            track.id
        );
        self.tracks.insert(track.id, track);
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.get_mut(&id)
    }

    /// 删除对象 (计数器、确认标记和槽位随条目一起消失); 不存在时为空操作
    pub fn remove(&mut self, id: TrackId) -> Option<Track> {
        self.tracks.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// 按ID升序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Track> + '_ {
        self.tracks.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Track> + '_ {
        self.tracks.values_mut()
    }

    /// 把待确认对象提升为已确认, 分配新的输出槽位
    ///
    /// 已确认或不存在的ID返回 `false`。
    pub fn confirm(&mut self, id: TrackId) -> bool {
        let Some(track) = self.tracks.get_mut(&id) else {
            return false;
        };
        match track.state {
            TrackState::Unconfirmed { lost, .. } => {
                let slot = EmissionSlot(self.next_slot);
                self.next_slot += 1;
                track.state = TrackState::Confirmed { lost, slot };
                true
            }
            TrackState::Confirmed { .. } => false,
        }
    }

    /// 物化集合: 已确认对象, 按槽位 (确认先后) 排序
    pub fn materialized(&self) -> Vec<&Track> {
        let mut confirmed: Vec<(EmissionSlot, &Track)> = self
            .tracks
            .values()
            .filter_map(|track| track.state.slot().map(|slot| (slot, track)))
            .collect();
        confirmed.sort_by_key(|(slot, _)| *slot);
        confirmed.into_iter().map(|(_, track)| track).collect()
    }

    pub fn confirmed_count(&self) -> usize {
        self.tracks.values().filter(|t| t.is_confirmed()).count()
    }

    /// 清空所有对象, ID与槽位计数器保持不变
    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Coordinate, Shape};

    fn insert_new(table: &mut TrackTable, x: f64) -> TrackId {
        let id = table.allocate_id();
        table.insert(Track::new(id, Shape::sphere(Coordinate::new(x, 0.0, 0.0), 0.1)));
        id
    }

    #[test]
    fn test_ids_are_monotonic_across_removal_and_clear() {
        let mut table = TrackTable::new();
        let a = insert_new(&mut table, 0.0);
        let b = insert_new(&mut table, 1.0);
        assert_eq!((a, b), (TrackId(0), TrackId(1)));

        table.remove(b);
        let c = insert_new(&mut table, 2.0);
        assert_eq!(c, TrackId(2));

        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.allocate_id(), TrackId(3));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut table = TrackTable::new();
        let a = insert_new(&mut table, 0.0);
        assert!(table.remove(a).is_some());
        assert!(table.remove(a).is_none());
        assert!(table.remove(TrackId(42)).is_none());
    }

    #[test]
    fn test_materialized_order_is_stable_under_removal() {
        let mut table = TrackTable::new();
        let ids: Vec<TrackId> = (0..4).map(|i| insert_new(&mut table, i as f64)).collect();

        // 确认顺序与ID顺序不同
        for &id in &[ids[2], ids[0], ids[3], ids[1]] {
            assert!(table.confirm(id));
        }
        assert!(!table.confirm(ids[0]));

        let order: Vec<TrackId> = table.materialized().iter().map(|t| t.id).collect();
        assert_eq!(order, vec![ids[2], ids[0], ids[3], ids[1]]);

        let slots_before: Vec<_> = [ids[2], ids[3], ids[1]]
            .iter()
            .map(|&id| table.get(id).unwrap().state.slot())
            .collect();
        table.remove(ids[0]);
        let slots_after: Vec<_> = [ids[2], ids[3], ids[1]]
            .iter()
            .map(|&id| table.get(id).unwrap().state.slot())
            .collect();
        assert_eq!(slots_before, slots_after);

        let order: Vec<TrackId> = table.materialized().iter().map(|t| t.id).collect();
        assert_eq!(order, vec![ids[2], ids[3], ids[1]]);
        assert_eq!(table.confirmed_count(), 3);
    }

    #[test]
    fn test_confirm_keeps_lost_counter() {
        let mut table = TrackTable::new();
        let id = insert_new(&mut table, 0.0);
        table.get_mut(id).unwrap().state = TrackState::Unconfirmed { found: 5, lost: 0 };
        assert!(table.confirm(id));
        assert_eq!(
            table.get(id).unwrap().state,
            TrackState::Confirmed {
                lost: 0,
                slot: EmissionSlot(0)
            }
        );
        assert!(!table.confirm(TrackId(99)));
    }
}
