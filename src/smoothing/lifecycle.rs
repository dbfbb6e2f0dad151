//! 生命周期状态机: 连续出现/丢失计数, 确认与删除
//!
//! 每帧顺序: `update_lost_and_found` → `drop_lost` → (几何平滑) → `materialize_found`

use tracing::{debug, info};

use super::table::TrackTable;
use super::types::{Correspondence, TrackId, TrackState};

/// 根据本帧匹配结果更新计数器
///
/// - 匹配到: lost 清零; 仅待确认对象累计 found
/// - 未匹配: found 清零; lost 累计 (无论是否已确认)
pub fn update_lost_and_found(table: &mut TrackTable, correspondence: &Correspondence) {
    for track in table.iter_mut() {
        let seen = correspondence.contains(track.id);
        match (&mut track.state, seen) {
            (TrackState::Unconfirmed { found, lost }, true) => {
                *found = found.saturating_add(1);
                *lost = 0;
            }
            (TrackState::Confirmed { lost, .. }, true) => {
                *lost = 0;
            }
            (TrackState::Unconfirmed { found, lost }, false) => {
                *found = 0;
                *lost = lost.saturating_add(1);
            }
            (TrackState::Confirmed { lost, .. }, false) => {
                *lost = lost.saturating_add(1);
            }
        }
        if !seen {
            debug!("{} 丢失计数 {}", track.id, track.state.lost());
        }
    }
}

/// 删除连续丢失 ≥ 阈值的对象, 返回被删除的ID
///
/// 每个对象的全部状态都在跟踪表的同一条目里, 删除一次即完成清理。
pub fn drop_lost(table: &mut TrackTable, lost_threshold: u32) -> Vec<TrackId> {
    let doomed: Vec<TrackId> = table
        .iter()
        .filter(|track| track.state.lost() >= lost_threshold)
        .map(|track| track.id)
        .collect();

    for &id in &doomed {
        if let Some(track) = table.remove(id) {
            info!(
                "🗑️ {} 连续 {} 帧未出现, 删除{}",
                id,
                track.state.lost(),
                if track.is_confirmed() { " (已确认)" } else { "" }
            );
        }
    }
    doomed
}

/// 确认连续出现 ≥ 阈值的待确认对象, 按ID升序分配输出槽位
pub fn materialize_found(table: &mut TrackTable, found_threshold: u32) -> Vec<TrackId> {
    let ready: Vec<TrackId> = table
        .iter()
        .filter(|track| matches!(track.state.found(), Some(found) if found >= found_threshold))
        .map(|track| track.id)
        .collect();

    for &id in &ready {
        if table.confirm(id) {
            info!("✅ {} 连续 {} 帧出现, 确认为障碍物", id, found_threshold);
        }
    }
    ready
}
