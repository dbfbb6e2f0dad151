//! 几何平滑: 把新观测融合进跟踪中的形状
//!
//! - 每帧: 参考点向新观测移动一半 (整体刚体平移)
//! - 刷新帧: 双方都是组合体时, 整体替换子形状列表

use tracing::debug;

use super::table::TrackTable;
use super::types::Correspondence;
use crate::geometry::{Coordinate, Shape};

/// 是否为组合体结构刷新帧 (帧序号从1开始, 周期为0表示关闭)
pub fn is_refresh_frame(frame: u64, refresh_period: u64) -> bool {
    refresh_period != 0 && frame % refresh_period == 0
}

/// 把一个观测融合进跟踪形状, 返回是否进行了结构刷新 (观测须已通过校验)
pub(crate) fn blend_into(tracked: &mut Shape, observed: &Shape, refresh: bool) -> bool {
    let old_center = tracked.center_point();
    let translation: Coordinate = (observed.center_point() - old_center) / 2.0;
    let target = old_center + translation;

    if refresh {
        if let (Shape::Composite(current), Shape::Composite(fresh)) = (&mut *tracked, observed) {
            current.set_children(fresh.children().to_vec());
            // 新结构整体放到平滑后的位置
            let offset = target - tracked.center_point();
            tracked.translate(&offset);
            return true;
        }
    }

    tracked.translate(&translation);
    false
}

/// 对本帧所有匹配到的对象做几何平滑, 返回结构刷新的对象数
pub(crate) fn adapt_tracked(
    table: &mut TrackTable,
    correspondence: &Correspondence,
    observations: &[Shape],
    refresh: bool,
) -> usize {
    let mut refreshed = 0;
    for (id, idx) in correspondence.iter() {
        let (Some(track), Some(observed)) = (table.get_mut(id), observations.get(idx)) else {
            continue;
        };
        if blend_into(&mut track.shape, observed, refresh) {
            debug!("{} 子形状已刷新 ({} 个)", id, observed.primitive_count());
            refreshed += 1;
        }
    }
    refreshed
}
