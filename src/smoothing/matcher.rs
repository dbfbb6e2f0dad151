//! 最近参考点匹配
//! Nearest-centroid association
//!
//! 流程:
//! 1. 每个观测与已有跟踪对象比较参考点距离平方, 阈值内取最近者
//! 2. 多个观测争抢同一对象时, 距离更近的保留匹配, 其余视为未匹配
//! 3. 全部观测扫描完成后, 才为未匹配观测分配新ID并加入跟踪表
//!    (同一帧内的观测之间不会互相匹配)

use std::collections::HashMap;

use tracing::debug;

use super::table::TrackTable;
use super::types::{Correspondence, Track, TrackId};
use crate::geometry::{squared_distance, Shape};

/// 单帧匹配结果
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// 所有ID → 观测下标 (包括本帧新建的ID)
    pub correspondence: Correspondence,
    /// 匹配到已有对象的观测数
    pub matched: usize,
    /// 本帧新建的ID (按观测下标升序)
    pub created: Vec<TrackId>,
}

/// 在跟踪表中寻找与给定参考点最近的对象 (距离平方 ≤ 阈值)
///
/// 距离相同时保留ID较小者; 距离为 NaN 的对象不参与比较。
/// 查询形状须已通过 [`Shape::validate`]。
pub(crate) fn nearest_track(
    table: &TrackTable,
    shape: &Shape,
    threshold: f64,
) -> Option<(TrackId, f64)> {
    let query = shape.center_point();
    let mut best: Option<(TrackId, f64)> = None;
    for track in table.iter() {
        let dist = squared_distance(&track.shape.center_point(), &query);
        if dist.is_nan() || dist > threshold {
            continue;
        }
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((track.id, dist)),
        }
    }
    best
}

/// 将本帧观测匹配到已有跟踪对象, 未匹配的观测注册为新对象
pub(crate) fn match_to_previous(
    table: &mut TrackTable,
    observations: &[Shape],
    threshold: f64,
) -> MatchOutcome {
    // 跟踪ID → (观测下标, 距离平方)
    let mut claims: HashMap<TrackId, (usize, f64)> = HashMap::new();
    let mut unmatched: Vec<usize> = Vec::new();

    for (idx, observation) in observations.iter().enumerate() {
        let Some((id, dist)) = nearest_track(table, observation, threshold) else {
            debug!("观测 {} ({}) 无匹配", idx, observation);
            unmatched.push(idx);
            continue;
        };

        match claims.get(&id).copied() {
            Some((prev_idx, prev_dist)) if prev_dist <= dist => {
                debug!(
                    "观测 {} 与观测 {} 争抢 {}: 距离 {:.5} ≥ {:.5}, 视为未匹配",
                    idx, prev_idx, id, dist, prev_dist
                );
                unmatched.push(idx);
            }
            Some((prev_idx, prev_dist)) => {
                debug!(
                    "观测 {} 与观测 {} 争抢 {}: 距离 {:.5} < {:.5}, 取代",
                    idx, prev_idx, id, dist, prev_dist
                );
                unmatched.push(prev_idx);
                claims.insert(id, (idx, dist));
            }
            None => {
                debug!("观测 {} → {} (距离² {:.5})", idx, id, dist);
                claims.insert(id, (idx, dist));
            }
        }
    }

    let mut correspondence = Correspondence::new();
    for (id, (idx, _)) in &claims {
        correspondence.insert(*id, *idx);
    }
    let matched = claims.len();

    // 延迟插入: 扫描结束后才开始跟踪新对象
    unmatched.sort_unstable();
    let mut created = Vec::with_capacity(unmatched.len());
    for idx in unmatched {
        let id = table.allocate_id();
        debug!("开始跟踪新对象 {} (观测 {})", id, idx);
        table.insert(Track::new(id, observations[idx].clone()));
        correspondence.insert(id, idx);
        created.push(id);
    }

    MatchOutcome {
        correspondence,
        matched,
        created,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coordinate;

    fn sphere(x: f64, y: f64) -> Shape {
        Shape::sphere(Coordinate::new(x, y, 0.0), 0.1)
    }

    fn table_with(points: &[(f64, f64)]) -> (TrackTable, Vec<TrackId>) {
        let mut table = TrackTable::new();
        let ids = points
            .iter()
            .map(|&(x, y)| {
                let id = table.allocate_id();
                table.insert(Track::new(id, sphere(x, y)));
                id
            })
            .collect();
        (table, ids)
    }

    #[test]
    fn test_empty_table_creates_all() {
        let mut table = TrackTable::new();
        let outcome = match_to_previous(&mut table, &[sphere(0.0, 0.0), sphere(5.0, 0.0)], 0.05);
        assert_eq!(outcome.matched, 0);
        assert_eq!(outcome.created, vec![TrackId(0), TrackId(1)]);
        assert_eq!(outcome.correspondence.get(TrackId(0)), Some(0));
        assert_eq!(outcome.correspondence.get(TrackId(1)), Some(1));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_nearest_within_threshold() {
        let (mut table, ids) = table_with(&[(0.0, 0.0), (0.15, 0.0)]);
        // 距离²: 0.01 与 0.0025
        let outcome = match_to_previous(&mut table, &[sphere(0.1, 0.0)], 0.05);
        assert_eq!(outcome.matched, 1);
        assert!(outcome.created.is_empty());
        assert_eq!(outcome.correspondence.get(ids[1]), Some(0));
        assert!(!outcome.correspondence.contains(ids[0]));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let (table, ids) = table_with(&[(0.0, 0.0)]);
        // 距离² = 0.25 恰好等于阈值
        assert_eq!(
            nearest_track(&table, &sphere(0.5, 0.0), 0.25),
            Some((ids[0], 0.25))
        );
        assert_eq!(nearest_track(&table, &sphere(0.5, 0.0), 0.24), None);
    }

    #[test]
    fn test_nan_distance_never_matches() {
        let mut table = TrackTable::new();
        let id = table.allocate_id();
        let far = Coordinate::new(1e308, 0.0, 0.0);
        table.insert(Track::new(id, Shape::capsule(far, far, 0.1)));

        // inf - inf = NaN
        let query = Shape::capsule(far, far, 0.1);
        let tracked = table.get(id).unwrap().shape.center_point();
        assert!(squared_distance(&tracked, &query.center_point()).is_nan());
        assert_eq!(nearest_track(&table, &query, f64::MAX), None);
    }

    #[test]
    fn test_exact_tie_prefers_lower_id() {
        let (table, ids) = table_with(&[(-0.1, 0.0), (0.1, 0.0)]);
        let (id, _) = nearest_track(&table, &sphere(0.0, 0.0), 0.05).unwrap();
        assert_eq!(id, ids[0]);
    }

    #[test]
    fn test_new_observations_never_match_each_other() {
        let mut table = TrackTable::new();
        let outcome = match_to_previous(
            &mut table,
            &[sphere(3.0, 3.0), sphere(3.01, 3.0)],
            0.05,
        );
        assert_eq!(outcome.created.len(), 2);
        assert_ne!(outcome.created[0], outcome.created[1]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_conflict_keeps_closer_observation() {
        let (mut table, ids) = table_with(&[(0.0, 0.0)]);
        // 观测0 较远, 观测1 较近
        let observations = [sphere(0.15, 0.0), sphere(0.05, 0.0)];
        let outcome = match_to_previous(&mut table, &observations, 0.05);

        assert_eq!(outcome.matched, 1);
        assert_eq!(outcome.correspondence.get(ids[0]), Some(1));
        assert_eq!(outcome.created, vec![TrackId(1)]);
        assert_eq!(outcome.correspondence.get(TrackId(1)), Some(0));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_conflict_tie_keeps_first_observation() {
        let (mut table, ids) = table_with(&[(0.0, 0.0)]);
        let observations = [sphere(0.1, 0.0), sphere(-0.1, 0.0)];
        let outcome = match_to_previous(&mut table, &observations, 0.05);
        assert_eq!(outcome.correspondence.get(ids[0]), Some(0));
        assert_eq!(outcome.created, vec![TrackId(1)]);
        assert_eq!(outcome.correspondence.get(TrackId(1)), Some(1));
    }

    #[test]
    fn test_created_ids_follow_observation_order() {
        let (mut table, ids) = table_with(&[(0.0, 0.0)]);
        // 观测1 先占位, 观测2 更近把它挤掉; 观测0 本身无匹配
        let observations = [sphere(9.0, 9.0), sphere(0.2, 0.0), sphere(0.01, 0.0)];
        let outcome = match_to_previous(&mut table, &observations, 0.05);
        assert_eq!(outcome.correspondence.get(ids[0]), Some(2));
        assert_eq!(outcome.created, vec![TrackId(1), TrackId(2)]);
        assert_eq!(outcome.correspondence.get(TrackId(1)), Some(0));
        assert_eq!(outcome.correspondence.get(TrackId(2)), Some(1));
    }
}
