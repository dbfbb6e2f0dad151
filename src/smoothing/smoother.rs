//! 障碍物平滑器
//! Temporal obstacle smoother
//!
//! 单帧流程:
//! 1. 校验观测 (任一观测无效则整帧拒绝, 状态不变)
//! 2. 匹配: 观测 → 跟踪ID, 未匹配的观测建立新对象
//! 3. 更新连续出现/丢失计数, 删除丢失过久的对象
//! 4. 几何平滑 (周期性刷新组合体结构)
//! 5. 确认出现足够久的对象
//! 6. 生成快照并同步发送给所有输出端

use tracing::{debug, warn};

use super::sink::ObstacleSink;
use super::table::TrackTable;
use super::types::{FrameReport, Obstacle, ObstacleSnapshot, Track, TrackId};
use super::{blend, lifecycle, matcher};
use crate::config::SmootherConfig;
use crate::error::{Result, SinkError, SmootherError};
use crate::geometry::Shape;

pub struct ObstacleSmoother {
    config: SmootherConfig,
    table: TrackTable,
    /// 已处理帧数
    frame: u64,
    /// 下游输出端 (按挂载顺序通知)
    sinks: Vec<Box<dyn ObstacleSink + Send>>,
}

impl ObstacleSmoother {
    pub fn new(config: SmootherConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            table: TrackTable::new(),
            frame: 0,
            sinks: Vec::new(),
        })
    }

    pub fn config(&self) -> &SmootherConfig {
        &self.config
    }

    /// 挂载下游输出端 (应在处理第一帧之前完成)
    pub fn attach_sink<S>(&mut self, sink: S)
    where
        S: ObstacleSink + Send + 'static,
    {
        self.sinks.push(Box::new(sink));
    }

    pub fn attach_boxed_sink(&mut self, sink: Box<dyn ObstacleSink + Send>) {
        self.sinks.push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// 处理一帧观测
    pub fn process_frame(&mut self, observations: &[Shape]) -> Result<FrameReport> {
        validate_frame(observations)?;

        self.frame += 1;
        let frame = self.frame;
        debug!("帧 {}: {} 个观测", frame, observations.len());

        let outcome =
            matcher::match_to_previous(&mut self.table, observations, self.config.match_threshold);
        lifecycle::update_lost_and_found(&mut self.table, &outcome.correspondence);
        let evicted = lifecycle::drop_lost(&mut self.table, self.config.lost_threshold);

        let refresh = blend::is_refresh_frame(frame, self.config.refresh_period);
        let refreshed =
            blend::adapt_tracked(&mut self.table, &outcome.correspondence, observations, refresh);
        if refreshed > 0 {
            debug!("帧 {}: {} 个组合体结构刷新", frame, refreshed);
        }

        let promoted = lifecycle::materialize_found(&mut self.table, self.config.found_threshold);

        let snapshot = self.snapshot();
        let report = FrameReport {
            frame,
            matched: outcome.matched,
            created: outcome.created,
            evicted,
            promoted,
            emitted: snapshot.len(),
        };
        debug!(
            "帧 {}: 跟踪 {} | 确认 {} | 新建 {} | 删除 {}",
            frame,
            self.table.len(),
            report.emitted,
            report.created.len(),
            report.evicted.len()
        );

        self.notify_sinks(&snapshot)?;
        Ok(report)
    }

    /// 当前已确认障碍物快照 (按确认顺序)
    pub fn snapshot(&self) -> ObstacleSnapshot {
        ObstacleSnapshot {
            frame: self.frame,
            obstacles: self
                .table
                .materialized()
                .into_iter()
                .map(|track| Obstacle {
                    id: track.id,
                    shape: track.shape.clone(),
                })
                .collect(),
        }
    }

    fn notify_sinks(&mut self, snapshot: &ObstacleSnapshot) -> Result<()> {
        for (index, sink) in self.sinks.iter_mut().enumerate() {
            sink.update_obstacles(snapshot)
                .map_err(|source| SmootherError::Sink { index, source })?;
        }
        Ok(())
    }

    /// 已确认对象 (按确认顺序)
    pub fn materialized(&self) -> Vec<&Track> {
        self.table.materialized()
    }

    /// 所有跟踪对象 (按ID升序)
    pub fn tracks(&self) -> impl Iterator<Item = &Track> + '_ {
        self.table.iter()
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.table.get(id)
    }

    pub fn track_count(&self) -> usize {
        self.table.len()
    }

    pub fn confirmed_count(&self) -> usize {
        self.table.confirmed_count()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// 清除所有跟踪 (ID计数器不重置, 旧ID不会再次出现)
    pub fn reset(&mut self) {
        self.table.clear();
    }

    /// 获取跟踪统计信息
    pub fn stats(&self) -> String {
        format!(
            "帧: {} | 跟踪: {} | 确认: {} | 总ID: {}",
            self.frame,
            self.table.len(),
            self.table.confirmed_count(),
            self.table.peek_next_id().0
        )
    }
}

impl Default for ObstacleSmoother {
    fn default() -> Self {
        Self {
            config: SmootherConfig::default(),
            table: TrackTable::new(),
            frame: 0,
            sinks: Vec::new(),
        }
    }
}

/// 平滑器本身也是输出端: 上游快照中的形状作为本级的观测
impl ObstacleSink for ObstacleSmoother {
    fn update_obstacles(&mut self, snapshot: &ObstacleSnapshot) -> std::result::Result<(), SinkError> {
        let observations: Vec<Shape> = snapshot
            .obstacles
            .iter()
            .map(|obstacle| obstacle.shape.clone())
            .collect();
        self.process_frame(&observations)?;
        Ok(())
    }
}

fn validate_frame(observations: &[Shape]) -> Result<()> {
    for (index, observation) in observations.iter().enumerate() {
        if let Err(reason) = observation.validate() {
            warn!("⚠️ 拒绝观测 #{}: {}", index, reason);
            return Err(SmootherError::InvalidObservation { index, reason });
        }
    }
    Ok(())
}
