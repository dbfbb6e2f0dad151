//! 下游输出端 (Obstacle sinks)
//!
//! 每帧平滑结束后, 已确认障碍物快照按挂载顺序同步发送给所有输出端。

use std::io::Write;

use crossbeam_channel::Sender;
use tracing::info;

use super::types::ObstacleSnapshot;
use crate::error::SinkError;

/// 接收平滑后障碍物的统一接口
pub trait ObstacleSink {
    /// 处理一帧已确认的障碍物
    fn update_obstacles(&mut self, snapshot: &ObstacleSnapshot) -> Result<(), SinkError>;
}

impl<F> ObstacleSink for F
where
    F: FnMut(&ObstacleSnapshot) -> Result<(), SinkError>,
{
    fn update_obstacles(&mut self, snapshot: &ObstacleSnapshot) -> Result<(), SinkError> {
        self(snapshot)
    }
}

/// 通过channel把快照交给其它线程 (发送的是独立副本, 不会被后续帧修改)
///
/// 有界channel满时阻塞, 慢消费者会拖慢平滑线程。
pub struct ChannelSink {
    tx: Sender<ObstacleSnapshot>,
}

impl ChannelSink {
    pub fn new(tx: Sender<ObstacleSnapshot>) -> Self {
        Self { tx }
    }
}

impl ObstacleSink for ChannelSink {
    fn update_obstacles(&mut self, snapshot: &ObstacleSnapshot) -> Result<(), SinkError> {
        self.tx
            .send(snapshot.clone())
            .map_err(|_| "obstacle snapshot receiver disconnected")?;
        Ok(())
    }
}

/// JSON Lines 输出: 每帧一行
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ObstacleSink for JsonLinesSink<W> {
    fn update_obstacles(&mut self, snapshot: &ObstacleSnapshot) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, snapshot)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// 日志输出: 每隔 `every` 帧打印一次障碍物摘要
pub struct LogSink {
    every: u64,
}

impl LogSink {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(30)
    }
}

impl ObstacleSink for LogSink {
    fn update_obstacles(&mut self, snapshot: &ObstacleSnapshot) -> Result<(), SinkError> {
        if snapshot.frame % self.every == 0 {
            let summary: Vec<String> = snapshot
                .obstacles
                .iter()
                .map(|o| format!("{} {}", o.id, o.shape))
                .collect();
            info!(
                "🎯 帧 {}: {} 个障碍物 [{}]",
                snapshot.frame,
                snapshot.len(),
                summary.join(", ")
            );
        }
        Ok(())
    }
}
