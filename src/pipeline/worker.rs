//! 平滑线程 (Smoother worker)
//! 职责: 接收FrameMessage → 平滑 → 通知输出端

use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::Receiver;
use tracing::{info, warn};

use super::FrameMessage;
use crate::error::{Result, SmootherError};
use crate::geometry::Shape;
use crate::smoothing::ObstacleSmoother;

/// 平滑线程退出时的统计
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerSummary {
    /// 成功处理的帧数
    pub frames: u64,
    /// 因观测无效被丢弃的帧数
    pub rejected: u64,
    /// 退出时仍在跟踪的对象数
    pub tracked: usize,
    /// 退出时已确认的对象数
    pub confirmed: usize,
}

pub struct SmootherWorker {
    smoother: ObstacleSmoother,
    /// 每隔多少帧打印一次性能日志
    log_every: u64,

    // 统计
    processed: u64,
    rejected: u64,
    count: u64,
    last: Instant,
    current_fps: f64,
}

impl SmootherWorker {
    pub fn new(smoother: ObstacleSmoother) -> Self {
        Self {
            smoother,
            log_every: 60,
            processed: 0,
            rejected: 0,
            count: 0,
            last: Instant::now(),
            current_fps: 0.0,
        }
    }

    pub fn with_log_interval(mut self, frames: u64) -> Self {
        self.log_every = frames.max(1);
        self
    }

    /// 工作循环: 直到收到 Shutdown 或输入端关闭
    ///
    /// 无效帧被丢弃并计数; 输出端失败时停止并返回错误。
    pub fn run(&mut self, rx: &Receiver<FrameMessage>) -> Result<WorkerSummary> {
        info!("🔍 平滑线程启动");
        loop {
            match rx.recv() {
                Ok(FrameMessage::Frame(observations)) => self.process(&observations)?,
                Ok(FrameMessage::Shutdown) => {
                    info!("🛑 收到退出消息");
                    break;
                }
                Err(_) => {
                    info!("输入channel已关闭, 平滑线程退出");
                    break;
                }
            }
        }
        let summary = self.summary();
        info!(
            "✅ 平滑线程结束: 处理 {} 帧 | 丢弃 {} 帧 | {}",
            summary.frames,
            summary.rejected,
            self.smoother.stats()
        );
        Ok(summary)
    }

    fn process(&mut self, observations: &[Shape]) -> Result<()> {
        let start = Instant::now();
        match self.smoother.process_frame(observations) {
            Ok(report) => {
                self.processed += 1;
                self.count += 1;
                let now = Instant::now();
                if now.duration_since(self.last).as_secs() >= 1 {
                    self.current_fps =
                        self.count as f64 / now.duration_since(self.last).as_secs_f64();
                    self.count = 0;
                    self.last = now;
                }

                if self.processed % self.log_every == 0 {
                    info!(
                        "🎯 平滑: 帧 {} | {} 个观测 → {} 个障碍物 | {:.3}ms/帧 | {:.1}fps",
                        report.frame,
                        observations.len(),
                        report.emitted,
                        start.elapsed().as_secs_f64() * 1000.0,
                        self.current_fps
                    );
                }
                Ok(())
            }
            Err(err @ SmootherError::InvalidObservation { .. }) => {
                self.rejected += 1;
                warn!("⚠️ 丢弃无效帧: {}", err);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub fn summary(&self) -> WorkerSummary {
        WorkerSummary {
            frames: self.processed,
            rejected: self.rejected,
            tracked: self.smoother.track_count(),
            confirmed: self.smoother.confirmed_count(),
        }
    }

    pub fn into_smoother(self) -> ObstacleSmoother {
        self.smoother
    }
}

/// 启动平滑线程
pub fn spawn_worker(
    smoother: ObstacleSmoother,
    rx: Receiver<FrameMessage>,
) -> JoinHandle<Result<WorkerSummary>> {
    thread::spawn(move || SmootherWorker::new(smoother).run(&rx))
}
