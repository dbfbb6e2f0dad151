//! 两级平滑器串联示例
//!
//! 合成场景 → 一级平滑 (快速确认) → 二级平滑 (更严格的确认/删除) → 日志
//!
//! cargo run --example chained_smoothers

use anyhow::Result;
use tracing::info;

use obstacle_smoother_rs::input::{SceneConfig, SyntheticScene};
use obstacle_smoother_rs::{LogSink, ObstacleSmoother, ObstacleSnapshot, SinkError, SmootherConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let scene = SyntheticScene::new(
        SceneConfig {
            obstacles: 4,
            ghost_rate: 0.5,
            drift: 0.01,
            ..Default::default()
        },
        7,
    );

    let mut second = ObstacleSmoother::new(SmootherConfig {
        found_threshold: 10,
        lost_threshold: 20,
        ..Default::default()
    })?;
    second.attach_sink(LogSink::new(50));
    second.attach_sink(|snapshot: &ObstacleSnapshot| -> Result<(), SinkError> {
        if snapshot.frame == 200 {
            for obstacle in &snapshot.obstacles {
                info!("🏁 {} {}", obstacle.id, obstacle.shape);
            }
        }
        Ok(())
    });

    let mut first = ObstacleSmoother::new(SmootherConfig {
        found_threshold: 3,
        lost_threshold: 5,
        ..Default::default()
    })?;
    first.attach_sink(second);

    let truth = scene.ground_truth().len();
    for frame in scene.take(200) {
        first.process_frame(&frame)?;
    }

    info!("✅ 一级 {} | 真实障碍物 {}", first.stats(), truth);
    Ok(())
}
