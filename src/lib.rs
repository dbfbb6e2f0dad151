pub mod config; // 平滑器配置参数
pub mod error; // 错误类型
pub mod geometry; // 障碍物几何模型
pub mod input; // 观测输入 (回放 / 合成场景)
pub mod pipeline; // 双线程平滑流水线
pub mod smoothing; // 障碍物平滑系统

pub use crate::config::SmootherConfig;
pub use crate::error::{InvalidReason, Result, SinkError, SmootherError};
pub use crate::geometry::{Capsule, Composite, Coordinate, Shape, Sphere};
pub use crate::smoothing::{
    ChannelSink, FrameReport, JsonLinesSink, LogSink, Obstacle, ObstacleSink, ObstacleSmoother,
    ObstacleSnapshot, Track, TrackId, TrackState,
};

/// 生成本地时间字符串 (用于记录文件命名)
pub fn gen_time_string(delimiter: &str) -> String {
    let t_now = chrono::Local::now();
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S{}%f",
        delimiter, delimiter, delimiter, delimiter, delimiter, delimiter
    );
    t_now.format(&fmt).to_string()
}
