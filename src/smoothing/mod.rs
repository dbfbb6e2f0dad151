/// 障碍物平滑系统 (Obstacle Smoothing System)
///
/// 对检测器逐帧输出的障碍物做时间一致化:
/// - Matcher:   最近参考点匹配, 分配持久ID
/// - Lifecycle: 连续出现/丢失计数, 确认与删除 (滞回)
/// - Blend:     几何平滑与组合体结构刷新
/// - Smoother:  单帧流程编排与快照输出
/// - Sink:      下游输出端
pub mod blend;
pub mod lifecycle;
pub mod matcher;
pub mod sink;
pub mod smoother;
pub mod table;
pub mod types;

pub use sink::{ChannelSink, JsonLinesSink, LogSink, ObstacleSink};
pub use smoother::ObstacleSmoother;
pub use table::TrackTable;
pub use types::{
    Correspondence, EmissionSlot, FrameReport, Obstacle, ObstacleSnapshot, Track, TrackId,
    TrackState,
};
