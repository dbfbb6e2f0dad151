/// 平滑流水线 (Smoothing Pipeline)
///
/// 双线程架构, 通过crossbeam channel通信:
/// - 输入线程: 回放/生成观测帧 → 发送FrameMessage
/// - 平滑线程: 接收FrameMessage → 平滑 → 快照交给输出端 (ChannelSink 转发给消费线程)
///
/// 快照以独立副本的形式跨线程传递, 消费者看到的永远是完整的一帧。
pub mod worker;

pub use worker::{spawn_worker, SmootherWorker, WorkerSummary};

use crate::geometry::Shape;

// ========== 消息类型定义 ==========

/// 输入线程 → 平滑线程
#[derive(Clone, Debug)]
pub enum FrameMessage {
    /// 一帧观测
    Frame(Vec<Shape>),
    /// 处理完已排队的帧后退出
    Shutdown,
}
