/// 观测输入 (Observation Input)
///
/// 平滑器本身不负责采集与分割, 这里只提供两个前端:
/// - FrameReader:    回放 JSON Lines 记录的逐帧观测 (文件或标准输入)
/// - SyntheticScene: 带噪声的合成场景 (演示与测试)
pub mod replay;
pub mod synthetic;

pub use replay::FrameReader;
pub use synthetic::{SceneConfig, SyntheticScene};
