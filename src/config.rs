//! 平滑器配置 - 通过JSON文件调整参数

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SmootherError;

/// 平滑器参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmootherConfig {
    /// 匹配阈值: 参考点距离平方上限 (传感器单位²)
    pub match_threshold: f64,
    /// 连续出现多少帧后确认 (物化)
    pub found_threshold: u32,
    /// 连续丢失多少帧后删除
    pub lost_threshold: u32,
    /// 组合体结构刷新周期 (帧), 0 表示关闭
    pub refresh_period: u64,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.05,
            found_threshold: 5,
            lost_threshold: 10,
            refresh_period: 30,
        }
    }
}

impl SmootherConfig {
    /// 从JSON文件加载配置 (缺失字段取默认值)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        info!("✅ 配置已从 {} 加载", path.display());
        Ok(config)
    }

    /// 加载配置, 文件不存在时写入默认配置
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        warn!("📝 配置文件 {} 不存在, 创建默认配置", path.display());
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write config {}", path.display()))?;
        info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SmootherError> {
        if !self.match_threshold.is_finite() || self.match_threshold < 0.0 {
            return Err(SmootherError::InvalidConfig(format!(
                "match_threshold must be a finite, non-negative squared distance (got {})",
                self.match_threshold
            )));
        }
        if self.found_threshold == 0 {
            return Err(SmootherError::InvalidConfig(
                "found_threshold must be at least 1".to_string(),
            ));
        }
        if self.lost_threshold == 0 {
            return Err(SmootherError::InvalidConfig(
                "lost_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// 打印当前配置
    pub fn log_summary(&self) {
        info!("🎛️  当前平滑器配置:");
        info!("  匹配阈值(距离²): {:.4}", self.match_threshold);
        info!("  确认帧数: {}", self.found_threshold);
        info!("  删除帧数: {}", self.lost_threshold);
        if self.refresh_period == 0 {
            info!("  组合体刷新: 关闭");
        } else {
            info!("  组合体刷新周期: {} 帧", self.refresh_period);
        }
    }
}
