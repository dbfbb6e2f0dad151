//! 合成场景: 生成带噪声的逐帧观测 (演示与测试用)
//!
//! 若干真实障碍物沿 x 轴排列 (球体 / 胶囊体 / 组合体轮换),
//! 每帧加入位置抖动、随机漏检和远离障碍物的瞬时误检。

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::geometry::{Coordinate, Shape};

/// 场景参数
#[derive(Clone, Debug)]
pub struct SceneConfig {
    /// 真实障碍物数量
    pub obstacles: usize,
    /// 障碍物间距
    pub spacing: f64,
    /// 每帧位置抖动幅度 (各轴均匀分布)
    pub jitter: f64,
    /// 每帧漏检概率
    pub dropout: f64,
    /// 每帧出现误检的概率
    pub ghost_rate: f64,
    /// 障碍物每帧沿 y 轴的漂移
    pub drift: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            obstacles: 3,
            spacing: 1.0,
            jitter: 0.02,
            dropout: 0.1,
            ghost_rate: 0.2,
            drift: 0.0,
        }
    }
}

pub struct SyntheticScene {
    config: SceneConfig,
    rng: StdRng,
    /// 真实障碍物 (无噪声)
    truth: Vec<Shape>,
    frame: u64,
}

impl SyntheticScene {
    pub fn new(mut config: SceneConfig, seed: u64) -> Self {
        config.dropout = config.dropout.clamp(0.0, 1.0);
        config.ghost_rate = config.ghost_rate.clamp(0.0, 1.0);
        config.jitter = config.jitter.abs();

        let truth = (0..config.obstacles)
            .map(|i| {
                let base = Coordinate::new(i as f64 * config.spacing, 0.0, 1.5);
                match i % 3 {
                    0 => Shape::sphere(base, 0.15),
                    1 => Shape::capsule(
                        base - Coordinate::new(0.0, 0.0, 0.2),
                        base + Coordinate::new(0.0, 0.0, 0.2),
                        0.1,
                    ),
                    _ => Shape::composite(
                        (-1..=1)
                            .map(|k| {
                                Shape::sphere(base + Coordinate::new(k as f64 * 0.1, 0.0, 0.0), 0.08)
                            })
                            .collect(),
                    ),
                }
            })
            .collect();

        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            truth,
            frame: 0,
        }
    }

    pub fn ground_truth(&self) -> &[Shape] {
        &self.truth
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// 生成下一帧观测 (顺序随机)
    pub fn next_frame(&mut self) -> Vec<Shape> {
        self.frame += 1;
        let drift = Coordinate::new(0.0, self.config.drift, 0.0);
        for shape in &mut self.truth {
            shape.translate(&drift);
        }

        let mut observations = Vec::with_capacity(self.truth.len() + 1);
        for shape in &self.truth {
            if self.rng.gen_bool(self.config.dropout) {
                continue;
            }
            let mut observed = shape.clone();
            // 组合体的分解结果每帧可能不同
            if let Some(composite) = observed.as_composite_mut() {
                if composite.len() > 1 && self.rng.gen_bool(0.3) {
                    let mut children = composite.children().to_vec();
                    children.remove(self.rng.gen_range(0..children.len()));
                    composite.set_children(children);
                }
            }
            let j = self.config.jitter;
            let noise = Coordinate::new(
                self.rng.gen_range(-j..=j),
                self.rng.gen_range(-j..=j),
                self.rng.gen_range(-j..=j),
            );
            observed.translate(&noise);
            observations.push(observed);
        }

        if self.rng.gen_bool(self.config.ghost_rate) {
            // 误检出现在障碍物所在行之外
            let width = self.config.spacing * self.truth.len().max(1) as f64;
            let ghost = Coordinate::new(
                self.rng.gen_range(-1.0..=width),
                self.rng.gen_range(1.0..=3.0),
                self.rng.gen_range(0.0..=2.0),
            );
            observations.push(Shape::sphere(ghost, 0.05));
        }

        observations.shuffle(&mut self.rng);
        observations
    }
}

impl Iterator for SyntheticScene {
    type Item = Vec<Shape>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smoothing::ObstacleSmoother;

    #[test]
    fn test_same_seed_same_frames() {
        let a: Vec<Vec<Shape>> = SyntheticScene::new(SceneConfig::default(), 7).take(20).collect();
        let b: Vec<Vec<Shape>> = SyntheticScene::new(SceneConfig::default(), 7).take(20).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_clean_scene_emits_every_obstacle() {
        let config = SceneConfig {
            obstacles: 4,
            dropout: 0.0,
            ghost_rate: 0.0,
            ..Default::default()
        };
        let mut scene = SyntheticScene::new(config, 1);
        for _ in 0..5 {
            let frame = scene.next_frame();
            assert_eq!(frame.len(), 4);
            assert!(frame.iter().all(|s| s.validate().is_ok()));
        }
        assert_eq!(scene.frame(), 5);
    }

    #[test]
    fn test_smoother_suppresses_ghosts_and_dropouts() {
        let config = SceneConfig {
            obstacles: 3,
            ..Default::default()
        };
        let mut scene = SyntheticScene::new(config, 42);
        let mut smoother = ObstacleSmoother::default();
        for frame in scene.by_ref().take(60) {
            smoother.process_frame(&frame).unwrap();
        }
        assert_eq!(smoother.confirmed_count(), 3);

        // 确认对象位于真实障碍物附近
        for track in smoother.materialized() {
            let center = track.shape.center_point();
            let nearest = scene
                .ground_truth()
                .iter()
                .map(|s| (s.center_point() - center).norm())
                .fold(f64::INFINITY, f64::min);
            assert!(nearest < 0.1, "track {} is {:.3} away", track.id, nearest);
        }
    }
}
