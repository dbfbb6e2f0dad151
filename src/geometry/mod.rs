//! 障碍物几何模型
//! Obstacle geometry model
//!
//! 封闭的形状集合: 球体 / 胶囊体 / 组合体。
//! 跟踪器只使用三种能力: 参考点、刚体平移、组合体子形状列表的读取与替换。

use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::InvalidReason;

/// 三维坐标 (传感器原生单位)
pub type Coordinate = Vector3<f64>;

/// 两点之间的欧氏距离平方
pub fn squared_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    (a - b).norm_squared()
}

// ========== 基本形状 ==========

/// 球体
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Coordinate,
    pub radius: f64,
}

/// 胶囊体 (两端点 + 半径)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub first: Coordinate,
    pub second: Coordinate,
    pub radius: f64,
}

/// 组合体: 有序的子形状列表
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Composite {
    children: Vec<Shape>,
}

impl Composite {
    pub fn new(children: Vec<Shape>) -> Self {
        Self { children }
    }

    pub fn children(&self) -> &[Shape] {
        &self.children
    }

    /// 整体替换子形状列表
    pub fn set_children(&mut self, children: Vec<Shape>) {
        self.children = children;
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

// ========== 形状 (封闭枚举) ==========

/// 障碍物形状
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Sphere(Sphere),
    Capsule(Capsule),
    Composite(Composite),
}

impl Shape {
    pub fn sphere(center: Coordinate, radius: f64) -> Self {
        Shape::Sphere(Sphere { center, radius })
    }

    pub fn capsule(first: Coordinate, second: Coordinate, radius: f64) -> Self {
        Shape::Capsule(Capsule {
            first,
            second,
            radius,
        })
    }

    pub fn composite(children: Vec<Shape>) -> Self {
        Shape::Composite(Composite::new(children))
    }

    /// 参考点 (用于匹配距离与平滑锚点)
    ///
    /// - 球体: 球心
    /// - 胶囊体: 两端点中点
    /// - 组合体: 子形状参考点的均值
    ///
    /// 空组合体没有参考点, 这里返回原点只是占位; 进入跟踪器的形状都已通过
    /// [`Shape::validate`], 跟踪器内部不会遇到空组合体。
    pub fn center_point(&self) -> Coordinate {
        match self {
            Shape::Sphere(sphere) => sphere.center,
            Shape::Capsule(capsule) => (capsule.first + capsule.second) / 2.0,
            Shape::Composite(composite) => {
                if composite.children.is_empty() {
                    return Coordinate::zeros();
                }
                let sum = composite
                    .children
                    .iter()
                    .fold(Coordinate::zeros(), |acc, child| acc + child.center_point());
                sum / composite.children.len() as f64
            }
        }
    }

    /// 刚体平移 (组合体递归平移所有子形状)
    pub fn translate(&mut self, translation: &Coordinate) {
        match self {
            Shape::Sphere(sphere) => sphere.center += translation,
            Shape::Capsule(capsule) => {
                capsule.first += translation;
                capsule.second += translation;
            }
            Shape::Composite(composite) => {
                for child in &mut composite.children {
                    child.translate(translation);
                }
            }
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Shape::Composite(_))
    }

    pub fn as_composite(&self) -> Option<&Composite> {
        match self {
            Shape::Composite(composite) => Some(composite),
            _ => None,
        }
    }

    pub fn as_composite_mut(&mut self) -> Option<&mut Composite> {
        match self {
            Shape::Composite(composite) => Some(composite),
            _ => None,
        }
    }

    /// 基本形状数量 (组合体递归统计)
    pub fn primitive_count(&self) -> usize {
        match self {
            Shape::Sphere(_) | Shape::Capsule(_) => 1,
            Shape::Composite(composite) => composite
                .children
                .iter()
                .map(Shape::primitive_count)
                .sum(),
        }
    }

    /// 检查形状是否可以进入跟踪器: 所有坐标与半径有限, 组合体非空, 参考点有限
    ///
    /// 端点都有限的形状, 参考点仍可能溢出 (例如两端点都在 1e308 的胶囊体)。
    pub fn validate(&self) -> Result<(), InvalidReason> {
        match self {
            Shape::Sphere(sphere) => {
                if !is_finite(&sphere.center) || !sphere.radius.is_finite() {
                    return Err(InvalidReason::NonFinite);
                }
            }
            Shape::Capsule(capsule) => {
                if !is_finite(&capsule.first)
                    || !is_finite(&capsule.second)
                    || !capsule.radius.is_finite()
                {
                    return Err(InvalidReason::NonFinite);
                }
            }
            Shape::Composite(composite) => {
                if composite.children.is_empty() {
                    return Err(InvalidReason::EmptyComposite);
                }
                composite.children.iter().try_for_each(Shape::validate)?;
            }
        }
        if !is_finite(&self.center_point()) {
            return Err(InvalidReason::NonFinite);
        }
        Ok(())
    }
}

fn is_finite(point: &Coordinate) -> bool {
    point.iter().all(|v| v.is_finite())
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.center_point();
        match self {
            Shape::Sphere(sphere) => write!(
                f,
                "Sphere(({:.3}, {:.3}, {:.3}), r={:.3})",
                c.x, c.y, c.z, sphere.radius
            ),
            Shape::Capsule(capsule) => write!(
                f,
                "Capsule(({:.3}, {:.3}, {:.3}), r={:.3})",
                c.x, c.y, c.z, capsule.radius
            ),
            Shape::Composite(composite) => write!(
                f,
                "Composite(({:.3}, {:.3}, {:.3}), {} children)",
                c.x,
                c.y,
                c.z,
                composite.len()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_spheres() -> Shape {
        Shape::composite(vec![
            Shape::sphere(Coordinate::new(0.0, 0.0, 0.0), 0.1),
            Shape::sphere(Coordinate::new(2.0, 0.0, 0.0), 0.1),
        ])
    }

    #[test]
    fn test_center_points() {
        let sphere = Shape::sphere(Coordinate::new(1.0, 2.0, 3.0), 0.5);
        assert_eq!(sphere.center_point(), Coordinate::new(1.0, 2.0, 3.0));

        let capsule = Shape::capsule(
            Coordinate::new(0.0, 0.0, 0.0),
            Coordinate::new(0.0, 0.0, 2.0),
            0.2,
        );
        assert_relative_eq!(capsule.center_point(), Coordinate::new(0.0, 0.0, 1.0));

        assert_relative_eq!(two_spheres().center_point(), Coordinate::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_translate_composite_recursively() {
        let mut shape = Shape::composite(vec![
            two_spheres(),
            Shape::capsule(
                Coordinate::new(0.0, 1.0, 0.0),
                Coordinate::new(0.0, 1.0, 1.0),
                0.1,
            ),
        ]);
        let before = shape.center_point();
        shape.translate(&Coordinate::new(0.5, -0.5, 1.0));
        assert_relative_eq!(
            shape.center_point(),
            before + Coordinate::new(0.5, -0.5, 1.0),
            epsilon = 1e-12
        );

        let composite = shape.as_composite().unwrap();
        match &composite.children()[1] {
            Shape::Capsule(capsule) => {
                assert_relative_eq!(capsule.first, Coordinate::new(0.5, 0.5, 1.0));
                assert_relative_eq!(capsule.second, Coordinate::new(0.5, 0.5, 2.0));
            }
            other => panic!("unexpected child {}", other),
        }
        assert_eq!(shape.primitive_count(), 3);
    }

    #[test]
    fn test_validate_rejects_non_finite_and_empty() {
        assert!(two_spheres().validate().is_ok());
        assert_eq!(
            Shape::sphere(Coordinate::new(f64::NAN, 0.0, 0.0), 1.0).validate(),
            Err(InvalidReason::NonFinite)
        );
        assert_eq!(
            Shape::capsule(Coordinate::zeros(), Coordinate::zeros(), f64::INFINITY).validate(),
            Err(InvalidReason::NonFinite)
        );
        let nested = Shape::composite(vec![
            Shape::sphere(Coordinate::zeros(), 0.1),
            Shape::composite(vec![Shape::sphere(
                Coordinate::new(0.0, f64::NEG_INFINITY, 0.0),
                0.1,
            )]),
        ]);
        assert_eq!(nested.validate(), Err(InvalidReason::NonFinite));
        assert_eq!(
            Shape::composite(Vec::new()).validate(),
            Err(InvalidReason::EmptyComposite)
        );
    }

    #[test]
    fn test_validate_rejects_overflowing_center() {
        let far = Coordinate::new(1e308, 0.0, 0.0);
        let capsule = Shape::capsule(far, far, 0.1);
        assert!(!is_finite(&capsule.center_point()));
        assert_eq!(capsule.validate(), Err(InvalidReason::NonFinite));

        let composite = Shape::composite(vec![
            Shape::sphere(far, 0.1),
            Shape::sphere(far, 0.1),
        ]);
        assert_eq!(composite.validate(), Err(InvalidReason::NonFinite));

        // 单个大坐标本身没有问题
        assert!(Shape::sphere(far, 0.1).validate().is_ok());
    }

    #[test]
    fn test_set_children_replaces_list() {
        let mut shape = two_spheres();
        let replacement = vec![Shape::sphere(Coordinate::new(5.0, 5.0, 5.0), 1.0)];
        shape
            .as_composite_mut()
            .unwrap()
            .set_children(replacement.clone());
        assert_eq!(shape.as_composite().unwrap().children(), replacement.as_slice());
        assert!(Shape::sphere(Coordinate::zeros(), 1.0).as_composite().is_none());
    }

    #[test]
    fn test_json_layout() {
        let json = r#"{"type":"composite","children":[
            {"type":"sphere","center":[1.0,0.0,0.0],"radius":0.1},
            {"type":"capsule","first":[0.0,0.0,0.0],"second":[0.0,0.0,1.0],"radius":0.05}
        ]}"#;
        let shape: Shape = serde_json::from_str(json).unwrap();
        assert!(shape.is_composite());
        assert_eq!(shape.primitive_count(), 2);
        assert_relative_eq!(shape.center_point(), Coordinate::new(0.5, 0.0, 0.25));
    }
}
