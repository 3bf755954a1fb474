use std::ops::{Add, Mul, Sub};

use cgmath::{Quaternion, Rad, Rotation3};

/// Rotation of the model about the horizontal (X) and vertical (Y) axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tilt {
    pub x: Rad<f32>,
    pub y: Rad<f32>,
}

impl Tilt {
    pub const ZERO: Tilt = Tilt {
        x: Rad(0.0),
        y: Rad(0.0),
    };

    pub fn new(x: Rad<f32>, y: Rad<f32>) -> Self {
        Self { x, y }
    }

    /// Same composition as an `XYZ` Euler rotation: `Rx * Ry`.
    pub fn to_quaternion(self) -> Quaternion<f32> {
        Quaternion::from_angle_x(self.x) * Quaternion::from_angle_y(self.y)
    }

    /// Linear blend towards `other`; `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(self, other: Tilt, t: f32) -> Tilt {
        self + (other - self) * t
    }
}

impl Default for Tilt {
    fn default() -> Self {
        Tilt::ZERO
    }
}

impl Add for Tilt {
    type Output = Tilt;

    fn add(self, rhs: Tilt) -> Tilt {
        Tilt::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Tilt {
    type Output = Tilt;

    fn sub(self, rhs: Tilt) -> Tilt {
        Tilt::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Tilt {
    type Output = Tilt;

    fn mul(self, rhs: f32) -> Tilt {
        Tilt::new(self.x * rhs, self.y * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_untilted() {
        assert_eq!(Tilt::default(), Tilt::ZERO);
        assert_eq!(Tilt::default().to_quaternion(), Quaternion::new(1.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn lerp_hits_both_ends() {
        let to = Tilt::new(Rad(0.3), Rad(-0.2));
        assert_eq!(Tilt::ZERO.lerp(to, 0.0), Tilt::ZERO);
        assert_eq!(Tilt::ZERO.lerp(to, 1.0), to);
    }
}
