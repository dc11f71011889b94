use std::fmt;
use std::ops::Deref;

use glam::Vec3;

/// Opaque handle identifying an actor for the lifetime of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One of the two sides of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TeamId {
    #[strum(to_string = "team 0")]
    Zero,
    #[strum(to_string = "team 1")]
    One,
}

impl TeamId {
    pub const ALL: [TeamId; 2] = [TeamId::Zero, TeamId::One];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            TeamId::Zero => 0,
            TeamId::One => 1,
        }
    }

    #[inline]
    pub const fn other(self) -> Self {
        match self {
            TeamId::Zero => TeamId::One,
            TeamId::One => TeamId::Zero,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(TeamId::Zero),
            1 => Some(TeamId::One),
            _ => None,
        }
    }
}

/// Point in arena space. `y` is the vertical axis; units stand on `y = 0`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point(pub Vec3);

impl Point {
    pub const ORIGIN: Self = Self(Vec3::ZERO);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self(Vec3::new(x, y, z))
    }

    /// Point on the ground plane.
    pub const fn ground(x: f32, z: f32) -> Self {
        Self(Vec3::new(x, 0.0, z))
    }

    pub fn distance(self, other: Point) -> f32 {
        self.0.distance(other.0)
    }

    /// Same point lifted by `height` along the vertical axis.
    pub fn raised(self, height: f32) -> Self {
        Self(self.0 + Vec3::Y * height)
    }

    /// Steps towards `target` by at most `max_step`, never overshooting.
    pub fn move_towards(self, target: Point, max_step: f32) -> Point {
        let distance = self.distance(target);
        if distance <= max_step || distance <= f32::EPSILON {
            return target;
        }
        Self(self.0.lerp(target.0, max_step / distance))
    }
}

impl Deref for Point {
    type Target = Vec3;

    fn deref(&self) -> &Vec3 {
        &self.0
    }
}

impl From<Vec3> for Point {
    fn from(v: Vec3) -> Self {
        Self(v)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_towards_stops_at_target() {
        let from = Point::ground(0.0, 0.0);
        let to = Point::ground(3.0, 4.0);

        let halfway = from.move_towards(to, 2.5);
        assert!((halfway.distance(to) - 2.5).abs() < 1e-5);
        assert_eq!(from.move_towards(to, 10.0), to);
    }

    #[test]
    fn raised_only_lifts_the_vertical_axis() {
        let lifted = Point::ground(2.0, 3.0).raised(1.5);
        assert_eq!(lifted, Point::new(2.0, 1.5, 3.0));
        assert_eq!(lifted.x, 2.0);
    }

    #[test]
    fn team_other_alternates() {
        assert_eq!(TeamId::Zero.other(), TeamId::One);
        assert_eq!(TeamId::One.other(), TeamId::Zero);
        assert_eq!(TeamId::from_index(1), Some(TeamId::One));
        assert_eq!(TeamId::from_index(2), None);
    }
}
