//! Trail geometry types.

/// A point in map space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The all-zero triple doubles as the on-disk section terminator.
    #[inline]
    pub fn is_origin(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

/// A contiguous run of trail points on one map.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrailSection {
    map_id: i32,
    points: Vec<Point3>,
}

impl TrailSection {
    /// Create a new section.
    pub fn new(map_id: i32, points: Vec<Point3>) -> Self {
        Self { map_id, points }
    }

    /// Map this section is placed on.
    #[inline]
    pub fn map_id(&self) -> i32 {
        self.map_id
    }

    /// Points in trail order.
    #[inline]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Consume the section and return its points.
    #[inline]
    pub fn into_points(self) -> Vec<Point3> {
        self.points
    }
}
