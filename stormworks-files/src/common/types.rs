use glam::{Quat, Vec3};
use stormworks_files_derive_parseable::{Emit, Parse};

/// Stormworks is Y up.
#[derive(Debug, Copy, Clone, PartialEq, Default, Parse, Emit)]
pub struct SwVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl SwVec3 {
    pub const ZERO: SwVec3 = SwVec3::new(0.0, 0.0, 0.0);
    pub const ONE: SwVec3 = SwVec3::new(1.0, 1.0, 1.0);
    pub const UP: SwVec3 = SwVec3::new(0.0, 1.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        SwVec3 { x, y, z }
    }

    pub const fn splat(v: f32) -> Self {
        SwVec3::new(v, v, v)
    }
}

impl From<Vec3> for SwVec3 {
    fn from(value: Vec3) -> Self {
        SwVec3::new(value.x, value.y, value.z)
    }
}

impl From<SwVec3> for Vec3 {
    fn from(value: SwVec3) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Parse, Emit)]
pub struct SwVec2 {
    pub x: f32,
    pub y: f32,
}

impl SwVec2 {
    pub const ZERO: SwVec2 = SwVec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        SwVec2 { x, y }
    }
}

/// 8 bit RGBA, in file order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Parse, Emit)]
pub struct SwColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SwColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        SwColor { r, g, b, a }
    }

    /// Packs the color into a u32, handy as a hash key.
    pub fn to_bits(self) -> u32 {
        u32::from_le_bytes([self.r, self.g, self.b, self.a])
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Parse, Emit)]
pub struct SwQuaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for SwQuaternion {
    fn default() -> Self {
        SwQuaternion::IDENTITY
    }
}

impl SwQuaternion {
    pub const IDENTITY: SwQuaternion = SwQuaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        SwQuaternion { x, y, z, w }
    }
}

impl From<Quat> for SwQuaternion {
    fn from(value: Quat) -> Self {
        SwQuaternion::new(value.x, value.y, value.z, value.w)
    }
}

/// Not normalized, use `Quat::is_normalized` before rotating with it.
impl From<SwQuaternion> for Quat {
    fn from(value: SwQuaternion) -> Self {
        Quat::from_xyzw(value.x, value.y, value.z, value.w)
    }
}

/// Row major 3x3 matrix, as used by the animation format.
#[derive(Debug, Copy, Clone, PartialEq, Default, Parse, Emit)]
pub struct SwMatrix3 {
    pub m: [f32; 9],
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Parse, Emit)]
pub struct Aabb {
    pub min: SwVec3,
    pub max: SwVec3,
}

impl Aabb {
    pub fn from_points<P: Into<Vec3>, I: IntoIterator<Item = P>>(points: I) -> Option<Aabb> {
        let mut iter = points.into_iter().map(|p| -> Vec3 { p.into() });
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Aabb {
            min: min.into(),
            max: max.into(),
        })
    }

    pub fn center(self) -> Vec3 {
        (Vec3::from(self.min) + Vec3::from(self.max)) * 0.5
    }

    pub fn is_valid(self) -> bool {
        let (min, max) = (Vec3::from(self.min), Vec3::from(self.max));
        min.is_finite() && max.is_finite() && min.cmple(max).all()
    }
}
