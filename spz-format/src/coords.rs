//! Coordinate-system conversion
//!
//! Each named system fixes the direction of the three axes:
//! Left/Right for x, Down/Up for y, Back/Front for z. Converting between two
//! systems is a per-axis sign flip, which also flips quaternion imaginary
//! parts and the odd spherical-harmonics basis functions.
//!
//! SPZ files are stored in [`CoordinateSystem::Rub`] (the OpenGL/three.js
//! convention).

use std::fmt;
use std::str::FromStr;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::packing::SH_MAX_COEFFS;

/// Axis convention of a point cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum CoordinateSystem {
    /// No conversion is performed to or from this system
    #[default]
    Unspecified = 0,
    /// Left, Down, Back
    Ldb = 1,
    /// Right, Down, Back
    Rdb = 2,
    /// Left, Up, Back
    Lub = 3,
    /// Right, Up, Back (SPZ storage, OpenGL)
    Rub = 4,
    /// Left, Down, Front
    Ldf = 5,
    /// Right, Down, Front (PLY, COLMAP)
    Rdf = 6,
    /// Left, Up, Front (Unity)
    Luf = 7,
    /// Right, Up, Front
    Ruf = 8,
}

impl CoordinateSystem {
    /// Native system of the SPZ container
    pub const STORAGE: Self = Self::Rub;

    /// All named systems, excluding `Unspecified`
    pub const ALL: [Self; 8] = [
        Self::Ldb,
        Self::Rdb,
        Self::Lub,
        Self::Rub,
        Self::Ldf,
        Self::Rdf,
        Self::Luf,
        Self::Ruf,
    ];

    /// Direction of each axis: +1 for Right/Up/Front, -1 for Left/Down/Back
    pub const fn axis_signs(self) -> Option<[f32; 3]> {
        let signs = match self {
            Self::Unspecified => return None,
            Self::Ldb => [-1.0, -1.0, -1.0],
            Self::Rdb => [1.0, -1.0, -1.0],
            Self::Lub => [-1.0, 1.0, -1.0],
            Self::Rub => [1.0, 1.0, -1.0],
            Self::Ldf => [-1.0, -1.0, 1.0],
            Self::Rdf => [1.0, -1.0, 1.0],
            Self::Luf => [-1.0, 1.0, 1.0],
            Self::Ruf => [1.0, 1.0, 1.0],
        };
        Some(signs)
    }

    /// Convert from the raw identifier stored by other tools
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unspecified),
            1 => Some(Self::Ldb),
            2 => Some(Self::Rdb),
            3 => Some(Self::Lub),
            4 => Some(Self::Rub),
            5 => Some(Self::Ldf),
            6 => Some(Self::Rdf),
            7 => Some(Self::Luf),
            8 => Some(Self::Ruf),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Ldb => "LDB",
            Self::Rdb => "RDB",
            Self::Lub => "LUB",
            Self::Rub => "RUB",
            Self::Ldf => "LDF",
            Self::Rdf => "RDF",
            Self::Luf => "LUF",
            Self::Ruf => "RUF",
        }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CoordinateSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        if upper == "UNSPECIFIED" || upper == "NONE" {
            return Ok(Self::Unspecified);
        }
        Self::ALL
            .into_iter()
            .find(|system| system.name() == upper)
            .ok_or_else(|| format!("Unknown coordinate system: {s:?} (expected e.g. RUB, RDF)"))
    }
}

/// Sign flips that map attributes from one coordinate system to another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateConverter {
    /// Per-axis position flips
    pub position: [f32; 3],
    /// Flips for the quaternion x, y, z components (w never flips)
    pub rotation: [f32; 3],
    /// Flips for each SH coefficient (all three color channels share them)
    pub sh: [f32; SH_MAX_COEFFS],
}

impl Default for CoordinateConverter {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CoordinateConverter {
    pub const IDENTITY: Self = Self {
        position: [1.0; 3],
        rotation: [1.0; 3],
        sh: [1.0; SH_MAX_COEFFS],
    };

    /// Build the converter from `from` to `to`
    ///
    /// Either side being [`CoordinateSystem::Unspecified`] gives the identity.
    pub fn new(from: CoordinateSystem, to: CoordinateSystem) -> Self {
        let (Some(a), Some(b)) = (from.axis_signs(), to.axis_signs()) else {
            return Self::IDENTITY;
        };
        let [x, y, z] = [a[0] * b[0], a[1] * b[1], a[2] * b[2]];

        Self {
            position: [x, y, z],
            rotation: [y * z, x * z, x * y],
            sh: [
                // Degree 1
                y,
                z,
                x,
                // Degree 2
                x * y,
                y * z,
                1.0,
                x * z,
                1.0,
                // Degree 3
                y,
                x * y * z,
                y,
                z,
                x,
                z,
                x,
            ],
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Converter for the opposite direction
    ///
    /// Flips are involutions, so this is the same table.
    pub fn inverse(&self) -> Self {
        *self
    }

    #[inline]
    pub fn apply_position(&self, position: Vec3) -> Vec3 {
        position * Vec3::from_array(self.position)
    }

    #[inline]
    pub fn apply_rotation(&self, rotation: Quat) -> Quat {
        let [fx, fy, fz] = self.rotation;
        Quat::from_xyzw(rotation.x * fx, rotation.y * fy, rotation.z * fz, rotation.w)
    }

    #[inline]
    pub fn apply_sh(&self, sh: &mut [Vec3; SH_MAX_COEFFS]) {
        for (coeff, flip) in sh.iter_mut().zip(self.sh) {
            *coeff *= flip;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unspecified_is_identity() {
        for system in CoordinateSystem::ALL {
            assert!(CoordinateConverter::new(CoordinateSystem::Unspecified, system).is_identity());
            assert!(CoordinateConverter::new(system, CoordinateSystem::Unspecified).is_identity());
        }
    }

    #[test]
    fn test_same_system_is_identity() {
        for system in CoordinateSystem::ALL {
            assert!(CoordinateConverter::new(system, system).is_identity());
        }
    }

    #[test]
    fn test_rub_to_rdf() {
        let c = CoordinateConverter::new(CoordinateSystem::Rub, CoordinateSystem::Rdf);
        assert_eq!(c.position, [1.0, -1.0, -1.0]);
        // x flips with y*z, y with x*z, z with x*y
        assert_eq!(c.rotation, [1.0, -1.0, -1.0]);
        assert_eq!(
            c.sh,
            [
                -1.0, -1.0, 1.0, // degree 1
                -1.0, 1.0, 1.0, -1.0, 1.0, // degree 2
                -1.0, 1.0, -1.0, -1.0, 1.0, -1.0, 1.0, // degree 3
            ]
        );
    }

    #[test]
    fn test_rub_to_luf_flips_x_and_z() {
        let c = CoordinateConverter::new(CoordinateSystem::Rub, CoordinateSystem::Luf);
        assert_eq!(c.position, [-1.0, 1.0, -1.0]);
        assert_eq!(c.rotation, [-1.0, 1.0, -1.0]);
        assert_eq!(
            c.apply_position(Vec3::new(1.0, 2.0, 3.0)),
            Vec3::new(-1.0, 2.0, -3.0)
        );
    }

    #[test]
    fn test_inverse_law() {
        let p = Vec3::new(0.25, -1.5, 3.0);
        let q = Quat::from_xyzw(0.1, -0.2, 0.3, 0.927);
        let mut sh = [Vec3::ZERO; SH_MAX_COEFFS];
        for (i, coeff) in sh.iter_mut().enumerate() {
            *coeff = Vec3::new(i as f32, -(i as f32) * 0.5, 0.25);
        }

        for a in CoordinateSystem::ALL {
            for b in CoordinateSystem::ALL {
                let forward = CoordinateConverter::new(a, b);
                let back = CoordinateConverter::new(b, a);

                assert_eq!(back.apply_position(forward.apply_position(p)), p);
                assert_eq!(back.apply_rotation(forward.apply_rotation(q)), q);

                let mut converted = sh;
                forward.apply_sh(&mut converted);
                back.apply_sh(&mut converted);
                assert_eq!(converted, sh);
                assert_eq!(forward.inverse(), back);
            }
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("rub".parse::<CoordinateSystem>(), Ok(CoordinateSystem::Rub));
        assert_eq!(" RDF ".parse::<CoordinateSystem>(), Ok(CoordinateSystem::Rdf));
        assert_eq!(
            "none".parse::<CoordinateSystem>(),
            Ok(CoordinateSystem::Unspecified)
        );
        assert!("xyz".parse::<CoordinateSystem>().is_err());
        for system in CoordinateSystem::ALL {
            assert_eq!(system.to_string().parse::<CoordinateSystem>(), Ok(system));
            assert_eq!(CoordinateSystem::from_u8(system as u8), Some(system));
        }
        assert_eq!(CoordinateSystem::from_u8(9), None);
    }
}
