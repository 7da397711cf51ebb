//! Sliding-plane (Lees-Edwards) geometry.
//!
//! A sliding plane sits between lattice column `x` and `x + 1`; its
//! periodic image is displaced along y by `dy(t)`, which the caller
//! accumulates over time (typically `plane_speed * t`). This module is
//! geometry only: it records where the planes are and how far they have
//! slid. Interpolating field or flux data across a plane is the job of
//! the transport crate.

use crate::error::LatticeError;
use smallvec::SmallVec;

/// The set of sliding planes local to one rank, plus the current
/// uniform displacement.
///
/// All planes share one displacement magnitude (a uniform shear
/// profile); "looking up" planes apply `+dy`, "looking down" `-dy`.
/// Read-only during a transport step.
#[derive(Clone, Debug)]
pub struct ShearPlanes {
    locations: SmallVec<[i32; 2]>,
    ly: f64,
    dy: f64,
}

impl ShearPlanes {
    /// No planes at all (plain periodic domain of y extent `ly`).
    pub fn none(ly: f64) -> Self {
        Self {
            locations: SmallVec::new(),
            ly,
            dy: 0.0,
        }
    }

    /// Planes at the given local x locations, for a domain of global
    /// y extent `ly`. A plane at `x` separates columns `x` and `x + 1`,
    /// so each location must satisfy `1 <= x < nx`.
    pub fn new(locations: &[i32], nx: i32, ly: f64) -> Result<Self, LatticeError> {
        for &x in locations {
            if x < 1 || x >= nx {
                return Err(LatticeError::PlaneOutOfRange { location: x, nx });
            }
        }
        Ok(Self {
            locations: locations.iter().copied().collect(),
            ly,
            dy: 0.0,
        })
    }

    /// Number of planes local to this rank.
    pub fn nplane_local(&self) -> usize {
        self.locations.len()
    }

    /// Local x location of plane `ip`.
    ///
    /// # Panics
    ///
    /// Panics if `ip >= nplane_local()`.
    pub fn plane_location(&self, ip: usize) -> i32 {
        self.locations[ip]
    }

    /// Current displacement of the sliding image, not yet reduced
    /// modulo the y extent.
    pub fn plane_dy(&self) -> f64 {
        self.dy
    }

    /// Global y extent as a length.
    pub fn ly(&self) -> f64 {
        self.ly
    }

    /// Record the accumulated displacement (caller owns the time
    /// integration; many steps of accumulation are fine, the users of
    /// `plane_dy` reduce it modulo `ly`).
    pub fn set_displacement(&mut self, dy: f64) {
        self.dy = dy;
    }

    /// Split a signed displacement into its integral row part and the
    /// fractional remainder in `[0, 1)`, after reduction modulo `ly`.
    ///
    /// This is the interpolation arithmetic every plane consumer uses:
    /// `dy.rem_euclid(ly)` maps any accumulated displacement onto a
    /// valid row, `floor` splits it.
    pub fn split_displacement(&self, signed_dy: f64) -> (i32, f64) {
        let dy = signed_dy.rem_euclid(self.ly);
        let jdy = dy.floor();
        (jdy as i32, dy - jdy)
    }
}
