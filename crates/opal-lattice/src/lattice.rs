//! The halo-padded 3-D index space.
//!
//! Interior sites carry 1-based coordinates `1..=n` per axis; the halo
//! extends the range to `1-nhalo..=n+nhalo`. Flat site indices are
//! x-major: the z stride is 1, the y stride is the padded z extent, and
//! the x stride is the padded y-z slab.

use crate::error::LatticeError;

/// Local lattice extents plus halo width, with flat-index arithmetic.
///
/// `Lattice` owns no data; it is a cheap `Copy` value shared by fields,
/// flux sets, and the stencil loops so that all of them agree on the
/// same index space.
///
/// # Examples
///
/// ```
/// use opal_lattice::Lattice;
///
/// let lat = Lattice::new([8, 8, 8], 2).unwrap();
/// assert_eq!(lat.nsites(), 12 * 12 * 12);
///
/// // Neighbouring sites along z differ by one flat index.
/// let here = lat.index(3, 4, 5);
/// assert_eq!(lat.index(3, 4, 6), here + 1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lattice {
    nlocal: [i32; 3],
    nhalo: i32,
}

impl Lattice {
    /// Create a lattice with local interior extents `nlocal` and halo
    /// width `nhalo`.
    ///
    /// Returns `Err` if any extent is < 1 or the halo is < 1.
    pub fn new(nlocal: [i32; 3], nhalo: i32) -> Result<Self, LatticeError> {
        for (extent, axis) in nlocal.iter().zip(["x", "y", "z"]) {
            if *extent < 1 {
                return Err(LatticeError::EmptyExtent { axis });
            }
        }
        if nhalo < 1 {
            return Err(LatticeError::HaloTooSmall);
        }
        Ok(Self { nlocal, nhalo })
    }

    /// Local interior extents `[nx, ny, nz]`.
    pub fn nlocal(&self) -> [i32; 3] {
        self.nlocal
    }

    /// Halo width in layers.
    pub fn nhalo(&self) -> i32 {
        self.nhalo
    }

    /// Padded extents `[nx + 2h, ny + 2h, nz + 2h]`.
    pub fn nall(&self) -> [i32; 3] {
        let h = 2 * self.nhalo;
        [
            self.nlocal[0] + h,
            self.nlocal[1] + h,
            self.nlocal[2] + h,
        ]
    }

    /// Total number of sites including the halo.
    pub fn nsites(&self) -> usize {
        let nall = self.nall();
        (nall[0] as usize) * (nall[1] as usize) * (nall[2] as usize)
    }

    /// Flat-index strides `[xs, ys, zs]` with `zs == 1`.
    pub fn strides(&self) -> [usize; 3] {
        let nall = self.nall();
        let zs = 1usize;
        let ys = nall[2] as usize;
        let xs = ys * nall[1] as usize;
        [xs, ys, zs]
    }

    /// Flat site index for coordinates in `1-nhalo..=n+nhalo`.
    ///
    /// # Panics
    ///
    /// Debug builds assert the coordinates lie inside the padded box.
    pub fn index(&self, ic: i32, jc: i32, kc: i32) -> usize {
        let h = self.nhalo;
        debug_assert!(ic >= 1 - h && ic <= self.nlocal[0] + h);
        debug_assert!(jc >= 1 - h && jc <= self.nlocal[1] + h);
        debug_assert!(kc >= 1 - h && kc <= self.nlocal[2] + h);
        let [xs, ys, _] = self.strides();
        (h + ic - 1) as usize * xs + (h + jc - 1) as usize * ys + (h + kc - 1) as usize
    }

    /// Whether a coordinate triple lies in the interior (not the halo).
    pub fn is_interior(&self, ic: i32, jc: i32, kc: i32) -> bool {
        ic >= 1
            && ic <= self.nlocal[0]
            && jc >= 1
            && jc <= self.nlocal[1]
            && kc >= 1
            && kc <= self.nlocal[2]
    }

    /// Whether the system has a single layer in z.
    ///
    /// Quasi-2-D systems suppress the up/down divergence contribution:
    /// no meaningful gradient exists across one layer.
    pub fn is_quasi_2d(&self) -> bool {
        self.nlocal[2] == 1
    }

    /// Number of interior sites.
    pub fn interior_sites(&self) -> usize {
        (self.nlocal[0] as usize) * (self.nlocal[1] as usize) * (self.nlocal[2] as usize)
    }
}
