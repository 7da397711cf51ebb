//! Per-site field storage over the halo-padded index space.
//!
//! A [`Field`] is a dense `nf`-component vector per site, site-major
//! (`site * nf + component`). The scalar order parameter has `nf = 1`;
//! the tensor order parameter stores its five independent components
//! (`nf = 5`) with ZZ derived from tracelessness.

use crate::lattice::Lattice;
use opal_core::{CommError, Sym3, NQAB};

/// Dense per-site field data.
#[derive(Clone, Debug)]
pub struct Field {
    lattice: Lattice,
    nf: usize,
    data: Vec<f64>,
}

impl Field {
    /// Allocate a zeroed field with `nf` components per site.
    pub fn new(lattice: Lattice, nf: usize) -> Self {
        Self {
            lattice,
            nf,
            data: vec![0.0; lattice.nsites() * nf],
        }
    }

    /// The index space this field is laid out over.
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Components per site.
    pub fn nf(&self) -> usize {
        self.nf
    }

    /// Total sites including halo.
    pub fn nsites(&self) -> usize {
        self.lattice.nsites()
    }

    /// Component `n` at `site`.
    pub fn get(&self, site: usize, n: usize) -> f64 {
        self.data[site * self.nf + n]
    }

    /// Set component `n` at `site`.
    pub fn set(&mut self, site: usize, n: usize, value: f64) {
        self.data[site * self.nf + n] = value;
    }

    /// Scalar value at `site` (first component).
    pub fn scalar(&self, site: usize) -> f64 {
        self.data[site * self.nf]
    }

    /// Set the scalar value at `site`.
    pub fn set_scalar(&mut self, site: usize, value: f64) {
        self.data[site * self.nf] = value;
    }

    /// Tensor value at `site`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the field does not carry five
    /// components.
    pub fn tensor(&self, site: usize) -> Sym3 {
        debug_assert_eq!(self.nf, NQAB);
        let base = site * self.nf;
        Sym3::from_components([
            self.data[base],
            self.data[base + 1],
            self.data[base + 2],
            self.data[base + 3],
            self.data[base + 4],
        ])
    }

    /// Set the tensor value at `site`.
    pub fn set_tensor(&mut self, site: usize, q: Sym3) {
        debug_assert_eq!(self.nf, NQAB);
        let base = site * self.nf;
        self.data[base..base + NQAB].copy_from_slice(&q.components());
    }

    /// Raw site-major data.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Raw site-major data, mutable.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Sum of one component over the interior (halo excluded).
    ///
    /// Conservation checks compare this before and after a step.
    pub fn interior_sum(&self, n: usize) -> f64 {
        let [nx, ny, nz] = self.lattice.nlocal();
        let mut total = 0.0;
        for ic in 1..=nx {
            for jc in 1..=ny {
                for kc in 1..=nz {
                    total += self.get(self.lattice.index(ic, jc, kc), n);
                }
            }
        }
        total
    }
}

/// Halo refresh collaborator.
///
/// A transport step requires every halo site to hold valid data before
/// any stencil touches it. How the halo is filled depends on the run:
/// single-rank periodic domains copy wrapped interior data, distributed
/// runs exchange it with neighbour ranks, and sheared runs additionally
/// interpolate across the sliding planes. The drivers only see this
/// trait.
pub trait HaloExchange: Send + Sync {
    /// Refresh every halo site of `field` from current interior data.
    fn refresh(&self, field: &mut Field) -> Result<(), CommError>;
}

/// Periodic halo refresh for a domain that is whole on one rank.
///
/// Wraps all three axes; suitable for every single-rank test scenario
/// and for production runs without decomposition.
#[derive(Clone, Copy, Debug, Default)]
pub struct PeriodicHalo;

impl HaloExchange for PeriodicHalo {
    fn refresh(&self, field: &mut Field) -> Result<(), CommError> {
        let lattice = *field.lattice();
        let [nx, ny, nz] = lattice.nlocal();
        let h = lattice.nhalo();
        let nf = field.nf();

        let wrap = |c: i32, n: i32| -> i32 { (c - 1).rem_euclid(n) + 1 };

        for ic in (1 - h)..=(nx + h) {
            for jc in (1 - h)..=(ny + h) {
                for kc in (1 - h)..=(nz + h) {
                    if lattice.is_interior(ic, jc, kc) {
                        continue;
                    }
                    let dst = lattice.index(ic, jc, kc);
                    let src = lattice.index(wrap(ic, nx), wrap(jc, ny), wrap(kc, nz));
                    for n in 0..nf {
                        let v = field.get(src, n);
                        field.set(dst, n, v);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip() {
        let lat = Lattice::new([4, 4, 4], 1).unwrap();
        let mut f = Field::new(lat, 1);
        let idx = lat.index(2, 3, 4);
        f.set_scalar(idx, 1.5);
        assert_eq!(f.scalar(idx), 1.5);
        assert_eq!(f.get(idx, 0), 1.5);
    }

    #[test]
    fn tensor_round_trip() {
        let lat = Lattice::new([2, 2, 2], 1).unwrap();
        let mut f = Field::new(lat, NQAB);
        let q = Sym3 {
            xx: 0.1,
            xy: -0.2,
            xz: 0.3,
            yy: -0.4,
            yz: 0.5,
        };
        let idx = lat.index(1, 2, 1);
        f.set_tensor(idx, q);
        assert_eq!(f.tensor(idx), q);
        assert!((f.tensor(idx).zz() - 0.3).abs() < 1e-15);
    }

    #[test]
    fn periodic_halo_wraps_all_axes() {
        let lat = Lattice::new([3, 3, 3], 2).unwrap();
        let mut f = Field::new(lat, 1);
        // Tag each interior site with a unique value.
        for ic in 1..=3 {
            for jc in 1..=3 {
                for kc in 1..=3 {
                    f.set_scalar(lat.index(ic, jc, kc), (100 * ic + 10 * jc + kc) as f64);
                }
            }
        }
        PeriodicHalo.refresh(&mut f).unwrap();

        // x halo: ic = 0 is the image of ic = 3; ic = -1 of ic = 2.
        assert_eq!(f.scalar(lat.index(0, 2, 2)), 322.0);
        assert_eq!(f.scalar(lat.index(-1, 2, 2)), 222.0);
        assert_eq!(f.scalar(lat.index(4, 2, 2)), 122.0);
        // Mixed corner: (0, 4, -1) is the image of (3, 1, 2).
        assert_eq!(f.scalar(lat.index(0, 4, -1)), 312.0);
    }

    #[test]
    fn interior_sum_ignores_halo() {
        let lat = Lattice::new([2, 2, 2], 1).unwrap();
        let mut f = Field::new(lat, 1);
        for site in 0..f.nsites() {
            f.set_scalar(site, 1.0);
        }
        assert_eq!(f.interior_sum(0), 8.0);
    }
}
