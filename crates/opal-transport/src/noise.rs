//! Stochastic face fluxes and the default lattice noise source.
//!
//! Fluctuating transport adds a random flux at every face with variance
//! `2 kT * coeff` per the fluctuation-dissipation relation. Variates are
//! drawn per site over the interior plus one halo layer and averaged
//! onto faces, so both sites sharing a face see the same increment and
//! the update conserves the field exactly.

use crate::flux::FluxSet;
use opal_core::{NoiseSource, TransportError};
use opal_lattice::{Lattice, ShearPlanes};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// A deterministic per-site noise source over the lattice.
///
/// The RNG for each site is a seeded ChaCha8 stream derived from
/// `seed XOR mix(step) XOR mix(global site)`, where the global site is
/// the flat index's coordinate reduced modulo the global extents. A
/// halo site therefore yields exactly the variates of its periodic
/// image, which is what keeps the two copies of a boundary face in
/// agreement, and the stream does not depend on the decomposition, the
/// traversal order, or how many threads the update runs on.
///
/// Constructed via the builder pattern: [`LatticeNoise::builder`].
#[derive(Clone, Debug)]
pub struct LatticeNoise {
    lattice: Lattice,
    ntotal: [i32; 3],
    noffset: [i32; 3],
    seed: u64,
    step: u64,
}

/// Builder for [`LatticeNoise`].
///
/// Required field: `lattice`.
pub struct LatticeNoiseBuilder {
    lattice: Option<Lattice>,
    ntotal: Option<[i32; 3]>,
    noffset: [i32; 3],
    seed: u64,
}

impl LatticeNoise {
    /// Create a new builder.
    pub fn builder() -> LatticeNoiseBuilder {
        LatticeNoiseBuilder {
            lattice: None,
            ntotal: None,
            noffset: [0, 0, 0],
            seed: 0,
        }
    }

    /// Advance to step `step`. Each step yields an independent stream.
    pub fn set_step(&mut self, step: u64) {
        self.step = step;
    }

    /// Generate a Gaussian sample using Box-Muller transform.
    /// Avoids the `rand_distr` dependency.
    fn box_muller(rng: &mut ChaCha8Rng) -> f64 {
        let u1: f64 = rng.gen::<f64>().max(1e-300); // avoid ln(0)
        let u2: f64 = rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Map a flat local site index onto its wrapped global coordinate
    /// key.
    fn global_key(&self, site: usize) -> u64 {
        let [xs, ys, _] = self.lattice.strides();
        let h = self.lattice.nhalo();
        let px = (site / xs) as i32;
        let py = ((site % xs) / ys) as i32;
        let pz = (site % ys) as i32;
        // Padded coordinate -> 1-based local -> 0-based global, wrapped.
        let g = |p: i32, axis: usize| -> u64 {
            (p - h + self.noffset[axis]).rem_euclid(self.ntotal[axis]) as u64
        };
        (g(px, 0) * self.ntotal[1] as u64 + g(py, 1)) * self.ntotal[2] as u64 + g(pz, 2)
    }
}

impl LatticeNoiseBuilder {
    /// Set the local lattice (required).
    pub fn lattice(mut self, lattice: Lattice) -> Self {
        self.lattice = Some(lattice);
        self
    }

    /// Set the global extents (default: the local extents, the serial
    /// case).
    pub fn ntotal(mut self, ntotal: [i32; 3]) -> Self {
        self.ntotal = Some(ntotal);
        self
    }

    /// Set this rank's global offset (default: zero).
    pub fn noffset(mut self, noffset: [i32; 3]) -> Self {
        self.noffset = noffset;
        self
    }

    /// Set the seed (default: 0).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the noise source, starting at step 0.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `lattice` is not set or the offsets fall
    /// outside the global extents.
    pub fn build(self) -> Result<LatticeNoise, String> {
        let lattice = self.lattice.ok_or_else(|| "lattice is required".to_string())?;
        let ntotal = self.ntotal.unwrap_or_else(|| lattice.nlocal());
        for axis in 0..3 {
            if ntotal[axis] < lattice.nlocal()[axis] {
                return Err(format!(
                    "global extent {} smaller than local extent {}",
                    ntotal[axis],
                    lattice.nlocal()[axis]
                ));
            }
            if self.noffset[axis] < 0 || self.noffset[axis] >= ntotal[axis] {
                return Err(format!(
                    "offset {} outside global extent {}",
                    self.noffset[axis], ntotal[axis]
                ));
            }
        }
        Ok(LatticeNoise {
            lattice,
            ntotal,
            noffset: self.noffset,
            seed: self.seed,
            step: 0,
        })
    }
}

impl NoiseSource for LatticeNoise {
    fn reap(&self, site: usize, out: &mut [f64]) {
        let mix = self.seed
            ^ self.step.wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ self.global_key(site).wrapping_mul(0xD1B5_4A32_D192_ED03);
        let mut rng = ChaCha8Rng::seed_from_u64(mix);
        for v in out.iter_mut() {
            *v = Self::box_muller(&mut rng);
        }
    }
}

/// Accumulate stochastic face fluxes with standard deviation `sigma`
/// per variate.
///
/// Three variates are drawn per site over the interior extended by one
/// layer in every direction; each face flux gains the mean of the two
/// adjacent sites' variates for that direction. Refusing local sliding
/// planes is a hard precondition: the plane correction averages fluxes
/// from different random streams and would destroy the face-noise
/// correlation that conservation relies on.
pub fn stochastic(
    flux: &mut FluxSet,
    shear: &ShearPlanes,
    noise: &dyn NoiseSource,
    sigma: f64,
) -> Result<(), TransportError> {
    if shear.nplane_local() > 0 {
        return Err(TransportError::NoiseWithLocalPlanes {
            nplane_local: shear.nplane_local(),
        });
    }
    if flux.nf() != 1 {
        return Err(TransportError::ComponentMismatch {
            expected: 1,
            got: flux.nf(),
        });
    }

    let lattice = *flux.lattice();
    let [nx, ny, nz] = lattice.nlocal();

    // Per-site variates over the extended region, one per direction.
    let mut rflux = vec![0.0; 3 * lattice.nsites()];
    let mut draw = [0.0; 3];
    for ic in 0..=nx + 1 {
        for jc in 0..=ny + 1 {
            for kc in 0..=nz + 1 {
                let index = lattice.index(ic, jc, kc);
                noise.reap(index, &mut draw);
                rflux[3 * index] = sigma * draw[0];
                rflux[3 * index + 1] = sigma * draw[1];
                rflux[3 * index + 2] = sigma * draw[2];
            }
        }
    }

    let [fe, fw, fy, fz] = flux.faces_mut();
    for ic in 1..=nx {
        for jc in 0..=ny {
            for kc in 0..=nz {
                let index0 = lattice.index(ic, jc, kc);

                let index1 = lattice.index(ic - 1, jc, kc);
                fw[index0] += 0.5 * (rflux[3 * index0] + rflux[3 * index1]);

                let index1 = lattice.index(ic + 1, jc, kc);
                fe[index0] += 0.5 * (rflux[3 * index0] + rflux[3 * index1]);

                let index1 = lattice.index(ic, jc + 1, kc);
                fy[index0] += 0.5 * (rflux[3 * index0 + 1] + rflux[3 * index1 + 1]);

                let index1 = lattice.index(ic, jc, kc + 1);
                fz[index0] += 0.5 * (rflux[3 * index0 + 2] + rflux[3 * index1 + 2]);
            }
        }
    }
    Ok(())
}
