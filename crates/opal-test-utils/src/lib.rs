//! Test utilities and mock types for Opal development.
//!
//! Provides mock implementations of the collaborator traits
//! ([`ChemicalPotential`], [`MolecularField`], [`NoiseSource`],
//! [`FluidMap`]) plus small field fixtures shared by the transport
//! integration tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::HashMap;

use opal_core::{ChemicalPotential, FluidMap, MolecularField, NoiseSource, SiteStatus, Sym3};
use opal_lattice::{Field, HaloExchange, Lattice, PeriodicHalo};

/// Mock implementation of [`ChemicalPotential`].
///
/// Backed by a dense per-site vector for flexible test setup; sites not
/// explicitly set answer with the default value.
pub struct MockPotential {
    default: f64,
    values: HashMap<usize, f64>,
}

impl MockPotential {
    pub fn new(default: f64) -> Self {
        Self {
            default,
            values: HashMap::new(),
        }
    }

    /// Pre-populate one site's potential.
    pub fn set(&mut self, site: usize, mu: f64) {
        self.values.insert(site, mu);
    }
}

impl ChemicalPotential for MockPotential {
    fn mu(&self, site: usize) -> f64 {
        self.values.get(&site).copied().unwrap_or(self.default)
    }
}

/// A chemical potential that simply mirrors a scalar field's current
/// values: `mu = phi`. Turns conserved transport into plain diffusion
/// with diffusivity equal to the mobility, the simplest closed system
/// a scenario test can reason about.
pub struct IdentityPotential {
    values: Vec<f64>,
}

impl IdentityPotential {
    /// Snapshot `phi` (including halo sites) as the potential.
    pub fn from_field(phi: &Field) -> Self {
        Self {
            values: phi.data().to_vec(),
        }
    }
}

impl ChemicalPotential for IdentityPotential {
    fn mu(&self, site: usize) -> f64 {
        self.values[site]
    }
}

/// Mock implementation of [`MolecularField`] answering a constant
/// tensor everywhere.
pub struct ConstantMolecularField(pub Sym3);

impl MolecularField for ConstantMolecularField {
    fn h(&self, _site: usize) -> Sym3 {
        self.0
    }
}

/// Mock implementation of [`NoiseSource`] answering fixed variates,
/// for tests that need exact arithmetic rather than statistics.
pub struct ConstantNoise(pub f64);

impl NoiseSource for ConstantNoise {
    fn reap(&self, _site: usize, out: &mut [f64]) {
        out.fill(self.0);
    }
}

/// Mock implementation of [`FluidMap`] with an explicit solid set.
pub struct MockMap {
    solid: Vec<usize>,
}

impl MockMap {
    pub fn all_fluid() -> Self {
        Self { solid: Vec::new() }
    }

    pub fn with_solid(solid: Vec<usize>) -> Self {
        Self { solid }
    }
}

impl FluidMap for MockMap {
    fn status(&self, site: usize) -> SiteStatus {
        if self.solid.contains(&site) {
            SiteStatus::Solid
        } else {
            SiteStatus::Fluid
        }
    }
}

/// A scalar field with a single unit spike at the centre of the
/// interior, halos refreshed. The sharpest initial condition a
/// diffusion scenario can start from.
pub fn spike_field(lattice: Lattice) -> Field {
    let [nx, ny, nz] = lattice.nlocal();
    let mut phi = Field::new(lattice, 1);
    phi.set_scalar(lattice.index(nx / 2 + 1, ny / 2 + 1, nz / 2 + 1), 1.0);
    PeriodicHalo
        .refresh(&mut phi)
        .expect("periodic halo refresh cannot fail");
    phi
}

/// A scalar field filled from a deterministic hash of the site index,
/// halos refreshed. Values lie in `[0, 1)`.
pub fn hashed_field(lattice: Lattice, salt: u64) -> Field {
    let mut phi = Field::new(lattice, 1);
    let [nx, ny, nz] = lattice.nlocal();
    for ic in 1..=nx {
        for jc in 1..=ny {
            for kc in 1..=nz {
                let site = lattice.index(ic, jc, kc);
                let mixed = (site as u64)
                    .wrapping_add(salt)
                    .wrapping_mul(0x9E37_79B9_7F4A_7C15);
                phi.set_scalar(site, (mixed >> 11) as f64 / (1u64 << 53) as f64);
            }
        }
    }
    PeriodicHalo
        .refresh(&mut phi)
        .expect("periodic halo refresh cannot fail");
    phi
}

/// A three-component velocity field with uniform value `u`.
pub fn uniform_velocity(lattice: Lattice, u: [f64; 3]) -> Field {
    let mut vel = Field::new(lattice, 3);
    for site in 0..vel.nsites() {
        vel.set(site, 0, u[0]);
        vel.set(site, 1, u[1]);
        vel.set(site, 2, u[2]);
    }
    vel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_potential_defaults_and_overrides() {
        let mut mu = MockPotential::new(1.0);
        mu.set(3, 2.5);
        assert_eq!(mu.mu(0), 1.0);
        assert_eq!(mu.mu(3), 2.5);
    }

    #[test]
    fn spike_has_unit_mass() {
        let lat = Lattice::new([8, 8, 8], 2).unwrap();
        let phi = spike_field(lat);
        assert_eq!(phi.interior_sum(0), 1.0);
    }

    #[test]
    fn hashed_field_is_deterministic() {
        let lat = Lattice::new([4, 4, 4], 2).unwrap();
        let a = hashed_field(lat, 9);
        let b = hashed_field(lat, 9);
        assert_eq!(a.data(), b.data());
        let c = hashed_field(lat, 10);
        assert_ne!(a.data(), c.data());
    }
}
