//! Collaborator traits consumed by the flux and update stages.
//!
//! Each trait is a per-site pure query over already-computed data, which
//! keeps every implementation callable from both the sequential and the
//! bulk-parallel site loops (`Send + Sync`, no interior mutation during a
//! step).

use crate::tensor::Sym3;

/// Chemical potential of the scalar order parameter.
///
/// Selected once at configuration time from the active free-energy model
/// and then treated as a fixed function for the whole run. The site index
/// is a flat index into the halo-padded store; implementations must
/// answer for halo sites too, since the wide stencil reads up to two
/// layers beyond the interior.
pub trait ChemicalPotential: Send + Sync {
    /// Chemical potential at `site`.
    fn mu(&self, site: usize) -> f64;
}

/// Molecular field of the tensor order parameter.
///
/// Pure function of already-computed gradient and field data; no side
/// effects, callable per site in any order.
pub trait MolecularField: Send + Sync {
    /// Molecular field H at `site`.
    fn h(&self, site: usize) -> Sym3;
}

/// A source of independent unit-variance random variates, one batch per
/// lattice site.
///
/// Implementations must be deterministic given a fixed seed and step
/// count: the same `(seed, step, site)` always yields the same variates.
/// This is what makes restarted runs and unit tests reproducible.
pub trait NoiseSource: Send + Sync {
    /// Fill `out` with `out.len()` independent unit-variance variates
    /// for `site`.
    fn reap(&self, site: usize, out: &mut [f64]);
}

/// Fluid/solid status of a lattice site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiteStatus {
    /// An ordinary fluid site.
    Fluid,
    /// A solid site (colloid interior or wall).
    Solid,
}

/// Per-site fluid/solid status query.
///
/// Used only to null out diffusive normal flux at solid-adjacent faces;
/// the update itself runs over every site regardless of status.
pub trait FluidMap: Send + Sync {
    /// Status of `site`.
    fn status(&self, site: usize) -> SiteStatus;

    /// Convenience: whether `site` is fluid.
    fn is_fluid(&self, site: usize) -> bool {
        self.status(site) == SiteStatus::Fluid
    }
}
