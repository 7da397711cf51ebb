//! Opal: a conservative flux transport engine for order-parameter
//! fields over a halo-padded lattice.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Opal sub-crates. For most users, adding `opal` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use opal::prelude::*;
//!
//! // mu = phi turns conserved transport into plain diffusion.
//! struct Identity<'a>(&'a Field);
//! impl ChemicalPotential for Identity<'_> {
//!     fn mu(&self, site: usize) -> f64 { self.0.scalar(site) }
//! }
//!
//! let lattice = Lattice::new([8, 8, 8], 2).unwrap();
//! let mut driver = CahnHilliard::builder().lattice(lattice).build().unwrap();
//!
//! let mut phi = Field::new(lattice, 1);
//! phi.set_scalar(lattice.index(4, 4, 4), 1.0);
//! PeriodicHalo.refresh(&mut phi).unwrap();
//!
//! let snapshot = phi.clone();
//! let mu = Identity(&snapshot);
//! let phys = PhysicsConstants::scalar(0.05);
//! let shear = ShearPlanes::none(8.0);
//! driver.step(&mut phi, &mu, &phys, &shear, None, None, None).unwrap();
//!
//! // The spike has spread; the total has not changed.
//! assert!(phi.scalar(lattice.index(4, 4, 4)) < 1.0);
//! assert!((phi.interior_sum(0) - 1.0).abs() < 1e-12);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `opal-core` | Physics constants, tensors, errors, collaborator traits |
//! | [`lattice`] | `opal-lattice` | Index space, decomposition, shear geometry, fields |
//! | [`transport`] | `opal-transport` | Flux stages, reconciliation, drivers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and errors (`opal-core`).
///
/// Contains [`types::PhysicsConstants`], the symmetric traceless
/// tensor [`types::Sym3`], and the collaborator traits
/// ([`types::ChemicalPotential`], [`types::MolecularField`],
/// [`types::NoiseSource`], [`types::FluidMap`]).
pub use opal_core as types;

/// Lattice geometry and field storage (`opal-lattice`).
///
/// Provides [`lattice::Lattice`], [`lattice::Decomposition`],
/// [`lattice::ShearPlanes`], and the per-site [`lattice::Field`]
/// container with its halo-refresh seam.
pub use opal_lattice as lattice;

/// Flux transport stages and drivers (`opal-transport`).
///
/// The scalar driver [`transport::CahnHilliard`] and the tensor driver
/// [`transport::BerisEdwards`], plus the individual stages for callers
/// that compose their own step.
pub use opal_transport as transport;

/// Commonly used types, re-exported for convenient glob import.
pub mod prelude {
    pub use opal_core::{
        ChemicalPotential, FluidMap, MolecularField, NoiseSource, PhysicsConstants, SiteStatus,
        Sym3, TransportError, NQAB,
    };
    pub use opal_lattice::{
        Decomposition, Field, HaloExchange, Lattice, PeriodicHalo, ShearPlanes,
    };
    pub use opal_transport::{
        BerisEdwards, CahnHilliard, CentredAdvection, ChannelComm, FluxSet, LatticeNoise,
        UpdateExecutor,
    };
}
