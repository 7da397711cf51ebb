//! Lattice geometry and field storage for the Opal transport engine.
//!
//! Provides the halo-padded 3-D index space ([`Lattice`]), the
//! y-axis domain decomposition ([`Decomposition`]), sliding-plane
//! geometry ([`ShearPlanes`]), and the per-site field container
//! ([`Field`]) with a periodic halo refresher for single-rank domains.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod decomp;
pub mod error;
pub mod field;
pub mod lattice;
pub mod shear;

pub use decomp::{Decomposition, RowPeers};
pub use error::LatticeError;
pub use field::{Field, HaloExchange, PeriodicHalo};
pub use lattice::Lattice;
pub use shear::ShearPlanes;
