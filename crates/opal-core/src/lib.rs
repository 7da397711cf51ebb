//! Core types and collaborator traits for the Opal transport engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the physics constants context, the symmetric traceless tensor type,
//! error types, and the collaborator traits consumed by the flux and
//! update stages (potentials, molecular fields, noise, solid masks).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod physics;
pub mod tensor;
pub mod traits;

pub use error::{CommError, TransportError};
pub use physics::PhysicsConstants;
pub use tensor::{Sym3, NQAB, QXX, QXY, QXZ, QYY, QYZ};
pub use traits::{ChemicalPotential, FluidMap, MolecularField, NoiseSource, SiteStatus};
