//! Conservative flux transport for order-parameter fields.
//!
//! One transport step turns a field at time `t` into the field at
//! `t + 1` through four stages over a shared [`FluxSet`]: accumulate
//! advective, diffusive, and optional stochastic contributions into the
//! four face-flux arrays; null normal fluxes at solid boundaries;
//! reconcile the east/west fluxes across sliding planes so both sides
//! of each plane agree on a unique face value; and apply the forward
//! Euler divergence update. The scalar driver is [`CahnHilliard`], the
//! tensor driver [`BerisEdwards`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod accumulate;
pub mod advection;
pub mod beris_edwards;
pub mod boundary;
pub mod cahn_hilliard;
pub mod exchange;
pub mod flux;
pub mod noise;
pub mod reconcile;
pub mod update;

pub use advection::{AdvectionScheme, CentredAdvection};
pub use beris_edwards::{BerisEdwards, BerisEdwardsBuilder};
pub use cahn_hilliard::{CahnHilliard, CahnHilliardBuilder};
pub use exchange::{ChannelComm, PlaneComm, StripTag};
pub use flux::FluxSet;
pub use noise::LatticeNoise;
pub use update::UpdateExecutor;
