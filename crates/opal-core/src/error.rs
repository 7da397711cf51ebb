//! Error types for the Opal transport engine.
//!
//! All detected problems in this engine are fatal to the step that raised
//! them: a precondition violation means the simulation was misconfigured,
//! and a communication failure has no redundant path to recover from.
//! There is no user-facing recoverable-error surface.

use std::error::Error;
use std::fmt;

/// Errors from a transport step (flux accumulation, reconciliation,
/// forward update).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// A stencil was asked to run with a halo narrower than it reads.
    HaloTooNarrow {
        /// Halo width the lattice was built with.
        have: i32,
        /// Minimum width the requested stencil needs.
        need: i32,
    },
    /// Stochastic fluxes were requested on a rank with local sliding
    /// planes. Noise and the plane-crossing flux correction are mutually
    /// exclusive; combining them would break the fluctuation-dissipation
    /// balance.
    NoiseWithLocalPlanes {
        /// Number of planes local to the offending rank.
        nplane_local: usize,
    },
    /// A field carried an unexpected number of components for the driver
    /// it was handed to.
    ComponentMismatch {
        /// Components the driver requires.
        expected: usize,
        /// Components the field carries.
        got: usize,
    },
    /// Field and flux containers were built over different index spaces.
    SiteCountMismatch {
        /// Sites in the field.
        field: usize,
        /// Sites in the flux set.
        flux: usize,
    },
    /// A strip exchange with a peer rank failed.
    Comm(CommError),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HaloTooNarrow { have, need } => {
                write!(f, "halo width {have} too narrow for stencil (need >= {need})")
            }
            Self::NoiseWithLocalPlanes { nplane_local } => {
                write!(
                    f,
                    "stochastic fluxes requested with {nplane_local} local sliding plane(s)"
                )
            }
            Self::ComponentMismatch { expected, got } => {
                write!(f, "field has {got} components, driver requires {expected}")
            }
            Self::SiteCountMismatch { field, flux } => {
                write!(f, "field has {field} sites, flux set has {flux}")
            }
            Self::Comm(e) => write!(f, "strip exchange failed: {e}"),
        }
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Comm(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CommError> for TransportError {
    fn from(e: CommError) -> Self {
        Self::Comm(e)
    }
}

/// Errors from the inter-rank strip exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommError {
    /// The peer rank hung up (its thread exited or the link was dropped).
    Disconnected {
        /// Rank on the other end of the failed link.
        peer: usize,
    },
    /// No link is registered for the requested peer rank.
    UnknownPeer {
        /// The rank that was asked for.
        peer: usize,
    },
    /// A received strip had a different length than the row arithmetic
    /// said it should.
    PayloadSize {
        /// Values expected for the contiguous row run.
        expected: usize,
        /// Values actually received.
        got: usize,
    },
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected { peer } => write!(f, "peer rank {peer} disconnected"),
            Self::UnknownPeer { peer } => write!(f, "no link registered for peer rank {peer}"),
            Self::PayloadSize { expected, got } => {
                write!(f, "strip payload has {got} values, expected {expected}")
            }
        }
    }
}

impl Error for CommError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = TransportError::HaloTooNarrow { have: 1, need: 3 };
        assert_eq!(e.to_string(), "halo width 1 too narrow for stencil (need >= 3)");

        let e = TransportError::NoiseWithLocalPlanes { nplane_local: 2 };
        assert!(e.to_string().contains("2 local sliding plane"));

        let e = CommError::PayloadSize {
            expected: 10,
            got: 7,
        };
        assert!(e.to_string().contains("7"));
        assert!(e.to_string().contains("10"));
    }

    #[test]
    fn comm_error_wraps_with_source() {
        let e: TransportError = CommError::Disconnected { peer: 3 }.into();
        assert!(std::error::Error::source(&e).is_some());
        assert!(e.to_string().contains("peer rank 3"));
    }
}
