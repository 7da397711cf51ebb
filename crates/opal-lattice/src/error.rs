//! Error type for lattice and decomposition construction.

use std::error::Error;
use std::fmt;

/// Errors from building lattice geometry.
///
/// These are configuration-time errors; nothing here can occur during a
/// transport step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LatticeError {
    /// An axis was given a non-positive extent.
    EmptyExtent {
        /// Axis name ("x", "y", or "z").
        axis: &'static str,
    },
    /// The halo width must be at least one layer.
    HaloTooSmall,
    /// The global y extent does not divide evenly over the rank count.
    UnevenDecomposition {
        /// Global y extent.
        ntotal_y: i32,
        /// Number of ranks along y.
        ranks: usize,
    },
    /// A rank index was outside the decomposition.
    RankOutOfRange {
        /// The offending rank.
        rank: usize,
        /// Number of ranks along y.
        ranks: usize,
    },
    /// A sliding-plane x location falls outside the local interior.
    PlaneOutOfRange {
        /// The offending x location.
        location: i32,
        /// Local x extent.
        nx: i32,
    },
}

impl fmt::Display for LatticeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyExtent { axis } => write!(f, "{axis} extent must be >= 1"),
            Self::HaloTooSmall => write!(f, "halo width must be >= 1"),
            Self::UnevenDecomposition { ntotal_y, ranks } => {
                write!(f, "y extent {ntotal_y} does not divide over {ranks} rank(s)")
            }
            Self::RankOutOfRange { rank, ranks } => {
                write!(f, "rank {rank} out of range for {ranks} rank(s)")
            }
            Self::PlaneOutOfRange { location, nx } => {
                write!(f, "plane at x = {location} outside local interior 1..={nx}")
            }
        }
    }
}

impl Error for LatticeError {}
