//! Domain decomposition along the y axis.
//!
//! The sliding-plane flux correction is the only stage that communicates
//! between sub-domains, and it only ever moves data along y. The
//! decomposition therefore tracks a 1-D grid of ranks over the global
//! y extent and answers the one question the distributed reconciler
//! asks: given the global row a displaced interpolation starts at, which
//! two peers hold the rows, and which two peers want ours.

use crate::error::LatticeError;

/// The send/receive rank pairs for one displaced row start.
///
/// `recv[0]` owns the head of the needed row run, `recv[1]` the tail
/// after the wrap at the rank boundary. `send` is the mirror image:
/// the ranks whose row runs begin inside our sub-domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowPeers {
    /// Ranks we send our head/tail row strips to.
    pub send: [usize; 2],
    /// Ranks we receive the head/tail row strips from.
    pub recv: [usize; 2],
}

/// A 1-D decomposition of the global y extent over `cart_size` ranks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decomposition {
    ntotal_y: i32,
    cart_size: usize,
    cart_rank: usize,
}

impl Decomposition {
    /// A single-rank decomposition (everything local).
    pub fn serial(ntotal_y: i32) -> Self {
        Self {
            ntotal_y,
            cart_size: 1,
            cart_rank: 0,
        }
    }

    /// Create the decomposition for `cart_rank` of `cart_size` ranks
    /// over a global y extent of `ntotal_y` rows.
    ///
    /// Returns `Err` unless the rows divide evenly and the rank is in
    /// range.
    pub fn new(ntotal_y: i32, cart_size: usize, cart_rank: usize) -> Result<Self, LatticeError> {
        if ntotal_y < 1 {
            return Err(LatticeError::EmptyExtent { axis: "y" });
        }
        if cart_size == 0 || ntotal_y as usize % cart_size != 0 {
            return Err(LatticeError::UnevenDecomposition {
                ntotal_y,
                ranks: cart_size,
            });
        }
        if cart_rank >= cart_size {
            return Err(LatticeError::RankOutOfRange {
                rank: cart_rank,
                ranks: cart_size,
            });
        }
        Ok(Self {
            ntotal_y,
            cart_size,
            cart_rank,
        })
    }

    /// Global y extent in rows.
    pub fn ntotal_y(&self) -> i32 {
        self.ntotal_y
    }

    /// Rows per rank.
    pub fn nlocal_y(&self) -> i32 {
        self.ntotal_y / self.cart_size as i32
    }

    /// Global row offset of this rank (rows below ours).
    pub fn noffset_y(&self) -> i32 {
        self.cart_rank as i32 * self.nlocal_y()
    }

    /// Number of ranks along y.
    pub fn cart_size(&self) -> usize {
        self.cart_size
    }

    /// This rank's position along y.
    pub fn cart_rank(&self) -> usize {
        self.cart_rank
    }

    /// Whether the y axis lives on a single rank.
    pub fn is_serial_y(&self) -> bool {
        self.cart_size == 1
    }

    /// Rank owning global row `j` (1-based).
    pub fn row_owner(&self, j: i32) -> usize {
        debug_assert!(j >= 1 && j <= self.ntotal_y);
        ((j - 1) / self.nlocal_y()) as usize
    }

    /// Send/receive peers for an interpolation run starting at global
    /// row `j1`.
    ///
    /// Because every rank's displaced start row sits at the same offset
    /// within its owner (offsets are multiples of `nlocal_y`), the
    /// owner map is a uniform rank shift; the send peers follow from
    /// inverting that shift.
    pub fn row_start_peers(&self, j1: i32) -> RowPeers {
        let p = self.cart_size;
        let recv0 = self.row_owner(j1);
        let recv1 = (recv0 + 1) % p;
        // owner(r) = (r + q) mod p for every rank r
        let q = (recv0 + p - self.cart_rank) % p;
        let send0 = (self.cart_rank + p - q) % p;
        let send1 = (send0 + p - 1) % p;
        RowPeers {
            send: [send0, send1],
            recv: [recv0, recv1],
        }
    }
}
