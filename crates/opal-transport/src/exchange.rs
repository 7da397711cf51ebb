//! Sliding-plane flux reconciliation across a decomposed y axis.
//!
//! When the y extent is split over several ranks, the rows a displaced
//! interpolation needs may live on one or two other ranks. Each rank
//! packs the plane-adjacent flux column into a strip buffer, splits it
//! at the displaced start row, and exchanges head and tail strips with
//! its two peers per direction. Four transfers are in flight at once,
//! tag-disambiguated, since the "looking up" and "looking down"
//! corrections proceed concurrently; every send completes before any
//! receive blocks, so a rank sending to itself cannot deadlock.

use crate::flux::FluxSet;
use crossbeam_channel::{unbounded, Receiver, Sender};
use indexmap::IndexMap;
use opal_core::{CommError, TransportError};
use opal_lattice::{Decomposition, ShearPlanes};

/// Tag distinguishing the four concurrent strip transfers.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum StripTag {
    /// Head of the west-flux strip (looking up).
    WestHead,
    /// Tail of the west-flux strip (looking up).
    WestTail,
    /// Head of the east-flux strip (looking down).
    EastHead,
    /// Tail of the east-flux strip (looking down).
    EastTail,
}

const TAGS: [StripTag; 4] = [
    StripTag::WestHead,
    StripTag::WestTail,
    StripTag::EastHead,
    StripTag::EastTail,
];

/// Strip transport between the ranks of a y decomposition.
///
/// Sends must be non-blocking and receives must preserve per-peer,
/// per-tag order; the reconciler posts all its sends for a plane before
/// blocking on the first receive.
pub trait PlaneComm: Send + Sync {
    /// This rank's position in the decomposition.
    fn rank(&self) -> usize;

    /// Hand `strip` to rank `to` without blocking.
    fn send(&self, to: usize, tag: StripTag, strip: Vec<f64>) -> Result<(), CommError>;

    /// Block until the next strip with `tag` from rank `from` arrives.
    fn recv(&self, from: usize, tag: StripTag) -> Result<Vec<f64>, CommError>;
}

/// Channel-backed strip transport for ranks running as threads of one
/// process.
///
/// One unbounded channel per ordered rank pair and tag; the self pair
/// is included, so a one- or two-rank decomposition where a rank is its
/// own peer needs no special casing.
pub struct ChannelComm {
    rank: usize,
    senders: IndexMap<(usize, StripTag), Sender<Vec<f64>>>,
    receivers: IndexMap<(usize, StripTag), Receiver<Vec<f64>>>,
}

impl ChannelComm {
    /// Build a fully connected set of `cart_size` transports, one per
    /// rank, ready to move to the rank threads.
    pub fn fully_connected(cart_size: usize) -> Vec<ChannelComm> {
        let mut comms: Vec<ChannelComm> = (0..cart_size)
            .map(|rank| ChannelComm {
                rank,
                senders: IndexMap::new(),
                receivers: IndexMap::new(),
            })
            .collect();
        for from in 0..cart_size {
            for to in 0..cart_size {
                for tag in TAGS {
                    let (tx, rx) = unbounded();
                    comms[from].senders.insert((to, tag), tx);
                    comms[to].receivers.insert((from, tag), rx);
                }
            }
        }
        comms
    }
}

impl PlaneComm for ChannelComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn send(&self, to: usize, tag: StripTag, strip: Vec<f64>) -> Result<(), CommError> {
        let tx = self
            .senders
            .get(&(to, tag))
            .ok_or(CommError::UnknownPeer { peer: to })?;
        tx.send(strip)
            .map_err(|_| CommError::Disconnected { peer: to })
    }

    fn recv(&self, from: usize, tag: StripTag) -> Result<Vec<f64>, CommError> {
        let rx = self
            .receivers
            .get(&(from, tag))
            .ok_or(CommError::UnknownPeer { peer: from })?;
        rx.recv().map_err(|_| CommError::Disconnected { peer: from })
    }
}

/// Reconcile east/west fluxes across every sliding plane when the y
/// axis is decomposed over several ranks.
///
/// Strip layout: the plane-adjacent flux column is packed row-major
/// over local rows `1..=ny`, each row covering the full z extent
/// including halo, `nf` values per site. The received strips
/// concatenate to `ny + 1` rows starting at the displaced global row,
/// which the averaging pass walks with the interpolation weights.
pub fn reconcile_distributed(
    flux: &mut FluxSet,
    shear: &ShearPlanes,
    decomp: &Decomposition,
    comm: &dyn PlaneComm,
) -> Result<(), TransportError> {
    let lattice = *flux.lattice();
    let [_, ny, nz] = lattice.nlocal();
    let h = lattice.nhalo();
    let nf = flux.nf();
    let nzh = (nz + 2 * h) as usize;
    let ntotal = decomp.ntotal_y();
    let jc0 = decomp.noffset_y() + 1;

    // Displaced global start row for the first local row.
    let start_row = |jdy: i32| 1 + (jc0 - jdy - 2 + 2 * ntotal).rem_euclid(ntotal);

    for ip in 0..shear.nplane_local() {
        let ic = shear.plane_location(ip);

        let (jdy_up, fr_up) = shear.split_displacement(shear.plane_dy());
        let (jdy_dn, fr_dn) = shear.split_displacement(-shear.plane_dy());

        let j1_up = start_row(jdy_up);
        let j1_dn = start_row(jdy_dn);
        let peers_up = decomp.row_start_peers(j1_up);
        let peers_dn = decomp.row_start_peers(j1_dn);

        // Every rank's start row sits at the same local offset within
        // its owner, so the split sizes are uniform across ranks and
        // sender and receiver agree on them without negotiation.
        let split = |j1: i32| {
            let j2 = 1 + (j1 - 1) % ny;
            let n1 = (nf as i32 * (ny - j2 + 1)) as usize * nzh;
            let n2 = (nf as i32 * j2) as usize * nzh;
            (j2, n1, n2)
        };
        let (j2_up, n1_up, n2_up) = split(j1_up);
        let (j2_dn, n1_dn, n2_dn) = split(j1_dn);

        let pack = |column: i32, faces: &[f64]| {
            let mut sbuf = vec![0.0; nf * ny as usize * nzh];
            for jc in 1..=ny {
                for kc in (1 - h)..=(nz + h) {
                    let site = lattice.index(column, jc, kc);
                    let b = nf * (((jc - 1) as usize) * nzh + (kc + h - 1) as usize);
                    sbuf[b..b + nf].copy_from_slice(&faces[site * nf..site * nf + nf]);
                }
            }
            sbuf
        };
        let sbufw = pack(ic + 1, flux.fw());
        let sbufe = pack(ic, flux.fe());

        // Post all four sends before blocking on any receive.
        let head_at = nf * ((j2_up - 1) as usize) * nzh;
        comm.send(
            peers_up.send[0],
            StripTag::WestHead,
            sbufw[head_at..head_at + n1_up].to_vec(),
        )?;
        comm.send(peers_up.send[1], StripTag::WestTail, sbufw[..n2_up].to_vec())?;

        let head_at = nf * ((j2_dn - 1) as usize) * nzh;
        comm.send(
            peers_dn.send[0],
            StripTag::EastHead,
            sbufe[head_at..head_at + n1_dn].to_vec(),
        )?;
        comm.send(peers_dn.send[1], StripTag::EastTail, sbufe[..n2_dn].to_vec())?;

        let recv_pair = |peers: [usize; 2],
                         tags: [StripTag; 2],
                         n1: usize,
                         n2: usize|
         -> Result<Vec<f64>, CommError> {
            let mut head = comm.recv(peers[0], tags[0])?;
            if head.len() != n1 {
                return Err(CommError::PayloadSize {
                    expected: n1,
                    got: head.len(),
                });
            }
            let tail = comm.recv(peers[1], tags[1])?;
            if tail.len() != n2 {
                return Err(CommError::PayloadSize {
                    expected: n2,
                    got: tail.len(),
                });
            }
            head.extend_from_slice(&tail);
            Ok(head)
        };
        let rbufw = recv_pair(
            peers_up.recv,
            [StripTag::WestHead, StripTag::WestTail],
            n1_up,
            n2_up,
        )?;
        let rbufe = recv_pair(
            peers_dn.recv,
            [StripTag::EastHead, StripTag::EastTail],
            n1_dn,
            n2_dn,
        )?;

        // Average own fluxes with the interpolated remote rows. Row
        // jc - 1 of the received run is the displaced image of local
        // row jc; row jc is one further along y.
        for jc in 1..=ny {
            let row0 = nf * ((jc - 1) as usize) * nzh;
            let row1 = nf * (jc as usize) * nzh;
            for kc in 1..=nz {
                let z = nf * (kc + h - 1) as usize;
                let ie = lattice.index(ic, jc, kc) * nf;
                let iw = lattice.index(ic + 1, jc, kc) * nf;
                for n in 0..nf {
                    let e = flux.fe()[ie + n];
                    flux.fe_mut()[ie + n] = 0.5
                        * (e + fr_up * rbufw[row0 + z + n]
                            + (1.0 - fr_up) * rbufw[row1 + z + n]);
                    let w = flux.fw()[iw + n];
                    flux.fw_mut()[iw + n] = 0.5
                        * (w + fr_dn * rbufe[row0 + z + n]
                            + (1.0 - fr_dn) * rbufe[row1 + z + n]);
                }
            }
        }
    }
    Ok(())
}
