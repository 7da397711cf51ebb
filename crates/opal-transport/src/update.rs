//! Forward Euler conservative update and its executors.
//!
//! The update subtracts the flux divergence at every interior site:
//! east minus west, north minus the southern neighbour's north, up
//! minus the lower neighbour's up. Every face value appears in exactly
//! two site updates with opposite signs, so the interior sum is exact
//! to rounding whatever the fluxes hold.
//!
//! Site updates are order-independent and each reads only its own
//! site's field value, so the parallel executor may split the interior
//! into x slabs and update them from worker threads.

use crate::flux::FluxSet;
use opal_core::TransportError;
use opal_lattice::Field;

/// How the per-site update loop is executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateExecutor {
    /// One pass over the interior on the calling thread.
    Sequential,
    /// Disjoint x slabs updated from scoped worker threads.
    Parallel {
        /// Worker thread count; capped at the x extent.
        threads: usize,
    },
}

impl UpdateExecutor {
    /// Run `kernel` over the interior, handing it a mutable window of
    /// the field data, the inclusive x column range it owns, and the
    /// flat element offset of the window within the full array.
    ///
    /// The kernel must only write sites whose x coordinate lies in its
    /// range; the windows of distinct slabs are disjoint by
    /// construction.
    pub(crate) fn run<K>(&self, field: &mut Field, kernel: &K)
    where
        K: Fn(&mut [f64], i32, i32, usize) + Sync,
    {
        let lattice = *field.lattice();
        let nx = lattice.nlocal()[0];
        let nf = field.nf();
        let [xs, _, _] = lattice.strides();
        let h = lattice.nhalo();

        match *self {
            UpdateExecutor::Sequential => kernel(field.data_mut(), 1, nx, 0),
            UpdateExecutor::Parallel { threads } => {
                let nchunk = threads.clamp(1, nx as usize);
                let per = nx as usize / nchunk;
                let extra = nx as usize % nchunk;

                std::thread::scope(|scope| {
                    let mut rest = field.data_mut();
                    let mut consumed = 0usize;
                    let mut xlo = 1i32;
                    for c in 0..nchunk {
                        let len = per + usize::from(c < extra);
                        let xhi = xlo + len as i32 - 1;
                        // Columns 1..=xhi end at padded column h + xhi.
                        let end = if c + 1 == nchunk {
                            consumed + rest.len()
                        } else {
                            (h + xhi) as usize * xs * nf
                        };
                        let (slab, tail) = rest.split_at_mut(end - consumed);
                        rest = tail;
                        let base = consumed;
                        consumed = end;
                        scope.spawn(move || kernel(slab, xlo, xhi, base));
                        xlo = xhi + 1;
                    }
                });
            }
        }
    }
}

/// Subtract the flux divergence from every interior site of `field`.
///
/// Quasi-2-D systems (a single z layer) suppress the up/down
/// contribution entirely; whatever the z fluxes hold, they cannot enter
/// the update.
pub fn forward_step(
    field: &mut Field,
    flux: &FluxSet,
    executor: UpdateExecutor,
) -> Result<(), TransportError> {
    let lattice = *field.lattice();
    let nf = field.nf();
    if flux.nf() != nf {
        return Err(TransportError::ComponentMismatch {
            expected: nf,
            got: flux.nf(),
        });
    }
    if flux.nsites() != field.nsites() {
        return Err(TransportError::SiteCountMismatch {
            field: field.nsites(),
            flux: flux.nsites(),
        });
    }

    let [_, ny, nz] = lattice.nlocal();
    let [_, ys, _] = lattice.strides();
    let wz = if lattice.is_quasi_2d() { 0.0 } else { 1.0 };
    let (fe, fw, fy, fz) = (flux.fe(), flux.fw(), flux.fy(), flux.fz());

    executor.run(field, &|data: &mut [f64], xlo: i32, xhi: i32, base: usize| {
        for ic in xlo..=xhi {
            for jc in 1..=ny {
                for kc in 1..=nz {
                    let index = lattice.index(ic, jc, kc);
                    let south = index - ys;
                    let below = index - 1;
                    for n in 0..nf {
                        let div = fe[index * nf + n] - fw[index * nf + n]
                            + fy[index * nf + n]
                            - fy[south * nf + n]
                            + wz * (fz[index * nf + n] - fz[below * nf + n]);
                        data[index * nf + n - base] -= div;
                    }
                }
            }
        }
    });
    Ok(())
}
