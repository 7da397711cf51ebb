//! Sliding-plane flux reconciliation, single-rank path.
//!
//! Across a sliding plane the east flux computed at column `x` and the
//! west flux computed at `x + 1` disagree: each side evaluated its
//! stencil against a different periodic image of the other. The fix
//! interpolates the opposite side's flux at the displaced y position
//! and replaces both with the average, restoring a unique face value so
//! the divergence update still telescopes to zero.
//!
//! This path runs when the whole y extent lives on one rank and every
//! displaced row is locally addressable. The distributed counterpart
//! lives in [`crate::exchange`].

use crate::flux::FluxSet;
use opal_core::TransportError;
use opal_lattice::ShearPlanes;

/// Reconcile east/west fluxes across every local sliding plane using
/// only local rows.
pub fn reconcile_local(flux: &mut FluxSet, shear: &ShearPlanes) -> Result<(), TransportError> {
    let lattice = *flux.lattice();
    let [_, ny, nz] = lattice.nlocal();
    let nf = flux.nf();

    let nbuf = (nf as i32 * ny * nz) as usize;
    let mut buffere = vec![0.0; nbuf];
    let mut bufferw = vec![0.0; nbuf];

    for ip in 0..shear.nplane_local() {
        let ic = shear.plane_location(ip);

        // Looking up: interpolate the west fluxes of column ic + 1 at
        // the +dy displaced rows.
        let (jdy, fr) = shear.split_displacement(shear.plane_dy());
        for jc in 1..=ny {
            let j1 = 1 + (jc - jdy - 2 + 2 * ny) % ny;
            let j2 = 1 + j1 % ny;
            for kc in 1..=nz {
                let b = (nf as i32 * (nz * (jc - 1) + (kc - 1))) as usize;
                let i1 = lattice.index(ic + 1, j1, kc);
                let i2 = lattice.index(ic + 1, j2, kc);
                for n in 0..nf {
                    bufferw[b + n] =
                        flux.fw()[i1 * nf + n] * fr + flux.fw()[i2 * nf + n] * (1.0 - fr);
                }
            }
        }

        // Looking down: interpolate the east fluxes of column ic at the
        // -dy displaced rows.
        let (jdy, fr) = shear.split_displacement(-shear.plane_dy());
        for jc in 1..=ny {
            let j1 = 1 + (jc - jdy - 2 + 2 * ny) % ny;
            let j2 = 1 + j1 % ny;
            for kc in 1..=nz {
                let b = (nf as i32 * (nz * (jc - 1) + (kc - 1))) as usize;
                let i1 = lattice.index(ic, j1, kc);
                let i2 = lattice.index(ic, j2, kc);
                for n in 0..nf {
                    buffere[b + n] =
                        flux.fe()[i1 * nf + n] * fr + flux.fe()[i2 * nf + n] * (1.0 - fr);
                }
            }
        }

        // Replace both sides with the average of own and interpolated.
        for jc in 1..=ny {
            for kc in 1..=nz {
                let b = (nf as i32 * (nz * (jc - 1) + (kc - 1))) as usize;
                let ie = lattice.index(ic, jc, kc);
                let iw = lattice.index(ic + 1, jc, kc);
                for n in 0..nf {
                    let e = flux.fe()[ie * nf + n];
                    flux.fe_mut()[ie * nf + n] = 0.5 * (e + bufferw[b + n]);
                    let w = flux.fw()[iw * nf + n];
                    flux.fw_mut()[iw * nf + n] = 0.5 * (w + buffere[b + n]);
                }
            }
        }
    }
    Ok(())
}
