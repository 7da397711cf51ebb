//! No-normal-flux boundary condition at solid sites.
//!
//! After accumulation, every face with a solid site on either side has
//! its flux nulled, so nothing is transported into or out of colloids
//! and walls. Applied as a multiplicative mask over the already-
//! accumulated fluxes; the update itself still runs over every site.

use crate::flux::FluxSet;
use opal_core::FluidMap;

/// Null the normal flux at every face adjacent to a solid site.
pub fn no_normal_flux(flux: &mut FluxSet, map: &dyn FluidMap) {
    let lattice = *flux.lattice();
    let [nx, ny, nz] = lattice.nlocal();
    let nf = flux.nf();
    let [fe, fw, fy, fz] = flux.faces_mut();

    let mask = |fluid: bool| if fluid { 1.0 } else { 0.0 };

    for ic in 1..=nx {
        for jc in 0..=ny {
            for kc in 0..=nz {
                let index0 = lattice.index(ic, jc, kc);
                let mask0 = mask(map.is_fluid(index0));
                let maskw = mask(map.is_fluid(lattice.index(ic - 1, jc, kc)));
                let maske = mask(map.is_fluid(lattice.index(ic + 1, jc, kc)));
                let masky = mask(map.is_fluid(lattice.index(ic, jc + 1, kc)));
                let maskz = mask(map.is_fluid(lattice.index(ic, jc, kc + 1)));

                for n in 0..nf {
                    fw[index0 * nf + n] *= mask0 * maskw;
                    fe[index0 * nf + n] *= mask0 * maske;
                    fy[index0 * nf + n] *= mask0 * masky;
                    fz[index0 * nf + n] *= mask0 * maskz;
                }
            }
        }
    }
}
