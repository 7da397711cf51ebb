//! Advective flux accumulation.
//!
//! The advective face flux is `u_face * f_face` for an interpolated face
//! velocity and face field value. The scheme is a builder-selected
//! collaborator so higher-order upwind variants can slot in without any
//! driver change; the default is the second-order centred scheme.

use crate::flux::FluxSet;
use opal_core::TransportError;
use opal_lattice::Field;

/// Number of velocity components per site.
pub const NVEL: usize = 3;

/// One advective-flux discretisation.
pub trait AdvectionScheme: Send + Sync {
    /// Accumulate the advective face fluxes of `field` under
    /// `velocity` into `flux`.
    ///
    /// `velocity` carries three components per site and must have
    /// current halo (and, under shear, plane-interpolated) values; the
    /// caller owns that refresh.
    fn accumulate(
        &self,
        flux: &mut FluxSet,
        velocity: &Field,
        field: &Field,
    ) -> Result<(), TransportError>;
}

/// Second-order centred advection.
///
/// Face velocity and face field value are both arithmetic means of the
/// two adjacent sites.
#[derive(Clone, Copy, Debug, Default)]
pub struct CentredAdvection;

impl AdvectionScheme for CentredAdvection {
    fn accumulate(
        &self,
        flux: &mut FluxSet,
        velocity: &Field,
        field: &Field,
    ) -> Result<(), TransportError> {
        let lattice = *flux.lattice();
        let nf = flux.nf();
        if velocity.nf() != NVEL {
            return Err(TransportError::ComponentMismatch {
                expected: NVEL,
                got: velocity.nf(),
            });
        }
        if field.nf() != nf {
            return Err(TransportError::ComponentMismatch {
                expected: nf,
                got: field.nf(),
            });
        }
        if field.nsites() != flux.nsites() {
            return Err(TransportError::SiteCountMismatch {
                field: field.nsites(),
                flux: flux.nsites(),
            });
        }

        let [nx, ny, nz] = lattice.nlocal();
        let [fe, fw, fy, fz] = flux.faces_mut();

        for ic in 1..=nx {
            for jc in 0..=ny {
                for kc in 0..=nz {
                    let index0 = lattice.index(ic, jc, kc);
                    let u0 = [
                        velocity.get(index0, 0),
                        velocity.get(index0, 1),
                        velocity.get(index0, 2),
                    ];

                    let index1 = lattice.index(ic - 1, jc, kc);
                    let u = 0.5 * (u0[0] + velocity.get(index1, 0));
                    for n in 0..nf {
                        fw[index0 * nf + n] +=
                            u * 0.5 * (field.get(index1, n) + field.get(index0, n));
                    }

                    let index1 = lattice.index(ic + 1, jc, kc);
                    let u = 0.5 * (u0[0] + velocity.get(index1, 0));
                    for n in 0..nf {
                        fe[index0 * nf + n] +=
                            u * 0.5 * (field.get(index1, n) + field.get(index0, n));
                    }

                    let index1 = lattice.index(ic, jc + 1, kc);
                    let u = 0.5 * (u0[1] + velocity.get(index1, 1));
                    for n in 0..nf {
                        fy[index0 * nf + n] +=
                            u * 0.5 * (field.get(index1, n) + field.get(index0, n));
                    }

                    let index1 = lattice.index(ic, jc, kc + 1);
                    let u = 0.5 * (u0[2] + velocity.get(index1, 2));
                    for n in 0..nf {
                        fz[index0 * nf + n] +=
                            u * 0.5 * (field.get(index1, n) + field.get(index0, n));
                    }
                }
            }
        }
        Ok(())
    }
}
