//! Diffusive flux accumulation for the scalar order parameter.
//!
//! Both stencils add `-M * grad(mu)` face fluxes on top of whatever the
//! advection stage already wrote. The two-point stencil differences the
//! chemical potential across each face; the wide stencil averages two
//! two-point differences displaced one site to either side of the face,
//! which keeps the stochastic update stable by smoothing the shortest
//! wavelength the noise excites.
//!
//! The loops run over the interior plus one extra layer at the low y
//! and z ends (`jc`, `kc` from 0) so that the south and down faces of
//! the first interior rows exist before the divergence is taken.

use crate::flux::FluxSet;
use opal_core::{ChemicalPotential, TransportError};

/// Accumulate two-point diffusive fluxes `-M * (mu(neighbour) - mu(here))`.
///
/// Requires a halo of at least two layers: the east face at `ic = nx`
/// reads `mu` at `ic = nx + 1`, whose own value may depend on a
/// gradient over `nx + 2`.
pub fn diffusive_two_point(
    flux: &mut FluxSet,
    mu: &dyn ChemicalPotential,
    mobility: f64,
) -> Result<(), TransportError> {
    let lattice = *flux.lattice();
    if lattice.nhalo() < 2 {
        return Err(TransportError::HaloTooNarrow {
            have: lattice.nhalo(),
            need: 2,
        });
    }
    if flux.nf() != 1 {
        return Err(TransportError::ComponentMismatch {
            expected: 1,
            got: flux.nf(),
        });
    }

    let [nx, ny, nz] = lattice.nlocal();
    let [fe, fw, fy, fz] = flux.faces_mut();

    for ic in 1..=nx {
        for jc in 0..=ny {
            for kc in 0..=nz {
                let index0 = lattice.index(ic, jc, kc);
                let mu0 = mu.mu(index0);

                fw[index0] -= mobility * (mu0 - mu.mu(lattice.index(ic - 1, jc, kc)));
                fe[index0] -= mobility * (mu.mu(lattice.index(ic + 1, jc, kc)) - mu0);
                fy[index0] -= mobility * (mu.mu(lattice.index(ic, jc + 1, kc)) - mu0);
                fz[index0] -= mobility * (mu.mu(lattice.index(ic, jc, kc + 1)) - mu0);
            }
        }
    }
    Ok(())
}

/// Accumulate wide-stencil diffusive fluxes.
///
/// Each face flux is `-M/4 * (mu(+2) + mu(+1) - mu(0) - mu(-1))` along
/// the face normal, the average of the two-point difference taken one
/// site to either side. Requires a halo of at least three layers.
pub fn diffusive_wide(
    flux: &mut FluxSet,
    mu: &dyn ChemicalPotential,
    mobility: f64,
) -> Result<(), TransportError> {
    let lattice = *flux.lattice();
    if lattice.nhalo() < 3 {
        return Err(TransportError::HaloTooNarrow {
            have: lattice.nhalo(),
            need: 3,
        });
    }
    if flux.nf() != 1 {
        return Err(TransportError::ComponentMismatch {
            expected: 1,
            got: flux.nf(),
        });
    }

    let [nx, ny, nz] = lattice.nlocal();
    let [xs, ys, _] = lattice.strides();
    let m4 = 0.25 * mobility;
    let [fe, fw, fy, fz] = flux.faces_mut();

    for ic in 1..=nx {
        for jc in 0..=ny {
            for kc in 0..=nz {
                let index0 = lattice.index(ic, jc, kc);
                let mu00 = mu.mu(index0);

                let mum2 = mu.mu(index0 - 2 * xs);
                let mum1 = mu.mu(index0 - xs);
                let mup1 = mu.mu(index0 + xs);
                let mup2 = mu.mu(index0 + 2 * xs);
                fw[index0] -= m4 * (mup1 + mu00 - mum1 - mum2);
                fe[index0] -= m4 * (mup2 + mup1 - mu00 - mum1);

                let mum1 = mu.mu(index0 - ys);
                let mup1 = mu.mu(index0 + ys);
                let mup2 = mu.mu(index0 + 2 * ys);
                fy[index0] -= m4 * (mup2 + mup1 - mu00 - mum1);

                let mum1 = mu.mu(index0 - 1);
                let mup1 = mu.mu(index0 + 1);
                let mup2 = mu.mu(index0 + 2);
                fz[index0] -= m4 * (mup2 + mup1 - mu00 - mum1);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_lattice::Lattice;

    /// mu equal to the flat site index, so gradients are the strides.
    struct IndexMu;

    impl ChemicalPotential for IndexMu {
        fn mu(&self, site: usize) -> f64 {
            site as f64
        }
    }

    struct UniformMu(f64);

    impl ChemicalPotential for UniformMu {
        fn mu(&self, _site: usize) -> f64 {
            self.0
        }
    }

    #[test]
    fn two_point_rejects_narrow_halo() {
        let lat = Lattice::new([4, 4, 4], 1).unwrap();
        let mut flux = FluxSet::new(lat, 1);
        assert_eq!(
            diffusive_two_point(&mut flux, &UniformMu(1.0), 0.1),
            Err(TransportError::HaloTooNarrow { have: 1, need: 2 })
        );
    }

    #[test]
    fn wide_rejects_halo_below_three() {
        let lat = Lattice::new([4, 4, 4], 2).unwrap();
        let mut flux = FluxSet::new(lat, 1);
        assert_eq!(
            diffusive_wide(&mut flux, &UniformMu(1.0), 0.1),
            Err(TransportError::HaloTooNarrow { have: 2, need: 3 })
        );
    }

    #[test]
    fn uniform_mu_gives_zero_flux() {
        let lat = Lattice::new([4, 4, 4], 2).unwrap();
        let mut flux = FluxSet::new(lat, 1);
        diffusive_two_point(&mut flux, &UniformMu(3.0), 0.5).unwrap();
        assert!(flux.fe().iter().all(|&f| f == 0.0));
        assert!(flux.fy().iter().all(|&f| f == 0.0));
    }

    #[test]
    fn two_point_matches_stride_gradient() {
        let lat = Lattice::new([4, 4, 4], 2).unwrap();
        let [xs, ys, _] = lat.strides();
        let mut flux = FluxSet::new(lat, 1);
        diffusive_two_point(&mut flux, &IndexMu, 2.0).unwrap();
        let i = lat.index(2, 2, 2);
        assert!((flux.fe()[i] + 2.0 * xs as f64).abs() < 1e-12);
        assert!((flux.fw()[i] + 2.0 * xs as f64).abs() < 1e-12);
        assert!((flux.fy()[i] + 2.0 * ys as f64).abs() < 1e-12);
        assert!((flux.fz()[i] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn wide_agrees_with_two_point_on_linear_mu() {
        // For a linear potential the four-point average equals the
        // two-point difference, so the stencils coincide.
        let lat = Lattice::new([4, 4, 4], 3).unwrap();
        let mut narrow = FluxSet::new(lat, 1);
        let mut wide = FluxSet::new(lat, 1);
        diffusive_two_point(&mut narrow, &IndexMu, 0.7).unwrap();
        diffusive_wide(&mut wide, &IndexMu, 0.7).unwrap();
        for ic in 1..=4 {
            for jc in 1..=4 {
                for kc in 1..=4 {
                    let i = lat.index(ic, jc, kc);
                    assert!((narrow.fe()[i] - wide.fe()[i]).abs() < 1e-12);
                    assert!((narrow.fy()[i] - wide.fy()[i]).abs() < 1e-12);
                    assert!((narrow.fz()[i] - wide.fz()[i]).abs() < 1e-12);
                }
            }
        }
    }
}
