//! The tensor order-parameter driver.
//!
//! One step advances the five-component tensor field by the
//! Beris-Edwards dynamics: advective face fluxes (the conserved part,
//! reconciled across sliding planes like any other flux), plus the
//! local non-conserved terms applied site by site inside the update
//! itself: the velocity-gradient coupling S(W, Q), the rotational
//! relaxation `Gamma H`, and optional fluctuations projected onto the
//! five traceless symmetric base matrices of Bhattacharjee et al. with
//! variance `2 kT Gamma` per mode.
//!
//! Constructed via the builder pattern: [`BerisEdwards::builder`].

use crate::advection::{AdvectionScheme, CentredAdvection, NVEL};
use crate::boundary::no_normal_flux;
use crate::exchange::{reconcile_distributed, PlaneComm};
use crate::flux::FluxSet;
use crate::reconcile::reconcile_local;
use crate::update::UpdateExecutor;
use opal_core::{
    FluidMap, MolecularField, NoiseSource, PhysicsConstants, TransportError, NQAB, QXX, QXY, QXZ,
    QYY, QYZ,
};
use opal_lattice::{Decomposition, Field, HaloExchange, Lattice, PeriodicHalo, ShearPlanes};

const R3: f64 = 1.0 / 3.0;

/// The five traceless symmetric base matrices `T^i_ab`, normalised so
/// that `T^i_ab T^j_ab = delta_ij`:
///
/// ```text
/// T^0 = sqrt(3/2) [z z]    T^1 = sqrt(1/2) (x x - y y)
/// T^2 = sqrt(2) [x y]      T^3 = sqrt(2) [x z]      T^4 = sqrt(2) [y z]
/// ```
///
/// where square brackets denote the traceless symmetric part.
fn tmatrix() -> [[[f64; NQAB]; 3]; 3] {
    let mut t = [[[0.0; NQAB]; 3]; 3];
    let s32 = (3.0f64 / 2.0).sqrt();
    let s12 = (1.0f64 / 2.0).sqrt();
    let s2 = 2.0f64.sqrt();

    t[0][0][0] = s32 * (0.0 - R3);
    t[1][1][0] = s32 * (0.0 - R3);
    t[2][2][0] = s32 * (1.0 - R3);

    t[0][0][1] = s12;
    t[1][1][1] = -s12;

    t[0][1][2] = s2 * 0.5;
    t[1][0][2] = t[0][1][2];

    t[0][2][3] = s2 * 0.5;
    t[2][0][3] = t[0][2][3];

    t[1][2][4] = s2 * 0.5;
    t[2][1][4] = t[1][2][4];

    t
}

/// Driver for tensor order-parameter transport.
pub struct BerisEdwards {
    lattice: Lattice,
    decomp: Decomposition,
    halo: Box<dyn HaloExchange>,
    advection: Box<dyn AdvectionScheme>,
    comm: Option<Box<dyn PlaneComm>>,
    executor: UpdateExecutor,
    flux: FluxSet,
    tmatrix: [[[f64; NQAB]; 3]; 3],
}

/// Builder for [`BerisEdwards`].
///
/// Required field: `lattice`. A decomposed y axis additionally requires
/// `comm`.
pub struct BerisEdwardsBuilder {
    lattice: Option<Lattice>,
    decomp: Option<Decomposition>,
    halo: Option<Box<dyn HaloExchange>>,
    advection: Option<Box<dyn AdvectionScheme>>,
    comm: Option<Box<dyn PlaneComm>>,
    executor: UpdateExecutor,
}

impl BerisEdwards {
    /// Create a new builder.
    pub fn builder() -> BerisEdwardsBuilder {
        BerisEdwardsBuilder {
            lattice: None,
            decomp: None,
            halo: None,
            advection: None,
            comm: None,
            executor: UpdateExecutor::Sequential,
        }
    }

    /// The index space this driver steps over.
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Advance `q` by one step.
    ///
    /// `q` halos are refreshed here; `velocity` halos are the caller's
    /// responsibility. Fluid-solid maps mask the advective fluxes and
    /// skip the update at solid sites. The fluctuation amplitude is
    /// `sqrt(2 kT Gamma)` per base-matrix mode.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        q: &mut Field,
        mf: &dyn MolecularField,
        phys: &PhysicsConstants,
        shear: &ShearPlanes,
        velocity: Option<&Field>,
        map: Option<&dyn FluidMap>,
        noise: Option<&dyn NoiseSource>,
    ) -> Result<(), TransportError> {
        if q.nf() != NQAB {
            return Err(TransportError::ComponentMismatch {
                expected: NQAB,
                got: q.nf(),
            });
        }
        if q.nsites() != self.flux.nsites() {
            return Err(TransportError::SiteCountMismatch {
                field: q.nsites(),
                flux: self.flux.nsites(),
            });
        }
        if let Some(u) = velocity {
            if u.nf() != NVEL {
                return Err(TransportError::ComponentMismatch {
                    expected: NVEL,
                    got: u.nf(),
                });
            }
        }

        self.halo.refresh(q).map_err(TransportError::Comm)?;
        self.flux.zero();

        if let Some(u) = velocity {
            self.advection.accumulate(&mut self.flux, u, q)?;
            if let Some(map) = map {
                no_normal_flux(&mut self.flux, map);
            }
            if self.decomp.is_serial_y() {
                reconcile_local(&mut self.flux, shear)?;
            } else {
                let comm = self.comm.as_deref().ok_or(TransportError::Comm(
                    opal_core::CommError::UnknownPeer {
                        peer: self.decomp.cart_rank(),
                    },
                ))?;
                reconcile_distributed(&mut self.flux, shear, &self.decomp, comm)?;
            }
        }

        self.update(q, mf, phys, velocity, map, noise);
        Ok(())
    }

    /// The per-site update, run by the configured executor over
    /// disjoint x slabs.
    fn update(
        &self,
        q: &mut Field,
        mf: &dyn MolecularField,
        phys: &PhysicsConstants,
        velocity: Option<&Field>,
        map: Option<&dyn FluidMap>,
        noise: Option<&dyn NoiseSource>,
    ) {
        let lattice = self.lattice;
        let [_, ny, nz] = lattice.nlocal();
        let [xs, ys, _] = lattice.strides();
        let wz = if lattice.is_quasi_2d() { 0.0 } else { 1.0 };
        let dt = 1.0;
        let gamma = phys.gamma;
        let xi = phys.xi;
        let var = phys.noise_sigma(gamma);
        let tmat = self.tmatrix;
        let flux = &self.flux;

        self.executor.run(q, &move |data: &mut [f64],
                                    xlo: i32,
                                    xhi: i32,
                                    base: usize| {
            let mut chi = [0.0; NQAB];
            for ic in xlo..=xhi {
                for jc in 1..=ny {
                    for kc in 1..=nz {
                        let index = lattice.index(ic, jc, kc);
                        if let Some(map) = map {
                            if !map.is_fluid(index) {
                                continue;
                            }
                        }

                        let e = index * NQAB - base;
                        let mut q_ab = full_tensor([
                            data[e + QXX],
                            data[e + QXY],
                            data[e + QXZ],
                            data[e + QYY],
                            data[e + QYZ],
                        ]);
                        let h = mf.h(index).full();

                        let mut s = [[0.0; 3]; 3];
                        if let Some(u) = velocity {
                            s = coupling_term(&q_ab, u, index, xs, ys, xi);
                        }

                        let mut chi_qab = [[0.0; 3]; 3];
                        if let Some(source) = noise {
                            source.reap(index, &mut chi);
                            for (ia, row) in chi_qab.iter_mut().enumerate() {
                                for (ib, v) in row.iter_mut().enumerate() {
                                    for (id, c) in chi.iter().enumerate() {
                                        *v += var * c * tmat[ia][ib][id];
                                    }
                                }
                            }
                        }

                        let south = (index - ys) * NQAB;
                        let below = (index - 1) * NQAB;
                        for (n, (ia, ib)) in
                            [(QXX, (0, 0)), (QXY, (0, 1)), (QXZ, (0, 2)), (QYY, (1, 1)), (QYZ, (1, 2))]
                        {
                            let fn_ = index * NQAB + n;
                            let div = flux.fe()[fn_] - flux.fw()[fn_] + flux.fy()[fn_]
                                - flux.fy()[south + n]
                                + wz * (flux.fz()[fn_] - flux.fz()[below + n]);
                            q_ab[ia][ib] += dt * (s[ia][ib] + gamma * h[ia][ib] + chi_qab[ia][ib] - div);
                        }

                        data[e + QXX] = q_ab[0][0];
                        data[e + QXY] = q_ab[0][1];
                        data[e + QXZ] = q_ab[0][2];
                        data[e + QYY] = q_ab[1][1];
                        data[e + QYZ] = q_ab[1][2];
                    }
                }
            }
        });
    }
}

/// Expand the five stored components to a full matrix with
/// `ZZ = -XX - YY`.
fn full_tensor(c: [f64; NQAB]) -> [[f64; 3]; 3] {
    [
        [c[QXX], c[QXY], c[QXZ]],
        [c[QXY], c[QYY], c[QYZ]],
        [c[QXZ], c[QYZ], -c[QXX] - c[QYY]],
    ]
}

/// The velocity-gradient coupling S(W, Q).
///
/// W is the centred-difference velocity gradient with its trace
/// removed; D and Omega its symmetric and antisymmetric parts. Then
///
/// ```text
/// S = (xi D + Omega)(Q + I/3) + (Q + I/3)(xi D - Omega)
///     - 2 xi (Q + I/3) Tr(Q W)
/// ```
fn coupling_term(
    q: &[[f64; 3]; 3],
    velocity: &Field,
    index: usize,
    xs: usize,
    ys: usize,
    xi: f64,
) -> [[f64; 3]; 3] {
    let mut w = [[0.0; 3]; 3];
    for (ib, stride) in [xs, ys, 1].into_iter().enumerate() {
        let ip1 = index + stride;
        let im1 = index - stride;
        for (ia, row) in w.iter_mut().enumerate() {
            row[ib] = 0.5 * (velocity.get(ip1, ia) - velocity.get(im1, ia));
        }
    }
    let tr = R3 * (w[0][0] + w[1][1] + w[2][2]);
    w[0][0] -= tr;
    w[1][1] -= tr;
    w[2][2] -= tr;

    let mut trace_qw = 0.0;
    let mut d = [[0.0; 3]; 3];
    let mut omega = [[0.0; 3]; 3];
    for ia in 0..3 {
        for ib in 0..3 {
            trace_qw += q[ia][ib] * w[ib][ia];
            d[ia][ib] = 0.5 * (w[ia][ib] + w[ib][ia]);
            omega[ia][ib] = 0.5 * (w[ia][ib] - w[ib][ia]);
        }
    }

    let unit = |ia: usize, ib: usize| if ia == ib { 1.0 } else { 0.0 };
    let mut s = [[0.0; 3]; 3];
    for ia in 0..3 {
        for ib in 0..3 {
            s[ia][ib] = -2.0 * xi * (q[ia][ib] + R3 * unit(ia, ib)) * trace_qw;
            for id in 0..3 {
                s[ia][ib] += (xi * d[ia][id] + omega[ia][id]) * (q[id][ib] + R3 * unit(id, ib))
                    + (q[ia][id] + R3 * unit(ia, id)) * (xi * d[id][ib] - omega[id][ib]);
            }
        }
    }
    s
}

impl BerisEdwardsBuilder {
    /// Set the lattice (required).
    pub fn lattice(mut self, lattice: Lattice) -> Self {
        self.lattice = Some(lattice);
        self
    }

    /// Set the y decomposition (default: everything local).
    pub fn decomposition(mut self, decomp: Decomposition) -> Self {
        self.decomp = Some(decomp);
        self
    }

    /// Set the halo refresher (default: [`PeriodicHalo`]).
    pub fn halo(mut self, halo: Box<dyn HaloExchange>) -> Self {
        self.halo = Some(halo);
        self
    }

    /// Set the advection scheme (default: [`CentredAdvection`]).
    pub fn advection(mut self, scheme: Box<dyn AdvectionScheme>) -> Self {
        self.advection = Some(scheme);
        self
    }

    /// Set the strip transport for a decomposed y axis.
    pub fn comm(mut self, comm: Box<dyn PlaneComm>) -> Self {
        self.comm = Some(comm);
        self
    }

    /// Set the update executor (default: sequential).
    pub fn executor(mut self, executor: UpdateExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Build the driver, validating all configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - `lattice` is not set
    /// - the decomposition's rows do not match the lattice y extent
    /// - the y axis is decomposed but no `comm` was provided
    pub fn build(self) -> Result<BerisEdwards, String> {
        let lattice = self.lattice.ok_or_else(|| "lattice is required".to_string())?;
        let decomp = self
            .decomp
            .unwrap_or_else(|| Decomposition::serial(lattice.nlocal()[1]));

        if decomp.nlocal_y() != lattice.nlocal()[1] {
            return Err(format!(
                "decomposition gives {} local rows, lattice has {}",
                decomp.nlocal_y(),
                lattice.nlocal()[1]
            ));
        }
        if !decomp.is_serial_y() && self.comm.is_none() {
            return Err("decomposed y axis requires a strip transport (comm)".to_string());
        }
        if let (false, Some(comm)) = (decomp.is_serial_y(), self.comm.as_deref()) {
            if comm.rank() != decomp.cart_rank() {
                return Err(format!(
                    "comm is rank {}, decomposition is rank {}",
                    comm.rank(),
                    decomp.cart_rank()
                ));
            }
        }

        Ok(BerisEdwards {
            lattice,
            decomp,
            halo: self.halo.unwrap_or_else(|| Box::new(PeriodicHalo)),
            advection: self
                .advection
                .unwrap_or_else(|| Box::new(CentredAdvection)),
            comm: self.comm,
            executor: self.executor,
            flux: FluxSet::new(lattice, NQAB),
            tmatrix: tmatrix(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::ChannelComm;
    use opal_core::Sym3;

    #[test]
    fn builder_rejects_comm_with_wrong_rank() {
        let lat = Lattice::new([4, 4, 4], 2).unwrap();
        let decomp = Decomposition::new(8, 2, 0).unwrap();
        let mut comms = ChannelComm::fully_connected(2);
        let rank1 = comms.pop().expect("two comms");
        let err = BerisEdwards::builder()
            .lattice(lat)
            .decomposition(decomp)
            .comm(Box::new(rank1))
            .build()
            .map(|_| ())
            .unwrap_err();
        assert!(err.contains("rank"));
    }

    #[test]
    fn base_matrices_are_orthonormal() {
        let t = tmatrix();
        for i in 0..NQAB {
            for j in 0..NQAB {
                let mut dot = 0.0;
                for row in &t {
                    for cell in row {
                        dot += cell[i] * cell[j];
                    }
                }
                let want = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (dot - want).abs() < 1e-12,
                    "T^{i} : T^{j} = {dot}, want {want}"
                );
            }
        }
    }

    #[test]
    fn base_matrices_are_traceless_and_symmetric() {
        let t = tmatrix();
        for id in 0..NQAB {
            let trace = t[0][0][id] + t[1][1][id] + t[2][2][id];
            assert!(trace.abs() < 1e-12);
            for ia in 0..3 {
                for ib in 0..3 {
                    assert_eq!(t[ia][ib][id], t[ib][ia][id]);
                }
            }
        }
    }

    #[test]
    fn coupling_term_vanishes_for_uniform_flow() {
        let lat = Lattice::new([4, 4, 4], 2).unwrap();
        let mut u = Field::new(lat, NVEL);
        for site in 0..u.nsites() {
            u.set(site, 0, 0.3);
            u.set(site, 1, -0.1);
            u.set(site, 2, 0.7);
        }
        let q = full_tensor([0.1, 0.02, -0.05, 0.08, 0.01]);
        let [xs, ys, _] = lat.strides();
        let s = coupling_term(&q, &u, lat.index(2, 2, 2), xs, ys, 0.7);
        for row in &s {
            for v in row {
                assert!(v.abs() < 1e-14);
            }
        }
    }

    #[test]
    fn relaxation_moves_q_towards_gamma_h() {
        struct ConstantH;
        impl MolecularField for ConstantH {
            fn h(&self, _site: usize) -> Sym3 {
                Sym3 {
                    xx: 0.2,
                    xy: 0.1,
                    xz: 0.0,
                    yy: -0.1,
                    yz: 0.05,
                }
            }
        }

        let lat = Lattice::new([4, 4, 4], 2).unwrap();
        let mut driver = BerisEdwards::builder().lattice(lat).build().unwrap();
        let mut q = Field::new(lat, NQAB);
        let phys = PhysicsConstants::tensor(0.5, 0.0);
        driver
            .step(
                &mut q,
                &ConstantH,
                &phys,
                &ShearPlanes::none(4.0),
                None,
                None,
                None,
            )
            .unwrap();

        // With no flow and no noise, one step is q += Gamma * H.
        let got = q.tensor(lat.index(2, 3, 1));
        assert!((got.xx - 0.1).abs() < 1e-14);
        assert!((got.xy - 0.05).abs() < 1e-14);
        assert!((got.yy + 0.05).abs() < 1e-14);
        assert!((got.yz - 0.025).abs() < 1e-14);
    }

    #[test]
    fn update_preserves_tracelessness_implicitly() {
        // Only five components are stored; ZZ is derived, so the trace
        // cannot drift whatever the step does.
        let lat = Lattice::new([2, 2, 2], 2).unwrap();
        let f = Field::new(lat, NQAB);
        let t = f.tensor(lat.index(1, 1, 1)).full();
        assert_eq!(t[0][0] + t[1][1] + t[2][2], 0.0);
    }

    #[test]
    fn parallel_executor_matches_sequential() {
        struct SiteH;
        impl MolecularField for SiteH {
            fn h(&self, site: usize) -> Sym3 {
                Sym3 {
                    xx: (site % 7) as f64 * 0.01,
                    xy: (site % 5) as f64 * 0.01,
                    xz: 0.0,
                    yy: -((site % 3) as f64) * 0.01,
                    yz: 0.0,
                }
            }
        }

        let lat = Lattice::new([6, 4, 4], 2).unwrap();
        let mut u = Field::new(lat, NVEL);
        for site in 0..u.nsites() {
            u.set(site, 0, (site % 11) as f64 * 0.001);
            u.set(site, 1, (site % 13) as f64 * 0.001);
        }
        let phys = PhysicsConstants::tensor(0.4, 0.6);
        let shear = ShearPlanes::none(4.0);

        let run = |executor: UpdateExecutor| {
            let mut driver = BerisEdwards::builder()
                .lattice(lat)
                .executor(executor)
                .build()
                .unwrap();
            let mut q = Field::new(lat, NQAB);
            for site in 0..q.nsites() {
                for n in 0..NQAB {
                    q.set(site, n, ((site + n) % 17) as f64 * 0.01);
                }
            }
            driver
                .step(&mut q, &SiteH, &phys, &shear, Some(&u), None, None)
                .unwrap();
            q
        };

        let seq = run(UpdateExecutor::Sequential);
        let par = run(UpdateExecutor::Parallel { threads: 4 });
        assert_eq!(seq.data(), par.data());
    }
}
