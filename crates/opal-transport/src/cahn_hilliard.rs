//! The scalar order-parameter driver.
//!
//! One step advances the composition field by the conserved
//! Cahn-Hilliard dynamics: advective fluxes from the velocity field,
//! diffusive fluxes `-M grad(mu)` from the chemical potential, optional
//! stochastic fluxes with variance `2 kT M`, solid-boundary masking,
//! sliding-plane reconciliation, and the forward Euler divergence
//! update. Mass is conserved to rounding because every contribution
//! enters through faces.
//!
//! Constructed via the builder pattern: [`CahnHilliard::builder`].

use crate::accumulate::{diffusive_two_point, diffusive_wide};
use crate::advection::{AdvectionScheme, CentredAdvection};
use crate::boundary::no_normal_flux;
use crate::exchange::{reconcile_distributed, PlaneComm};
use crate::flux::FluxSet;
use crate::noise::stochastic;
use crate::reconcile::reconcile_local;
use crate::update::{forward_step, UpdateExecutor};
use opal_core::{ChemicalPotential, FluidMap, NoiseSource, PhysicsConstants, TransportError};
use opal_lattice::{Decomposition, Field, HaloExchange, Lattice, PeriodicHalo, ShearPlanes};

/// Driver for conserved scalar transport.
pub struct CahnHilliard {
    lattice: Lattice,
    decomp: Decomposition,
    halo: Box<dyn HaloExchange>,
    advection: Box<dyn AdvectionScheme>,
    comm: Option<Box<dyn PlaneComm>>,
    executor: UpdateExecutor,
    flux: FluxSet,
}

/// Builder for [`CahnHilliard`].
///
/// Required field: `lattice`. A decomposed y axis additionally requires
/// `comm`.
pub struct CahnHilliardBuilder {
    lattice: Option<Lattice>,
    decomp: Option<Decomposition>,
    halo: Option<Box<dyn HaloExchange>>,
    advection: Option<Box<dyn AdvectionScheme>>,
    comm: Option<Box<dyn PlaneComm>>,
    executor: UpdateExecutor,
}

impl CahnHilliard {
    /// Create a new builder.
    pub fn builder() -> CahnHilliardBuilder {
        CahnHilliardBuilder {
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

    /// Advance `phi` by one step.
    ///
    /// `phi` halos are refreshed here; `velocity` halos (and, under
    /// shear, its plane interpolation) are the caller's responsibility.
    /// Passing a noise source switches the diffusive term to the wide
    /// stencil and adds stochastic fluxes with variance
    /// `2 kT M`; it is an error if this rank holds sliding planes.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        phi: &mut Field,
        mu: &dyn ChemicalPotential,
        phys: &PhysicsConstants,
        shear: &ShearPlanes,
        velocity: Option<&Field>,
        map: Option<&dyn FluidMap>,
        noise: Option<&dyn NoiseSource>,
    ) -> Result<(), TransportError> {
        if phi.nf() != 1 {
            return Err(TransportError::ComponentMismatch {
                expected: 1,
                got: phi.nf(),
            });
        }
        if phi.nsites() != self.flux.nsites() {
            return Err(TransportError::SiteCountMismatch {
                field: phi.nsites(),
                flux: self.flux.nsites(),
            });
        }

        self.halo.refresh(phi).map_err(TransportError::Comm)?;
        self.flux.zero();

        if let Some(u) = velocity {
            self.advection.accumulate(&mut self.flux, u, phi)?;
        }

        match noise {
            Some(source) => {
                diffusive_wide(&mut self.flux, mu, phys.mobility)?;
                stochastic(
                    &mut self.flux,
                    shear,
                    source,
                    phys.noise_sigma(phys.mobility),
                )?;
            }
            None => diffusive_two_point(&mut self.flux, mu, phys.mobility)?,
        }

        if let Some(map) = map {
            no_normal_flux(&mut self.flux, map);
        }

        if self.decomp.is_serial_y() {
            reconcile_local(&mut self.flux, shear)?;
        } else {
            // Builder guarantees a transport exists for a decomposed y.
            let comm = self.comm.as_deref().ok_or(TransportError::Comm(
                opal_core::CommError::UnknownPeer {
                    peer: self.decomp.cart_rank(),
                },
            ))?;
            reconcile_distributed(&mut self.flux, shear, &self.decomp, comm)?;
        }

        forward_step(phi, &self.flux, self.executor)
    }
}

impl CahnHilliardBuilder {
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
    pub fn build(self) -> Result<CahnHilliard, String> {
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

        Ok(CahnHilliard {
            lattice,
            decomp,
            halo: self.halo.unwrap_or_else(|| Box::new(PeriodicHalo)),
            advection: self
                .advection
                .unwrap_or_else(|| Box::new(CentredAdvection)),
            comm: self.comm,
            executor: self.executor,
            flux: FluxSet::new(lattice, 1),
        })
    }
}
