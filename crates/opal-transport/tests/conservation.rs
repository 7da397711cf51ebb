//! Integration test: exact conservation of the scalar order parameter.
//!
//! Whatever goes into the faces (diffusion, advection, noise, solid
//! masking, sliding-plane reconciliation), the interior sum must come
//! out unchanged to rounding, because every face value enters exactly
//! two site updates with opposite signs.

use opal_core::PhysicsConstants;
use opal_lattice::{Decomposition, Field, HaloExchange, Lattice, PeriodicHalo, ShearPlanes};
use opal_test_utils::{hashed_field, uniform_velocity, IdentityPotential, MockMap};
use opal_transport::{CahnHilliard, LatticeNoise};

fn step_diffusion(
    driver: &mut CahnHilliard,
    phi: &mut Field,
    phys: &PhysicsConstants,
    shear: &ShearPlanes,
    velocity: Option<&Field>,
    map: Option<&MockMap>,
    noise: Option<&LatticeNoise>,
) {
    // mu = phi needs refreshed halos before the snapshot.
    PeriodicHalo.refresh(phi).unwrap();
    let mu = IdentityPotential::from_field(phi);
    driver
        .step(
            phi,
            &mu,
            phys,
            shear,
            velocity,
            map.map(|m| m as &dyn opal_core::FluidMap),
            noise.map(|n| n as &dyn opal_core::NoiseSource),
        )
        .unwrap();
}

#[test]
fn pure_diffusion_conserves_mass() {
    let lat = Lattice::new([8, 8, 8], 2).unwrap();
    let mut driver = CahnHilliard::builder().lattice(lat).build().unwrap();
    let mut phi = hashed_field(lat, 1);
    let phys = PhysicsConstants::scalar(0.05);
    let shear = ShearPlanes::none(8.0);

    let mass0 = phi.interior_sum(0);
    for _ in 0..5 {
        step_diffusion(&mut driver, &mut phi, &phys, &shear, None, None, None);
    }
    assert!((phi.interior_sum(0) - mass0).abs() < 1e-10);
}

#[test]
fn advection_conserves_mass() {
    let lat = Lattice::new([8, 6, 4], 2).unwrap();
    let mut driver = CahnHilliard::builder().lattice(lat).build().unwrap();
    let mut phi = hashed_field(lat, 2);
    let u = uniform_velocity(lat, [0.08, -0.03, 0.05]);
    let phys = PhysicsConstants::scalar(0.02);
    let shear = ShearPlanes::none(6.0);

    let mass0 = phi.interior_sum(0);
    for _ in 0..5 {
        step_diffusion(&mut driver, &mut phi, &phys, &shear, Some(&u), None, None);
    }
    assert!((phi.interior_sum(0) - mass0).abs() < 1e-10);
}

#[test]
fn stochastic_fluxes_conserve_mass() {
    // Noise needs the wide stencil, which needs three halo layers.
    let lat = Lattice::new([8, 8, 8], 3).unwrap();
    let mut driver = CahnHilliard::builder().lattice(lat).build().unwrap();
    let mut phi = hashed_field(lat, 3);
    let phys = PhysicsConstants::scalar(0.05).with_kt(1e-4);
    let shear = ShearPlanes::none(8.0);
    let mut noise = LatticeNoise::builder().lattice(lat).seed(77).build().unwrap();

    let mass0 = phi.interior_sum(0);
    for step in 0..5 {
        noise.set_step(step);
        step_diffusion(
            &mut driver,
            &mut phi,
            &phys,
            &shear,
            None,
            None,
            Some(&noise),
        );
    }
    assert!((phi.interior_sum(0) - mass0).abs() < 1e-10);
}

#[test]
fn solid_masking_conserves_mass() {
    let lat = Lattice::new([6, 6, 6], 2).unwrap();
    let mut driver = CahnHilliard::builder().lattice(lat).build().unwrap();
    let mut phi = hashed_field(lat, 4);
    let phys = PhysicsConstants::scalar(0.05);
    let shear = ShearPlanes::none(6.0);
    let map = MockMap::with_solid(vec![
        lat.index(3, 3, 3),
        lat.index(3, 4, 3),
        lat.index(4, 3, 3),
    ]);

    let mass0 = phi.interior_sum(0);
    for _ in 0..5 {
        step_diffusion(&mut driver, &mut phi, &phys, &shear, None, Some(&map), None);
    }
    assert!((phi.interior_sum(0) - mass0).abs() < 1e-10);
}

#[test]
fn sheared_transport_conserves_mass() {
    // The interpolation weights per source row sum to one across the
    // targets, so the reconciled plane fluxes move mass but never
    // create it.
    let lat = Lattice::new([8, 8, 4], 2).unwrap();
    let mut driver = CahnHilliard::builder().lattice(lat).build().unwrap();
    let mut phi = hashed_field(lat, 5);
    let u = uniform_velocity(lat, [0.0, 0.1, 0.0]);
    let phys = PhysicsConstants::scalar(0.04);
    let mut shear = ShearPlanes::new(&[4], 8, 8.0).unwrap();

    let mass0 = phi.interior_sum(0);
    for step in 0..6 {
        shear.set_displacement(0.63 * step as f64);
        step_diffusion(&mut driver, &mut phi, &phys, &shear, Some(&u), None, None);
    }
    assert!((phi.interior_sum(0) - mass0).abs() < 1e-10);
}

#[test]
fn quasi_2d_run_stays_finite_and_conserved() {
    let lat = Lattice::new([8, 8, 1], 2).unwrap();
    let mut driver = CahnHilliard::builder().lattice(lat).build().unwrap();
    let mut phi = hashed_field(lat, 6);
    let phys = PhysicsConstants::scalar(0.05);
    let shear = ShearPlanes::none(8.0);

    let mass0 = phi.interior_sum(0);
    for _ in 0..10 {
        step_diffusion(&mut driver, &mut phi, &phys, &shear, None, None, None);
    }
    assert!((phi.interior_sum(0) - mass0).abs() < 1e-10);
    assert!(phi.data().iter().all(|v| v.is_finite()));
}

#[test]
fn identical_runs_are_bitwise_identical() {
    let run = || {
        let lat = Lattice::new([6, 6, 6], 3).unwrap();
        let mut driver = CahnHilliard::builder()
            .lattice(lat)
            .decomposition(Decomposition::serial(6))
            .build()
            .unwrap();
        let mut phi = hashed_field(lat, 8);
        let phys = PhysicsConstants::scalar(0.03).with_kt(1e-5);
        let shear = ShearPlanes::none(6.0);
        let mut noise = LatticeNoise::builder().lattice(lat).seed(19).build().unwrap();
        for step in 0..4 {
            noise.set_step(step);
            step_diffusion(
                &mut driver,
                &mut phi,
                &phys,
                &shear,
                None,
                None,
                Some(&noise),
            );
        }
        phi
    };
    let a = run();
    let b = run();
    assert_eq!(a.data(), b.data());
}
