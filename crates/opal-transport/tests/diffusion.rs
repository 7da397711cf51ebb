//! Integration test: a point spike relaxing under plain diffusion.
//!
//! With `mu = phi` the conserved dynamics reduce to the heat equation
//! with diffusivity equal to the mobility, so every qualitative feature
//! of the run is predictable: the peak decays monotonically, the spike
//! spreads symmetrically, and the mass stays at one.

use opal_core::PhysicsConstants;
use opal_lattice::{Field, HaloExchange, Lattice, PeriodicHalo, ShearPlanes};
use opal_test_utils::{spike_field, IdentityPotential};
use opal_transport::{CahnHilliard, UpdateExecutor};

fn step(driver: &mut CahnHilliard, phi: &mut Field, phys: &PhysicsConstants, shear: &ShearPlanes) {
    PeriodicHalo.refresh(phi).unwrap();
    let mu = IdentityPotential::from_field(phi);
    driver
        .step(phi, &mu, phys, shear, None, None, None)
        .unwrap();
}

#[test]
fn spike_spreads_and_mass_stays_at_one() {
    let lat = Lattice::new([8, 8, 8], 2).unwrap();
    let mut driver = CahnHilliard::builder().lattice(lat).build().unwrap();
    let mut phi = spike_field(lat);
    let phys = PhysicsConstants::scalar(0.05);
    let shear = ShearPlanes::none(8.0);
    let centre = lat.index(5, 5, 5);

    let mut peak = phi.scalar(centre);
    assert_eq!(peak, 1.0);

    for _ in 0..10 {
        step(&mut driver, &mut phi, &phys, &shear);
        let now = phi.scalar(centre);
        assert!(now < peak, "peak must decay monotonically");
        assert!(now > 0.0);
        peak = now;
        assert!((phi.interior_sum(0) - 1.0).abs() < 1e-12);
    }

    // After ten steps the immediate neighbours carry visible mass.
    assert!(phi.scalar(lat.index(6, 5, 5)) > 1e-4);
}

#[test]
fn spreading_is_symmetric_about_the_spike() {
    let lat = Lattice::new([8, 8, 8], 2).unwrap();
    let mut driver = CahnHilliard::builder().lattice(lat).build().unwrap();
    let mut phi = spike_field(lat);
    let phys = PhysicsConstants::scalar(0.05);
    let shear = ShearPlanes::none(8.0);

    for _ in 0..6 {
        step(&mut driver, &mut phi, &phys, &shear);
    }

    for d in 1..=3 {
        let up = phi.scalar(lat.index(5 + d, 5, 5));
        let down = phi.scalar(lat.index(5 - d, 5, 5));
        assert!((up - down).abs() < 1e-12, "x asymmetry at distance {d}");
        let up = phi.scalar(lat.index(5, 5 + d, 5));
        let down = phi.scalar(lat.index(5, 5 - d, 5));
        assert!((up - down).abs() < 1e-12, "y asymmetry at distance {d}");
        let up = phi.scalar(lat.index(5, 5, 5 + d));
        let down = phi.scalar(lat.index(5, 5, 5 - d));
        assert!((up - down).abs() < 1e-12, "z asymmetry at distance {d}");
    }

    // The three axes are equivalent for this stencil.
    let x = phi.scalar(lat.index(7, 5, 5));
    let y = phi.scalar(lat.index(5, 7, 5));
    let z = phi.scalar(lat.index(5, 5, 7));
    assert!((x - y).abs() < 1e-12);
    assert!((x - z).abs() < 1e-12);
}

#[test]
fn sinusoidal_mode_decays_at_the_closed_form_rate() {
    // One step of mu = phi diffusion is phi += M * Lap(phi). A single
    // discrete Fourier mode along x is an eigenvector of the lattice
    // Laplacian with eigenvalue 2 cos(2 pi / N) - 2, so every site
    // scales by the same factor.
    let n = 8;
    let lat = Lattice::new([n, n, n], 2).unwrap();
    let mut driver = CahnHilliard::builder().lattice(lat).build().unwrap();
    let mobility = 0.05;
    let phys = PhysicsConstants::scalar(mobility);
    let shear = ShearPlanes::none(n as f64);

    let mut phi = Field::new(lat, 1);
    let wave = |ic: i32| (2.0 * std::f64::consts::PI * ic as f64 / n as f64).sin();
    for ic in 1..=n {
        for jc in 1..=n {
            for kc in 1..=n {
                phi.set_scalar(lat.index(ic, jc, kc), 0.3 * wave(ic));
            }
        }
    }
    let before = phi.clone();

    step(&mut driver, &mut phi, &phys, &shear);

    let eig = 2.0 * (2.0 * std::f64::consts::PI / n as f64).cos() - 2.0;
    let factor = 1.0 + mobility * eig;
    for ic in 1..=n {
        for jc in 1..=n {
            for kc in 1..=n {
                let i = lat.index(ic, jc, kc);
                let want = factor * before.scalar(i);
                assert!(
                    (phi.scalar(i) - want).abs() < 1e-13,
                    "mode decay off at ({ic},{jc},{kc}): {} vs {want}",
                    phi.scalar(i)
                );
            }
        }
    }
}

#[test]
fn parallel_executor_reproduces_sequential_run() {
    let run = |executor: UpdateExecutor| {
        let lat = Lattice::new([8, 8, 8], 2).unwrap();
        let mut driver = CahnHilliard::builder()
            .lattice(lat)
            .executor(executor)
            .build()
            .unwrap();
        let mut phi = spike_field(lat);
        let phys = PhysicsConstants::scalar(0.05);
        let shear = ShearPlanes::none(8.0);
        for _ in 0..5 {
            step(&mut driver, &mut phi, &phys, &shear);
        }
        phi
    };

    let seq = run(UpdateExecutor::Sequential);
    let par = run(UpdateExecutor::Parallel { threads: 4 });
    assert_eq!(seq.data(), par.data());
}
