//! Criterion micro-benchmarks for the individual flux stages.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use opal_bench::{reference_lattice, smooth_field, stress_lattice};
use opal_core::ChemicalPotential;
use opal_lattice::{Field, ShearPlanes};
use opal_transport::accumulate::{diffusive_two_point, diffusive_wide};
use opal_transport::noise::stochastic;
use opal_transport::reconcile::reconcile_local;
use opal_transport::{FluxSet, LatticeNoise};

struct FieldMu(Field);

impl ChemicalPotential for FieldMu {
    fn mu(&self, site: usize) -> f64 {
        self.0.scalar(site)
    }
}

/// Benchmark: two-point diffusive accumulation over 32x32x32.
fn bench_two_point_32(c: &mut Criterion) {
    let lat = reference_lattice();
    let mu = FieldMu(smooth_field(lat));
    let mut flux = FluxSet::new(lat, 1);

    c.bench_function("diffusive_two_point_32", |b| {
        b.iter(|| {
            flux.zero();
            diffusive_two_point(&mut flux, &mu, black_box(0.05)).unwrap();
        });
    });
}

/// Benchmark: wide-stencil accumulation over 64x64x64.
fn bench_wide_64(c: &mut Criterion) {
    let lat = stress_lattice();
    let mu = FieldMu(smooth_field(lat));
    let mut flux = FluxSet::new(lat, 1);

    c.bench_function("diffusive_wide_64", |b| {
        b.iter(|| {
            flux.zero();
            diffusive_wide(&mut flux, &mu, black_box(0.05)).unwrap();
        });
    });
}

/// Benchmark: stochastic flux accumulation over 32x32x32.
fn bench_stochastic_32(c: &mut Criterion) {
    let lat = reference_lattice();
    let mut flux = FluxSet::new(lat, 1);
    let shear = ShearPlanes::none(32.0);
    let noise = LatticeNoise::builder().lattice(lat).seed(1).build().unwrap();

    c.bench_function("stochastic_flux_32", |b| {
        b.iter(|| {
            flux.zero();
            stochastic(&mut flux, &shear, &noise, black_box(0.01)).unwrap();
        });
    });
}

/// Benchmark: local plane reconciliation, one plane, 32x32x32.
fn bench_reconcile_local_32(c: &mut Criterion) {
    let lat = reference_lattice();
    let mut flux = FluxSet::new(lat, 1);
    for (i, v) in flux.fe_mut().iter_mut().enumerate() {
        *v = (i % 17) as f64 * 0.01;
    }
    let mut shear = ShearPlanes::new(&[16], 32, 32.0).unwrap();
    shear.set_displacement(7.3);

    c.bench_function("reconcile_local_32", |b| {
        b.iter(|| {
            reconcile_local(&mut flux, black_box(&shear)).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_two_point_32,
    bench_wide_64,
    bench_stochastic_32,
    bench_reconcile_local_32
);
criterion_main!(benches);
