//! Benchmark fixtures for the Opal transport engine.
//!
//! Provides pre-built lattices and fields at the two sizes the
//! benchmarks use:
//!
//! - [`reference_lattice`]: 32x32x32 interior, two halo layers
//! - [`stress_lattice`]: 64x64x64 interior, three halo layers

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use opal_lattice::{Field, HaloExchange, Lattice, PeriodicHalo};

/// The reference benchmark lattice: 32x32x32 with two halo layers.
pub fn reference_lattice() -> Lattice {
    Lattice::new([32, 32, 32], 2).expect("static extents are valid")
}

/// The stress benchmark lattice: 64x64x64 with three halo layers
/// (wide-stencil capable).
pub fn stress_lattice() -> Lattice {
    Lattice::new([64, 64, 64], 3).expect("static extents are valid")
}

/// A smooth scalar field over `lattice`, halos refreshed.
pub fn smooth_field(lattice: Lattice) -> Field {
    let [nx, ny, nz] = lattice.nlocal();
    let mut phi = Field::new(lattice, 1);
    for ic in 1..=nx {
        for jc in 1..=ny {
            for kc in 1..=nz {
                let v = (ic as f64 / nx as f64).sin()
                    * (jc as f64 / ny as f64).cos()
                    * (kc as f64 / nz as f64).sin();
                phi.set_scalar(lattice.index(ic, jc, kc), v);
            }
        }
    }
    PeriodicHalo
        .refresh(&mut phi)
        .expect("periodic halo refresh cannot fail");
    phi
}
