//! The shared face-flux container.
//!
//! Four dense arrays hold the fluxes through the four distinct faces of
//! each site: `fe` (east, towards `+x`), `fw` (west, towards `-x`), `fy`
//! (north, towards `+y`), and `fz` (up, towards `+z`). Only west keeps
//! its own array alongside east; in a plain periodic domain `fw` at
//! `ic` duplicates `fe` at `ic - 1`, but across a sliding plane the two
//! sides see different periodic images and the reconciliation stage
//! needs both to restore a unique face value.

use opal_lattice::Lattice;

/// Face fluxes for an `nf`-component field, site-major
/// (`site * nf + component`).
#[derive(Clone, Debug)]
pub struct FluxSet {
    lattice: Lattice,
    nf: usize,
    fe: Vec<f64>,
    fw: Vec<f64>,
    fy: Vec<f64>,
    fz: Vec<f64>,
}

impl FluxSet {
    /// Allocate zeroed fluxes for `nf` components over `lattice`.
    pub fn new(lattice: Lattice, nf: usize) -> Self {
        let len = lattice.nsites() * nf;
        Self {
            lattice,
            nf,
            fe: vec![0.0; len],
            fw: vec![0.0; len],
            fy: vec![0.0; len],
            fz: vec![0.0; len],
        }
    }

    /// The index space the fluxes are laid out over.
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Components per site.
    pub fn nf(&self) -> usize {
        self.nf
    }

    /// Total sites including halo.
    pub fn nsites(&self) -> usize {
        self.lattice.nsites()
    }

    /// Reset every flux to zero. Called once per step before
    /// accumulation begins.
    pub fn zero(&mut self) {
        self.fe.fill(0.0);
        self.fw.fill(0.0);
        self.fy.fill(0.0);
        self.fz.fill(0.0);
    }

    /// East fluxes.
    pub fn fe(&self) -> &[f64] {
        &self.fe
    }

    /// East fluxes, mutable.
    pub fn fe_mut(&mut self) -> &mut [f64] {
        &mut self.fe
    }

    /// West fluxes.
    pub fn fw(&self) -> &[f64] {
        &self.fw
    }

    /// West fluxes, mutable.
    pub fn fw_mut(&mut self) -> &mut [f64] {
        &mut self.fw
    }

    /// North fluxes.
    pub fn fy(&self) -> &[f64] {
        &self.fy
    }

    /// North fluxes, mutable.
    pub fn fy_mut(&mut self) -> &mut [f64] {
        &mut self.fy
    }

    /// Up fluxes.
    pub fn fz(&self) -> &[f64] {
        &self.fz
    }

    /// Up fluxes, mutable.
    pub fn fz_mut(&mut self) -> &mut [f64] {
        &mut self.fz
    }

    /// All four flux arrays, mutable at once. Used by the stages that
    /// write several faces per site in one pass.
    pub fn faces_mut(&mut self) -> [&mut [f64]; 4] {
        [&mut self.fe, &mut self.fw, &mut self.fy, &mut self.fz]
    }

    /// Flat element index of component `n` at `site`.
    pub fn idx(&self, site: usize, n: usize) -> usize {
        site * self.nf + n
    }
}
