//! Physics constants threaded explicitly through every transport call.
//!
//! The constants live in one plain value owned by the caller and passed
//! by reference into each step. Device-constant mirrors or ambient
//! globals are deliberately absent; an offload path that needs its own
//! copy takes one by `Clone`.

/// Transport coefficients and thermal energy for one order-parameter
/// field.
///
/// The scalar driver reads `mobility` and `kt`; the tensor driver reads
/// `gamma`, `xi`, and `kt`. Unused coefficients are simply ignored, so a
/// single value can serve a coupled run with both fields active.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsConstants {
    /// Thermal energy kT. Zero disables fluctuations.
    pub kt: f64,
    /// Order-parameter mobility M (scalar transport).
    pub mobility: f64,
    /// Rotational diffusivity Gamma (tensor relaxation).
    pub gamma: f64,
    /// Flow-alignment parameter xi (tensor advection coupling).
    pub xi: f64,
}

impl PhysicsConstants {
    /// Constants for athermal scalar transport with mobility `m`.
    pub fn scalar(m: f64) -> Self {
        Self {
            kt: 0.0,
            mobility: m,
            gamma: 0.0,
            xi: 0.0,
        }
    }

    /// Constants for athermal tensor transport with rotational
    /// diffusivity `gamma` and flow-alignment parameter `xi`.
    pub fn tensor(gamma: f64, xi: f64) -> Self {
        Self {
            kt: 0.0,
            mobility: 0.0,
            gamma,
            xi,
        }
    }

    /// Set the thermal energy, enabling fluctuations when non-zero.
    pub fn with_kt(mut self, kt: f64) -> Self {
        self.kt = kt;
        self
    }

    /// Standard deviation of the stochastic flux increments for a
    /// transport coefficient `coeff`, from the fluctuation-dissipation
    /// relation `var = 2 kT coeff`.
    pub fn noise_sigma(&self, coeff: f64) -> f64 {
        (2.0 * self.kt * coeff).sqrt()
    }
}
