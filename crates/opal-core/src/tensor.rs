//! Symmetric traceless 3x3 tensors stored as five independent components.
//!
//! The tensor order parameter carries five stored components (XX, XY, XZ,
//! YY, YZ); the sixth diagonal entry is derived from tracelessness as
//! `ZZ = -XX - YY`. Component order matches the per-site storage layout
//! of tensor fields and flux sets.

/// Number of independent components of a symmetric traceless tensor.
pub const NQAB: usize = 5;

/// Component index of the XX entry.
pub const QXX: usize = 0;
/// Component index of the XY entry.
pub const QXY: usize = 1;
/// Component index of the XZ entry.
pub const QXZ: usize = 2;
/// Component index of the YY entry.
pub const QYY: usize = 3;
/// Component index of the YZ entry.
pub const QYZ: usize = 4;

/// A symmetric traceless 3x3 tensor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sym3 {
    /// XX entry.
    pub xx: f64,
    /// XY entry (= YX).
    pub xy: f64,
    /// XZ entry (= ZX).
    pub xz: f64,
    /// YY entry.
    pub yy: f64,
    /// YZ entry (= ZY).
    pub yz: f64,
}

impl Sym3 {
    /// The zero tensor.
    pub const ZERO: Sym3 = Sym3 {
        xx: 0.0,
        xy: 0.0,
        xz: 0.0,
        yy: 0.0,
        yz: 0.0,
    };

    /// Build from the five stored components in storage order.
    pub fn from_components(c: [f64; NQAB]) -> Self {
        Self {
            xx: c[QXX],
            xy: c[QXY],
            xz: c[QXZ],
            yy: c[QYY],
            yz: c[QYZ],
        }
    }

    /// The five stored components in storage order.
    pub fn components(&self) -> [f64; NQAB] {
        [self.xx, self.xy, self.xz, self.yy, self.yz]
    }

    /// The derived ZZ entry, `-xx - yy`.
    pub fn zz(&self) -> f64 {
        -self.xx - self.yy
    }

    /// Expand to a full 3x3 matrix.
    pub fn full(&self) -> [[f64; 3]; 3] {
        [
            [self.xx, self.xy, self.xz],
            [self.xy, self.yy, self.yz],
            [self.xz, self.yz, self.zz()],
        ]
    }

    /// Project a full 3x3 matrix onto its symmetric traceless part and
    /// store the five independent components.
    pub fn from_full(m: [[f64; 3]; 3]) -> Self {
        let tr3 = (m[0][0] + m[1][1] + m[2][2]) / 3.0;
        Self {
            xx: 0.5 * (m[0][0] + m[0][0]) - tr3,
            xy: 0.5 * (m[0][1] + m[1][0]),
            xz: 0.5 * (m[0][2] + m[2][0]),
            yy: 0.5 * (m[1][1] + m[1][1]) - tr3,
            yz: 0.5 * (m[1][2] + m[2][1]),
        }
    }
}

impl std::ops::Add for Sym3 {
    type Output = Sym3;

    fn add(self, o: Sym3) -> Sym3 {
        Sym3 {
            xx: self.xx + o.xx,
            xy: self.xy + o.xy,
            xz: self.xz + o.xz,
            yy: self.yy + o.yy,
            yz: self.yz + o.yz,
        }
    }
}

impl std::ops::Mul<Sym3> for f64 {
    type Output = Sym3;

    fn mul(self, t: Sym3) -> Sym3 {
        Sym3 {
            xx: self * t.xx,
            xy: self * t.xy,
            xz: self * t.xz,
            yy: self * t.yy,
            yz: self * t.yz,
        }
    }
}
