//! Relativistic four-momentum.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Energy-momentum four-vector `(E, px, py, pz)` in GeV.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FourVector {
    e: f64,
    px: f64,
    py: f64,
    pz: f64,
}

impl FourVector {
    /// Creates a four-vector from Cartesian components.
    #[inline]
    #[must_use]
    pub const fn new(e: f64, px: f64, py: f64, pz: f64) -> Self {
        Self { e, px, py, pz }
    }

    /// Builds an on-shell four-vector from a spherical momentum and a mass.
    ///
    /// Angles are used as given (no wrapping), so inputs reproduce reference
    /// data bit for bit. The energy takes the positive branch
    /// `E = sqrt(|p|² + m²)`.
    #[inline]
    #[must_use]
    pub fn from_mag_theta_phi(magnitude: f64, polar: f64, azimuthal: f64, mass: f64) -> Self {
        let (sin_theta, cos_theta) = polar.sin_cos();
        let (sin_phi, cos_phi) = azimuthal.sin_cos();
        let px = magnitude * sin_theta * cos_phi;
        let py = magnitude * sin_theta * sin_phi;
        let pz = magnitude * cos_theta;
        let p2 = px * px + py * py + pz * pz;
        Self {
            e: (p2 + mass * mass).sqrt(),
            px,
            py,
            pz,
        }
    }

    /// Energy component.
    #[inline]
    #[must_use]
    pub fn e(&self) -> f64 {
        self.e
    }

    #[inline]
    #[must_use]
    pub fn px(&self) -> f64 {
        self.px
    }

    #[inline]
    #[must_use]
    pub fn py(&self) -> f64 {
        self.py
    }

    #[inline]
    #[must_use]
    pub fn pz(&self) -> f64 {
        self.pz
    }

    /// Squared magnitude of the three-momentum.
    #[inline]
    #[must_use]
    pub fn momentum_mag2(&self) -> f64 {
        self.px * self.px + self.py * self.py + self.pz * self.pz
    }

    /// Invariant mass squared, `E² − |p|²`.
    #[inline]
    #[must_use]
    pub fn m2(&self) -> f64 {
        self.e * self.e - self.momentum_mag2()
    }

    /// Invariant mass. NaN when `m2()` is negative.
    #[inline]
    #[must_use]
    pub fn m(&self) -> f64 {
        self.m2().sqrt()
    }

    /// Components in `[E, px, py, pz]` order.
    #[inline]
    #[must_use]
    pub fn to_array(&self) -> [f64; 4] {
        [self.e, self.px, self.py, self.pz]
    }
}

impl Add for FourVector {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            e: self.e + rhs.e,
            px: self.px + rhs.px,
            py: self.py + rhs.py,
            pz: self.pz + rhs.pz,
        }
    }
}

impl AddAssign for FourVector {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for FourVector {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn on_shell_residual(v: &FourVector, mass: f64) -> f64 {
        let scale = v.e().powi(2).max(1.0);
        (v.m2() - mass * mass).abs() / scale
    }

    #[test]
    fn test_on_shell_over_grid() {
        let magnitudes = [0.0, 1e-6, 0.05, 0.3, 1.7, 12.0, 250.0];
        let angles = [-7.0, -PI, -1.0, 0.0, 0.4, FRAC_PI_2, PI, 4.0, 13.0];
        let masses = [0.0, 0.000_511, 0.139, 0.938, 5.0];

        for &mag in &magnitudes {
            for &theta in &angles {
                for &phi in &angles {
                    for &mass in &masses {
                        let v = FourVector::from_mag_theta_phi(mag, theta, phi, mass);
                        assert!(
                            on_shell_residual(&v, mass) < 1e-9,
                            "off shell for mag={mag} theta={theta} phi={phi} m={mass}: {v:?}"
                        );
                        assert!(v.e() >= 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_spherical_components() {
        let v = FourVector::from_mag_theta_phi(2.0, FRAC_PI_2, 0.0, 0.0);
        assert_abs_diff_eq!(v.px(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.py(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.pz(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.e(), 2.0, epsilon = 1e-12);

        let along_z = FourVector::from_mag_theta_phi(3.0, 0.0, 1.234, 4.0);
        assert_abs_diff_eq!(along_z.pz(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(along_z.e(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unnormalized_angles_are_periodic() {
        let a = FourVector::from_mag_theta_phi(0.7, 0.3, 0.9, 0.139);
        let b = FourVector::from_mag_theta_phi(0.7, 0.3 + 2.0 * PI, 0.9 - 4.0 * PI, 0.139);
        assert_abs_diff_eq!(a.px(), b.px(), epsilon = 1e-12);
        assert_abs_diff_eq!(a.py(), b.py(), epsilon = 1e-12);
        assert_abs_diff_eq!(a.pz(), b.pz(), epsilon = 1e-12);
        assert_abs_diff_eq!(a.e(), b.e(), epsilon = 1e-12);
    }

    #[test]
    fn test_particle_at_rest() {
        let v = FourVector::from_mag_theta_phi(0.0, 0.0, 0.0, 0.139);
        assert_eq!(v.e(), 0.139);
        assert_eq!(v.m(), 0.139);
    }

    #[test]
    fn test_addition_is_componentwise() {
        let a = FourVector::from_mag_theta_phi(0.4, 1.1, -0.5, 0.139);
        let b = FourVector::from_mag_theta_phi(0.9, 2.3, 2.9, 0.0);
        let sum = a + b;
        assert_eq!(sum.e(), a.e() + b.e());
        assert_eq!(sum.px(), a.px() + b.px());
        assert_eq!(sum.py(), a.py() + b.py());
        assert_eq!(sum.pz(), a.pz() + b.pz());

        let mut acc = a;
        acc += b;
        assert_eq!(acc, sum);
        assert_eq!([a, b].into_iter().sum::<FourVector>(), sum);
    }

    #[test]
    fn test_spacelike_mass_is_nan() {
        let v = FourVector::new(1.0, 2.0, 0.0, 0.0);
        assert!(v.m2() < 0.0);
        assert!(v.m().is_nan());
    }

    #[test]
    fn test_deterministic() {
        let a = FourVector::from_mag_theta_phi(0.31, 1.7, -2.2, 0.139);
        let b = FourVector::from_mag_theta_phi(0.31, 1.7, -2.2, 0.139);
        assert_eq!(a.to_array(), b.to_array());
    }
}
