//! Kinematic selection for π⁺ π⁻ γ γ events.
//!
//! The selector forms the neutral-pion candidate from the two photons,
//! computes the three Dalitz invariants and tests the event against a fixed
//! acceptance window. Square roots of negative invariants produce NaN, and
//! NaN fails every comparison, so such events are rejected rather than
//! aborting the run.

use crate::four_vector::FourVector;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fixed kinematic acceptance window (GeV).
#[derive(Debug, Clone, Copy)]
pub struct AcceptanceWindow;

impl AcceptanceWindow {
    /// Lower bound on the π⁺π⁻ invariant mass.
    pub const MIN_CHARGED_PAIR_MASS: f64 = 0.278;
    /// Lower bound on the γγ invariant mass.
    pub const MIN_NEUTRAL_PAIR_MASS: f64 = 0.08;
    /// Upper bound on the γγ invariant mass.
    pub const MAX_NEUTRAL_PAIR_MASS: f64 = 0.15;

    /// Inclusive window test on the charged-pair and neutral-pair masses.
    #[inline]
    #[must_use]
    pub fn contains(m_pos_neg: f64, m_pi0: f64) -> bool {
        m_pos_neg >= Self::MIN_CHARGED_PAIR_MASS
            && m_pi0 >= Self::MIN_NEUTRAL_PAIR_MASS
            && m_pi0 <= Self::MAX_NEUTRAL_PAIR_MASS
    }
}

/// One row of the feature matrix: `[s_pos_neg, s_pos_pi0, s_neg_pi0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObservableTriple {
    pub s_pos_neg: f64,
    pub s_pos_pi0: f64,
    pub s_neg_pi0: f64,
}

impl ObservableTriple {
    /// Column names in matrix order.
    pub const COLUMNS: [&'static str; 3] = ["s_pos_neg", "s_pos_pi0", "s_neg_pi0"];

    #[inline]
    #[must_use]
    pub fn to_array(&self) -> [f64; 3] {
        [self.s_pos_neg, self.s_pos_pi0, self.s_neg_pi0]
    }
}

/// Outcome of the selector for one event.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Selection {
    /// Invariant mass squared of π⁺ + π⁻.
    pub s_pos_neg: f64,
    /// Invariant mass squared of π⁺ + (γ1 + γ2).
    pub s_pos_pi0: f64,
    /// Invariant mass squared of π⁻ + (γ1 + γ2).
    pub s_neg_pi0: f64,
    /// Invariant mass of γ1 + γ2; used only for the window test.
    pub m_pi0: f64,
    /// Whether the event lies inside the acceptance window.
    pub passes: bool,
}

impl Selection {
    /// The three observables that go into the feature matrix.
    #[inline]
    #[must_use]
    pub fn observables(&self) -> ObservableTriple {
        ObservableTriple {
            s_pos_neg: self.s_pos_neg,
            s_pos_pi0: self.s_pos_pi0,
            s_neg_pi0: self.s_neg_pi0,
        }
    }

    /// Observables for passing events, `None` otherwise.
    #[inline]
    #[must_use]
    pub fn accepted(&self) -> Option<ObservableTriple> {
        self.passes.then(|| self.observables())
    }

    /// False when either mass radicand was negative (or NaN came in).
    #[inline]
    #[must_use]
    pub fn is_physical(&self) -> bool {
        self.s_pos_neg >= 0.0 && !self.m_pi0.is_nan()
    }
}

/// Runs the kinematic selection on one event's four candidates.
#[must_use]
pub fn select(
    pos_track: FourVector,
    neg_track: FourVector,
    neutral1: FourVector,
    neutral2: FourVector,
) -> Selection {
    let pi0 = neutral1 + neutral2;

    let s_pos_neg = (pos_track + neg_track).m2();
    let s_pos_pi0 = (pos_track + pi0).m2();
    let s_neg_pi0 = (neg_track + pi0).m2();
    let m_pi0 = pi0.m();

    Selection {
        s_pos_neg,
        s_pos_pi0,
        s_neg_pi0,
        m_pi0,
        passes: AcceptanceWindow::contains(s_pos_neg.sqrt(), m_pi0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn at_rest(mass: f64) -> FourVector {
        FourVector::new(mass, 0.0, 0.0, 0.0)
    }

    #[test]
    fn test_window_is_inclusive() {
        assert!(AcceptanceWindow::contains(0.278, 0.08));
        assert!(AcceptanceWindow::contains(0.278, 0.15));
        assert!(AcceptanceWindow::contains(0.5, 0.135));

        assert!(!AcceptanceWindow::contains(0.278 - 1e-12, 0.135));
        assert!(!AcceptanceWindow::contains(0.5, 0.08 - 1e-12));
        assert!(!AcceptanceWindow::contains(0.5, 0.15 + 1e-12));
        assert!(!AcceptanceWindow::contains(f64::NAN, 0.135));
        assert!(!AcceptanceWindow::contains(0.5, f64::NAN));
    }

    #[test]
    fn test_boundary_events_pass() {
        // Pions at rest sum to exactly 0.278 GeV; photons at rest sum to the window edges.
        let pos = at_rest(0.139);
        let neg = at_rest(0.139);

        let low = select(pos, neg, at_rest(0.04), at_rest(0.04));
        assert_eq!(low.s_pos_neg.sqrt(), 0.278);
        assert_eq!(low.m_pi0, 0.08);
        assert!(low.passes);

        let high = select(pos, neg, at_rest(0.075), at_rest(0.075));
        assert_eq!(high.m_pi0, 0.15);
        assert!(high.passes);
    }

    #[test]
    fn test_just_outside_boundaries_fail() {
        let pos = at_rest(0.139);
        let neg = at_rest(0.139);
        let eps = 1e-9;

        let below_charged = select(at_rest(0.139 - eps), neg, at_rest(0.05), at_rest(0.05));
        assert!(!below_charged.passes);

        let below_neutral = select(pos, neg, at_rest(0.04 - eps), at_rest(0.04));
        assert!(!below_neutral.passes);

        let above_neutral = select(pos, neg, at_rest(0.075 + eps), at_rest(0.075));
        assert!(!above_neutral.passes);
    }

    #[test]
    fn test_invariants_match_formulae() {
        let pos = FourVector::from_mag_theta_phi(0.42, 1.2, 0.3, 0.139);
        let neg = FourVector::from_mag_theta_phi(0.37, 2.0, -2.5, 0.139);
        let g1 = FourVector::from_mag_theta_phi(0.21, 0.8, 1.9, 0.0);
        let g2 = FourVector::from_mag_theta_phi(0.11, 1.6, 2.4, 0.0);

        let sel = select(pos, neg, g1, g2);
        let pi0 = g1 + g2;
        assert_abs_diff_eq!(sel.s_pos_neg, (pos + neg).m2(), epsilon = 1e-15);
        assert_abs_diff_eq!(sel.s_pos_pi0, (pos + pi0).m2(), epsilon = 1e-15);
        assert_abs_diff_eq!(sel.s_neg_pi0, (neg + pi0).m2(), epsilon = 1e-15);
        assert_abs_diff_eq!(sel.m_pi0, pi0.m(), epsilon = 1e-15);
    }

    #[test]
    fn test_neutral_swap_symmetry() {
        let pos = FourVector::from_mag_theta_phi(0.42, 1.2, 0.3, 0.139);
        let neg = FourVector::from_mag_theta_phi(0.37, 2.0, -2.5, 0.139);
        let g1 = FourVector::from_mag_theta_phi(0.21, 0.8, 1.9, 0.0);
        let g2 = FourVector::from_mag_theta_phi(0.11, 1.6, 2.4, 0.0);

        let a = select(pos, neg, g1, g2);
        let b = select(pos, neg, g2, g1);
        assert_eq!(a.s_pos_pi0, b.s_pos_pi0);
        assert_eq!(a.s_neg_pi0, b.s_neg_pi0);
        assert_eq!(a.m_pi0, b.m_pi0);
        assert_eq!(a.passes, b.passes);
    }

    #[test]
    fn test_negative_radicand_rejects_without_panic() {
        let spacelike = FourVector::new(0.01, 0.5, 0.0, 0.0);
        let sel = select(at_rest(0.139), at_rest(0.139), spacelike, at_rest(0.0));
        assert!(sel.m_pi0.is_nan());
        assert!(!sel.passes);
        assert!(!sel.is_physical());
        assert!(sel.accepted().is_none());
    }

    #[test]
    fn test_accepted_returns_observables() {
        let sel = select(at_rest(0.2), at_rest(0.2), at_rest(0.06), at_rest(0.06));
        assert!(sel.passes);
        let row = sel.accepted().unwrap();
        assert_eq!(row.to_array(), [sel.s_pos_neg, sel.s_pos_pi0, sel.s_neg_pi0]);
    }
}
