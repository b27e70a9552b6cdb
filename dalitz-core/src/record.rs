//! Raw event records and the reconstructed particle candidates they hold.

use crate::error::FieldAccessError;
use crate::four_vector::FourVector;
use crate::selection::{select, Selection};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Charged pion mass hypothesis (GeV).
pub const PION_MASS: f64 = 0.139;
/// Photon mass hypothesis (GeV).
pub const PHOTON_MASS: f64 = 0.0;

/// Read-only access to an event's named scalar fields.
pub trait EventRecord {
    /// Returns the value stored under `name`.
    ///
    /// # Errors
    /// Returns [`FieldAccessError`] if the field is absent or malformed.
    fn field(&self, name: &str) -> Result<f64, FieldAccessError>;
}

/// The four reconstructed particles of a π⁺ π⁻ γ γ event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Particle {
    /// Positive charged track (π⁺).
    PositiveTrack,
    /// Negative charged track (π⁻).
    NegativeTrack,
    /// First neutral cluster (γ1).
    Neutral1,
    /// Second neutral cluster (γ2).
    Neutral2,
}

impl Particle {
    /// All particles in record order.
    pub const ALL: [Particle; 4] = [
        Particle::PositiveTrack,
        Particle::NegativeTrack,
        Particle::Neutral1,
        Particle::Neutral2,
    ];

    /// The `(magnitude, polar, azimuthal)` field names of this particle.
    #[must_use]
    pub const fn field_names(self) -> [&'static str; 3] {
        match self {
            Particle::PositiveTrack => ["mag_plus_rec", "theta_plus_rec", "phi_plus_rec"],
            Particle::NegativeTrack => ["mag_neg_rec", "theta_neg_rec", "phi_neg_rec"],
            Particle::Neutral1 => ["mag_neutral1_rec", "theta_neutral1_rec", "phi_neutral1_rec"],
            Particle::Neutral2 => ["mag_neutral2_rec", "theta_neutral2_rec", "phi_neutral2_rec"],
        }
    }

    /// Mass hypothesis used to put the candidate on shell.
    #[must_use]
    pub const fn mass(self) -> f64 {
        match self {
            Particle::PositiveTrack | Particle::NegativeTrack => PION_MASS,
            Particle::Neutral1 | Particle::Neutral2 => PHOTON_MASS,
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Particle::PositiveTrack => "pi+",
            Particle::NegativeTrack => "pi-",
            Particle::Neutral1 => "gamma1",
            Particle::Neutral2 => "gamma2",
        }
    }

    /// Reads this particle's fields from `record` and builds its four-vector.
    ///
    /// # Errors
    /// Returns the first [`FieldAccessError`] encountered.
    pub fn four_vector<R: EventRecord + ?Sized>(self, record: &R) -> Result<FourVector, FieldAccessError> {
        let [mag, theta, phi] = self.field_names();
        Ok(FourVector::from_mag_theta_phi(
            record.field(mag)?,
            record.field(theta)?,
            record.field(phi)?,
            self.mass(),
        ))
    }
}

/// All twelve field names in record order.
#[must_use]
pub fn required_fields() -> Vec<&'static str> {
    Particle::ALL
        .iter()
        .flat_map(|particle| particle.field_names())
        .collect()
}

/// The four candidate four-vectors of one event.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventCandidates {
    pub pos_track: FourVector,
    pub neg_track: FourVector,
    pub neutral1: FourVector,
    pub neutral2: FourVector,
}

impl EventCandidates {
    /// Builds all four candidates from a raw record.
    ///
    /// # Errors
    /// Fails on the first missing or malformed field.
    pub fn from_record<R: EventRecord + ?Sized>(record: &R) -> Result<Self, FieldAccessError> {
        Ok(Self {
            pos_track: Particle::PositiveTrack.four_vector(record)?,
            neg_track: Particle::NegativeTrack.four_vector(record)?,
            neutral1: Particle::Neutral1.four_vector(record)?,
            neutral2: Particle::Neutral2.four_vector(record)?,
        })
    }

    /// Candidate for `particle`.
    #[must_use]
    pub fn get(&self, particle: Particle) -> FourVector {
        match particle {
            Particle::PositiveTrack => self.pos_track,
            Particle::NegativeTrack => self.neg_track,
            Particle::Neutral1 => self.neutral1,
            Particle::Neutral2 => self.neutral2,
        }
    }

    /// Runs the kinematic selection on these candidates.
    #[must_use]
    pub fn select(&self) -> Selection {
        select(self.pos_track, self.neg_track, self.neutral1, self.neutral2)
    }

    /// The sixteen components `E, px, py, pz` of π⁺, π⁻, γ1, γ2 in order.
    #[must_use]
    pub fn to_array(&self) -> [f64; 16] {
        let mut out = [0.0; 16];
        for (chunk, particle) in out.chunks_exact_mut(4).zip(Particle::ALL) {
            chunk.copy_from_slice(&self.get(particle).to_array());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapRecord(HashMap<&'static str, f64>);

    impl EventRecord for MapRecord {
        fn field(&self, name: &str) -> Result<f64, FieldAccessError> {
            self.0
                .get(name)
                .copied()
                .ok_or_else(|| FieldAccessError::Missing {
                    name: name.to_string(),
                })
        }
    }

    fn full_record() -> MapRecord {
        MapRecord(
            required_fields()
                .into_iter()
                .enumerate()
                .map(|(i, name)| (name, 0.1 * (i + 1) as f64))
                .collect(),
        )
    }

    #[test]
    fn test_required_fields_order() {
        let fields = required_fields();
        assert_eq!(fields.len(), 12);
        assert_eq!(fields[0], "mag_plus_rec");
        assert_eq!(fields[5], "phi_neg_rec");
        assert_eq!(fields[11], "phi_neutral2_rec");
    }

    #[test]
    fn test_mass_hypotheses() {
        assert_eq!(Particle::PositiveTrack.mass(), 0.139);
        assert_eq!(Particle::NegativeTrack.mass(), 0.139);
        assert_eq!(Particle::Neutral1.mass(), 0.0);
        assert_eq!(Particle::Neutral2.mass(), 0.0);
    }

    #[test]
    fn test_candidates_from_record() {
        let record = full_record();
        let candidates = EventCandidates::from_record(&record).unwrap();
        let field = |name| record.field(name).unwrap();
        let expected = FourVector::from_mag_theta_phi(
            field("mag_plus_rec"),
            field("theta_plus_rec"),
            field("phi_plus_rec"),
            PION_MASS,
        );
        assert_eq!(candidates.pos_track, expected);
        assert!(candidates.neutral2.m2().abs() < 1e-12);
    }

    #[test]
    fn test_missing_field_reported() {
        let mut record = full_record();
        record.0.remove("theta_neutral1_rec");
        let err = EventCandidates::from_record(&record).unwrap_err();
        assert_eq!(err.field_name(), "theta_neutral1_rec");
    }

    #[test]
    fn test_to_array_layout() {
        let candidates = EventCandidates::from_record(&full_record()).unwrap();
        let flat = candidates.to_array();
        assert_eq!(flat[0], candidates.pos_track.e());
        assert_eq!(flat[7], candidates.neg_track.pz());
        assert_eq!(flat[8], candidates.neutral1.e());
        assert_eq!(flat[15], candidates.neutral2.pz());
    }
}
