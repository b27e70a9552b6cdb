//! dalitz-core: Core types for kinematic feature extraction.
//!
//! This crate provides the four-vector constructor, the raw event record
//! capability, the π⁺ π⁻ γ γ kinematic selector and the feature matrix
//! that accumulates accepted events.
//!

pub mod columns;
pub mod error;
pub mod features;
pub mod four_vector;
pub mod record;
pub mod selection;
pub mod source;

pub use columns::{ColumnRow, EventColumns};
pub use error::{Error, FieldAccessError, Result};
pub use features::{FeatureMatrix, FEATURE_COLUMNS};
pub use four_vector::FourVector;
pub use record::{required_fields, EventCandidates, EventRecord, Particle, PHOTON_MASS, PION_MASS};
pub use selection::{select, AcceptanceWindow, ObservableTriple, Selection};
pub use source::EventSource;
