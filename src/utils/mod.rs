/// Enumerations for jet types, dataset splits, and feature names.
pub mod enums;
/// Traits and newtypes which treat [`nalgebra`] vectors as three- and
/// four-momenta.
pub mod vectors;
