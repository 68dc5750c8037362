//! # jetcloud
//!
//! Loading, preprocessing, and kinematic recomputation of particle-physics jet
//! point clouds, as used when evaluating generative jet models against
//! reference data.
//!
//! A jet is stored as a fixed-size, zero-padded sequence of constituents in
//! coordinates relative to the jet axis (`eta_rel`, `phi_rel`, and a
//! transverse momentum which may be a fraction of the jet's), paired with a
//! vector of jet-level features. The crate covers:
//!
//! * reading and writing jets in Parquet ([`read_parquet`], [`load_jetnet`],
//!   [`write_parquet`]),
//! * deriving the validity mask from the zero-padding convention
//!   ([`derive_mask`]),
//! * recomputing jet transverse momentum and invariant mass from the
//!   constituents ([`point_cloud_pt_and_mass`]),
//! * the log-squash momentum transform and its inverse ([`log_squash`],
//!   [`undo_log_squash`]).
//!
//! Model training, sampling, plotting, and metric tables are left to external
//! consumers; this crate is the data layer they share.
#![warn(clippy::perf, clippy::style)]

use thiserror::Error;

/// Methods for loading and manipulating jet point-cloud data.
pub mod data;
/// Reconstruction of jet kinematics from relative constituent coordinates.
pub mod kinematics;
/// The log-squash momentum transform and masked preprocessing helpers.
pub mod transforms;
/// Utility enums and vector types.
pub mod utils;

pub use crate::data::{
    derive_mask, Constituent, DatasetMetadata, JetData, JetDataset, JetItem, LoaderConfig,
};
pub use crate::data::{load_jetnet, read_parquet, write_parquet, WriteOptions};
pub use crate::kinematics::{point_cloud_pt_and_mass, recompute_jet_features, JetKinematics};
pub use crate::transforms::{log_squash, undo_log_squash};
pub use crate::utils::enums::{JetFeature, JetType, ParticleFeature, Split};
pub use crate::utils::vectors::{Vec3, Vec4};

/// The floating-point type used throughout the crate.
///
/// On-disk values are stored in single precision (the JetNet convention);
/// in-memory arithmetic is carried out in double precision.
pub type Float = f64;

pub type JetCloudResult<T> = Result<T, JetCloudError>;

/// The error type used by all `jetcloud` methods.
#[derive(Error, Debug)]
pub enum JetCloudError {
    /// An alias for [`std::io::Error`].
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
    /// An alias for [`parquet::errors::ParquetError`].
    #[error("Parquet Error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),
    /// An alias for [`arrow::error::ArrowError`].
    #[error("Arrow Error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),
    /// An alias for [`shellexpand::LookupError`].
    #[error("Failed to expand path: {0}")]
    LookupError(#[from] shellexpand::LookupError<std::env::VarError>),
    /// An error which occurs when the user tries to parse an invalid string of
    /// text, typically into an enum variant.
    #[error("Failed to parse string: \"{name}\" does not correspond to a valid \"{object}\"!")]
    ParseError {
        /// The string which was parsed
        name: String,
        /// The name of the object it failed to parse into
        object: String,
    },
    /// A requested feature has no corresponding column in the source schema.
    #[error("No {category} named \"{name}\" in the source data!")]
    UnknownName {
        /// The kind of name which failed lookup
        category: &'static str,
        /// The name which failed lookup
        name: String,
    },
    /// The same feature was requested twice.
    #[error("The {category} \"{name}\" was requested more than once!")]
    DuplicateName {
        /// The kind of name which was duplicated
        category: &'static str,
        /// The duplicated name
        name: String,
    },
    /// A collection did not have the expected length.
    #[error("{context}: expected length {expected}, got {actual}")]
    LengthMismatch {
        /// Description of the collection being checked
        context: String,
        /// The expected length
        expected: usize,
        /// The observed length
        actual: usize,
    },
    /// A custom fallback error for errors too complex or too infrequent to
    /// warrant their own error category.
    #[error("{0}")]
    Custom(String),
}
