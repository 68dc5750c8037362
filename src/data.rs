use std::{fmt::Display, sync::Arc};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    utils::{
        enums::{JetFeature, JetType, ParticleFeature, Split},
        vectors::Vec4,
    },
    Float, JetCloudError, JetCloudResult,
};

/// Dataset I/O implementations and shared ingestion helpers.
pub mod io;

pub use io::{load_jetnet, read_parquet, write_parquet, WriteOptions};

/// One entry of a jet's point cloud, in coordinates relative to the jet axis.
///
/// A constituent whose features are all exactly zero is treated as padding;
/// genuine constituents are assumed never to be all-zero. The `pt` field may
/// hold either a fraction of the jet transverse momentum (the on-disk
/// convention) or an absolute or log-squashed value after preprocessing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Constituent {
    /// Pseudorapidity offset from the jet axis.
    pub eta_rel: Float,
    /// Azimuthal-angle offset from the jet axis.
    pub phi_rel: Float,
    /// Transverse momentum (fractional, absolute, or log-squashed).
    pub pt: Float,
}

impl Constituent {
    /// Construct a constituent from its relative coordinates.
    pub fn new(eta_rel: Float, phi_rel: Float, pt: Float) -> Self {
        Self {
            eta_rel,
            phi_rel,
            pt,
        }
    }

    /// Whether this slot is zero-padding rather than a real particle.
    pub fn is_padding(&self) -> bool {
        self.eta_rel == 0.0 && self.phi_rel == 0.0 && self.pt == 0.0
    }

    /// The massless four-momentum reconstructed from the relative coordinates,
    /// taking the jet axis as the reference direction.
    pub fn p4(&self) -> Vec4 {
        Vec4::massless_from_cylindrical(self.pt, self.eta_rel, self.phi_rel)
    }
}

/// Derive the validity mask of a fixed-size constituent sequence.
///
/// An entry is true iff not all features at that position are exactly zero.
/// This is pure and idempotent. A genuine particle with all features exactly
/// zero is indistinguishable from padding and will be masked out; this is an
/// accepted approximation of the storage convention, not something to repair
/// downstream.
pub fn derive_mask(constituents: &[Constituent]) -> Vec<bool> {
    constituents.iter().map(|c| !c.is_padding()).collect()
}

/// A single jet: its padded constituent sequence, jet-level feature vector,
/// and the reference transverse momentum used to undo preprocessing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JetData {
    /// Fixed-size, zero-padded constituent sequence.
    pub constituents: Vec<Constituent>,
    /// Jet-level features, aligned with the dataset metadata.
    pub features: Vec<Float>,
    /// The jet transverse momentum as stored on disk, kept separately so the
    /// fractional-to-absolute momentum conversion stays invertible even after
    /// the feature columns are overwritten.
    pub jet_pt: Float,
}

impl Display for JetData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Jet:")?;
        writeln!(f, "  constituents:")?;
        for constituent in &self.constituents {
            writeln!(
                f,
                "    ({:.5}, {:.5}, {:.5})",
                constituent.eta_rel, constituent.phi_rel, constituent.pt
            )?;
        }
        writeln!(f, "  features:")?;
        for (idx, value) in self.features.iter().enumerate() {
            writeln!(f, "    feature[{idx}]: {value}")?;
        }
        writeln!(f, "  jet_pt:")?;
        writeln!(f, "    {}", self.jet_pt)?;
        Ok(())
    }
}

/// Which features a dataset carries and how they map onto storage columns.
#[derive(Clone, Debug)]
pub struct DatasetMetadata {
    pub(crate) particle_features: Vec<ParticleFeature>,
    pub(crate) jet_features: Vec<JetFeature>,
    pub(crate) jet_lookup: IndexMap<JetFeature, usize>,
    pub(crate) num_particles: usize,
}

impl DatasetMetadata {
    /// Construct metadata from explicit feature lists and the padded
    /// constituent count.
    pub fn new(
        particle_features: Vec<ParticleFeature>,
        jet_features: Vec<JetFeature>,
        num_particles: usize,
    ) -> JetCloudResult<Self> {
        let mut seen = IndexMap::with_capacity(particle_features.len());
        for (idx, feature) in particle_features.iter().enumerate() {
            if seen.insert(*feature, idx).is_some() {
                return Err(JetCloudError::DuplicateName {
                    category: "particle feature",
                    name: feature.column_name().to_string(),
                });
            }
        }
        let mut jet_lookup = IndexMap::with_capacity(jet_features.len());
        for (idx, feature) in jet_features.iter().enumerate() {
            if jet_lookup.insert(*feature, idx).is_some() {
                return Err(JetCloudError::DuplicateName {
                    category: "jet feature",
                    name: feature.column_name().to_string(),
                });
            }
        }
        Ok(Self {
            particle_features,
            jet_features,
            jet_lookup,
            num_particles,
        })
    }

    /// Requested per-constituent features in declaration order.
    pub fn particle_features(&self) -> &[ParticleFeature] {
        &self.particle_features
    }

    /// Requested jet-level features in declaration order.
    pub fn jet_features(&self) -> &[JetFeature] {
        &self.jet_features
    }

    /// The fixed (padded) constituent count per jet.
    pub fn num_particles(&self) -> usize {
        self.num_particles
    }

    /// Resolve the column index of a jet feature.
    pub fn jet_feature_index(&self, feature: JetFeature) -> Option<usize> {
        self.jet_lookup.get(&feature).copied()
    }
}

/// Validated configuration for loading a jet point-cloud dataset.
///
/// This replaces the loosely-typed option dictionaries of older evaluation
/// scripts: every field is named, typed, and has a documented default.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Directory holding one columnar file per jet type.
    pub data_dir: String,
    /// Which jet class to load.
    pub jet_type: JetType,
    /// Which slice of the file to load.
    pub split: Split,
    /// Fractions of the file given to the train/valid/test splits, in order.
    pub split_fraction: [f64; 3],
    /// Per-constituent features to read.
    pub particle_features: Vec<ParticleFeature>,
    /// Jet-level features to read.
    pub jet_features: Vec<JetFeature>,
    /// Padded constituent count; stored clouds are truncated to this length.
    pub num_particles: usize,
    /// Optional cap on the number of jets; `None` loads the whole split.
    pub n_jets: Option<usize>,
    /// Whether per-item access exposes the jet feature vector (`false` yields
    /// an empty context vector).
    pub high_as_context: bool,
    /// Replace the fractional constituent momentum with
    /// `log_squash(pt_frac * jet_pt)` at load time.
    pub log_squash_pt: bool,
    /// Recompute the `pt` and `mass` jet features from the point cloud,
    /// overwriting the stored columns.
    pub recalculate_jet_from_pc: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            jet_type: JetType::Top,
            split: Split::Train,
            split_fraction: [0.7, 0.15, 0.15],
            particle_features: vec![
                ParticleFeature::EtaRel,
                ParticleFeature::PhiRel,
                ParticleFeature::PtRel,
            ],
            jet_features: vec![JetFeature::Pt, JetFeature::Eta, JetFeature::Mass],
            num_particles: 30,
            n_jets: None,
            high_as_context: true,
            log_squash_pt: false,
            recalculate_jet_from_pc: true,
        }
    }
}

/// One item of a [`JetDataset`], handed out as freshly copied buffers.
///
/// Consumers (batching, augmentation, device upload) may mutate these freely
/// without touching the dataset's backing storage.
#[derive(Clone, Debug)]
pub struct JetItem {
    /// The jet's padded constituent sequence.
    pub constituents: Vec<Constituent>,
    /// Validity mask derived from the zero-padding convention.
    pub mask: Vec<bool>,
    /// Jet-level context features; empty when the dataset was loaded with
    /// `high_as_context = false`.
    pub features: Vec<Float>,
    /// The stored jet transverse momentum.
    pub jet_pt: Float,
}

/// An immutable collection of jets with shared feature metadata.
///
/// Backing storage is never mutated after construction, so item access is
/// safe to call concurrently from multiple readers.
#[derive(Clone, Debug)]
pub struct JetDataset {
    jets: Vec<Arc<JetData>>,
    metadata: Arc<DatasetMetadata>,
    high_as_context: bool,
}

impl JetDataset {
    /// Create a dataset from loaded jets, validating that every jet matches
    /// the metadata's shapes.
    pub fn new(
        jets: Vec<JetData>,
        metadata: Arc<DatasetMetadata>,
        high_as_context: bool,
    ) -> JetCloudResult<Self> {
        for (index, jet) in jets.iter().enumerate() {
            if jet.constituents.len() != metadata.num_particles {
                return Err(JetCloudError::LengthMismatch {
                    context: format!("Constituent sequence of jet {index}"),
                    expected: metadata.num_particles,
                    actual: jet.constituents.len(),
                });
            }
            if jet.features.len() != metadata.jet_features.len() {
                return Err(JetCloudError::LengthMismatch {
                    context: format!("Feature vector of jet {index}"),
                    expected: metadata.jet_features.len(),
                    actual: jet.features.len(),
                });
            }
        }
        Ok(Self {
            jets: jets.into_iter().map(Arc::new).collect(),
            metadata,
            high_as_context,
        })
    }

    /// The number of jets in the dataset.
    pub fn n_jets(&self) -> usize {
        self.jets.len()
    }

    /// Whether the dataset holds no jets.
    pub fn is_empty(&self) -> bool {
        self.jets.is_empty()
    }

    /// Borrow the dataset metadata.
    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    /// Clone the internal metadata handle.
    pub fn metadata_arc(&self) -> Arc<DatasetMetadata> {
        self.metadata.clone()
    }

    /// Borrow the stored jets.
    pub fn jets(&self) -> &[Arc<JetData>] {
        &self.jets
    }

    /// Retrieve a jet by index, returning `None` when out of range.
    pub fn get_jet(&self, index: usize) -> Option<Arc<JetData>> {
        self.jets.get(index).cloned()
    }

    /// Retrieve a jet by index.
    pub fn jet(&self, index: usize) -> JetCloudResult<Arc<JetData>> {
        self.get_jet(index).ok_or_else(|| {
            JetCloudError::Custom(format!(
                "Dataset index out of bounds: index {index}, length {}",
                self.n_jets()
            ))
        })
    }

    /// Retrieve a training/evaluation item by index, returning `None` when
    /// out of range.
    ///
    /// The mask is derived on demand; both preprocessing transforms map exact
    /// zero to exact zero, so the derivation matches the mask used at load
    /// time.
    pub fn get_item(&self, index: usize) -> Option<JetItem> {
        let jet = self.jets.get(index)?;
        Some(JetItem {
            constituents: jet.constituents.clone(),
            mask: derive_mask(&jet.constituents),
            features: if self.high_as_context {
                jet.features.clone()
            } else {
                Vec::new()
            },
            jet_pt: jet.jet_pt,
        })
    }

    /// Retrieve a training/evaluation item by index.
    pub fn item(&self, index: usize) -> JetCloudResult<JetItem> {
        self.get_item(index).ok_or_else(|| {
            JetCloudError::Custom(format!(
                "Dataset index out of bounds: index {index}, length {}",
                self.n_jets()
            ))
        })
    }

    /// Iterate over all items in index order.
    pub fn items(&self) -> impl Iterator<Item = JetItem> + '_ {
        (0..self.n_jets()).filter_map(|index| self.get_item(index))
    }

    /// Generate a new dataset of the same length by resampling jets with
    /// replacement. Used to attach bootstrap uncertainties to evaluation
    /// metrics.
    pub fn bootstrap(&self, seed: usize) -> JetDataset {
        let mut rng = fastrand::Rng::with_seed(seed as u64);
        let n = self.n_jets();
        let mut indices: Vec<usize> = (0..n).map(|_| rng.usize(0..n)).collect();
        indices.sort_unstable();
        JetDataset {
            jets: indices.into_iter().map(|idx| self.jets[idx].clone()).collect(),
            metadata: self.metadata.clone(),
            high_as_context: self.high_as_context,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    pub(crate) fn test_metadata() -> Arc<DatasetMetadata> {
        Arc::new(
            DatasetMetadata::new(
                vec![
                    ParticleFeature::EtaRel,
                    ParticleFeature::PhiRel,
                    ParticleFeature::PtRel,
                ],
                vec![JetFeature::Pt, JetFeature::Mass],
                3,
            )
            .expect("Test metadata should be valid"),
        )
    }

    fn test_jets() -> Vec<JetData> {
        vec![
            JetData {
                constituents: vec![
                    Constituent::new(0.1, 0.2, 0.5),
                    Constituent::new(-0.3, 0.1, 0.5),
                    Constituent::default(),
                ],
                features: vec![900.0, 80.0],
                jet_pt: 900.0,
            },
            JetData {
                constituents: vec![
                    Constituent::new(0.0, 0.0, 0.25),
                    Constituent::new(0.2, -0.1, 0.5),
                    Constituent::new(-0.1, 0.05, 0.25),
                ],
                features: vec![650.0, 30.0],
                jet_pt: 650.0,
            },
        ]
    }

    #[test]
    fn test_mask_derivation_scenario() {
        let jets = test_jets();
        assert_eq!(derive_mask(&jets[0].constituents), vec![true, true, false]);
        assert_eq!(derive_mask(&jets[1].constituents), vec![true, true, true]);
    }

    #[test]
    fn test_mask_derivation_is_idempotent() {
        let jets = test_jets();
        let first = derive_mask(&jets[0].constituents);
        let second = derive_mask(&jets[0].constituents);
        assert_eq!(first, second);
    }

    #[test]
    fn test_genuine_zero_particle_is_masked_as_padding() {
        // Known edge condition: a real particle with all features exactly zero
        // cannot be told apart from padding under the storage convention.
        let constituents = vec![Constituent::new(0.0, 0.0, 0.0)];
        assert_eq!(derive_mask(&constituents), vec![false]);
    }

    #[test]
    fn test_partially_zero_particle_is_valid() {
        let constituents = vec![
            Constituent::new(0.0, 0.0, 0.25),
            Constituent::new(0.1, 0.0, 0.0),
        ];
        assert_eq!(derive_mask(&constituents), vec![true, true]);
    }

    #[test]
    fn test_metadata_rejects_duplicates() {
        let result = DatasetMetadata::new(
            vec![ParticleFeature::EtaRel, ParticleFeature::EtaRel],
            vec![],
            3,
        );
        assert!(matches!(
            result,
            Err(JetCloudError::DuplicateName { .. })
        ));
        let result = DatasetMetadata::new(vec![], vec![JetFeature::Pt, JetFeature::Pt], 3);
        assert!(matches!(
            result,
            Err(JetCloudError::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_dataset_rejects_ragged_jets() {
        let metadata = test_metadata();
        let mut jets = test_jets();
        jets[1].constituents.pop();
        assert!(matches!(
            JetDataset::new(jets, metadata.clone(), true),
            Err(JetCloudError::LengthMismatch { .. })
        ));
        let mut jets = test_jets();
        jets[0].features.push(1.0);
        assert!(matches!(
            JetDataset::new(jets, metadata, true),
            Err(JetCloudError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_item_access_returns_copies() {
        let dataset = JetDataset::new(test_jets(), test_metadata(), true).unwrap();
        let mut item = dataset.item(0).unwrap();
        item.constituents[0].pt = 99.0;
        item.features[0] = -1.0;
        let again = dataset.item(0).unwrap();
        assert_relative_eq!(again.constituents[0].pt, 0.5);
        assert_relative_eq!(again.features[0], 900.0);
        assert_eq!(again.mask, vec![true, true, false]);
        assert_relative_eq!(again.jet_pt, 900.0);
    }

    #[test]
    fn test_item_without_context_features() {
        let dataset = JetDataset::new(test_jets(), test_metadata(), false).unwrap();
        let item = dataset.item(1).unwrap();
        assert!(item.features.is_empty());
        assert_eq!(item.constituents.len(), 3);
    }

    #[test]
    fn test_item_out_of_bounds_is_error() {
        let dataset = JetDataset::new(test_jets(), test_metadata(), true).unwrap();
        assert!(dataset.item(99).is_err());
        assert!(dataset.get_item(99).is_none());
        assert!(dataset.jet(99).is_err());
    }

    #[test]
    fn test_bootstrap_is_seeded_and_length_preserving() {
        let dataset = JetDataset::new(test_jets(), test_metadata(), true).unwrap();
        let first = dataset.bootstrap(42);
        let second = dataset.bootstrap(42);
        assert_eq!(first.n_jets(), dataset.n_jets());
        for (a, b) in first.jets().iter().zip(second.jets()) {
            assert!(Arc::ptr_eq(a, b));
        }

        let empty = JetDataset::new(Vec::new(), test_metadata(), true).unwrap();
        assert_eq!(empty.bootstrap(7).n_jets(), 0);
    }

    #[test]
    fn test_jet_display() {
        let jets = test_jets();
        let display_string = format!("{}", jets[0]);
        assert!(display_string.contains("Jet:"));
        assert!(display_string.contains("constituents:"));
        assert!(display_string.contains("feature[0]: 900"));
        assert!(display_string.contains("jet_pt:"));
    }
}
