//! Reconstruction of jet-level kinematics from relative constituent
//! coordinates.
//!
//! Constituents are treated as massless and their four-momenta are rebuilt
//! from $`(\eta_\text{rel}, \phi_\text{rel}, p_T)`$ with the jet axis as the
//! reference direction, so the recomputed values are in the same units as the
//! stored constituent momenta (relative units when the momenta are fractions
//! of the jet $`p_T`$). Masked-out constituents contribute exactly zero.

use accurate::{sum::Klein, traits::*};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::data::{derive_mask, Constituent, DatasetMetadata, JetData};
use crate::utils::enums::JetFeature;
use crate::utils::vectors::Vec4;
use crate::Float;

/// The jet observables recomputed from a constituent point cloud.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JetKinematics {
    /// Total transverse momentum of the summed four-vector.
    pub pt: Float,
    /// Invariant mass of the summed four-vector. NaN when the reconstruction
    /// is non-physical (negative mass squared); this is never clipped.
    pub mass: Float,
}

/// Sum the masked constituent four-vectors and report the jet transverse
/// momentum and invariant mass.
///
/// An all-masked (fully padded) point cloud yields exactly `(0.0, 0.0)`.
pub fn point_cloud_pt_and_mass(constituents: &[Constituent], mask: &[bool]) -> JetKinematics {
    debug_assert_eq!(constituents.len(), mask.len());
    let p4s: Vec<Vec4> = constituents
        .iter()
        .zip(mask)
        .filter(|(_, &valid)| valid)
        .map(|(constituent, _)| constituent.p4())
        .collect();
    let px = p4s.iter().map(Vec4::px).sum_with_accumulator::<Klein<Float>>();
    let py = p4s.iter().map(Vec4::py).sum_with_accumulator::<Klein<Float>>();
    let pz = p4s.iter().map(Vec4::pz).sum_with_accumulator::<Klein<Float>>();
    let e = p4s.iter().map(Vec4::e).sum_with_accumulator::<Klein<Float>>();
    let total = Vec4::new(px, py, pz, e);
    JetKinematics {
        pt: total.pt(),
        mass: total.mag(),
    }
}

/// Overwrite the `pt` and `mass` jet-feature columns (whichever are present in
/// the metadata) with values recomputed from each jet's point cloud.
///
/// Jets whose feature columns contain neither `pt` nor `mass` are left
/// untouched.
pub fn recompute_jet_features(jets: &mut [JetData], metadata: &DatasetMetadata) {
    let pt_index = metadata.jet_feature_index(JetFeature::Pt);
    let mass_index = metadata.jet_feature_index(JetFeature::Mass);
    if pt_index.is_none() && mass_index.is_none() {
        return;
    }
    #[cfg(feature = "rayon")]
    jets.par_iter_mut()
        .for_each(|jet| overwrite_kinematics(jet, pt_index, mass_index));
    #[cfg(not(feature = "rayon"))]
    jets.iter_mut()
        .for_each(|jet| overwrite_kinematics(jet, pt_index, mass_index));
}

fn overwrite_kinematics(jet: &mut JetData, pt_index: Option<usize>, mass_index: Option<usize>) {
    let mask = derive_mask(&jet.constituents);
    let kinematics = point_cloud_pt_and_mass(&jet.constituents, &mask);
    if let Some(index) = pt_index {
        jet.features[index] = kinematics.pt;
    }
    if let Some(index) = mass_index {
        jet.features[index] = kinematics.mass;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_single_particle_on_axis() {
        // A lone massless constituent on the jet axis carries the whole jet pt
        // and zero invariant mass.
        let constituents = vec![Constituent::new(0.0, 0.0, 1.0)];
        let mask = [true];
        let kinematics = point_cloud_pt_and_mass(&constituents, &mask);
        assert_relative_eq!(kinematics.pt, 1.0);
        assert_relative_eq!(kinematics.mass, 0.0);
    }

    #[test]
    fn test_all_padded_cloud_is_zero() {
        let constituents = vec![Constituent::default(); 4];
        let mask = [false; 4];
        let kinematics = point_cloud_pt_and_mass(&constituents, &mask);
        assert_eq!(kinematics.pt, 0.0);
        assert_eq!(kinematics.mass, 0.0);
    }

    #[test]
    fn test_back_to_back_pair() {
        // Two equal massless constituents separated by pi in phi: transverse
        // momenta cancel and the pair mass is the total energy.
        let constituents = vec![
            Constituent::new(0.0, 0.0, 1.0),
            Constituent::new(0.0, std::f64::consts::PI, 1.0),
        ];
        let mask = [true, true];
        let kinematics = point_cloud_pt_and_mass(&constituents, &mask);
        assert_relative_eq!(kinematics.pt, 0.0, epsilon = 1e-12);
        assert_relative_eq!(kinematics.mass, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_masked_particles_contribute_nothing() {
        let constituents = vec![
            Constituent::new(0.1, 0.2, 0.7),
            Constituent::new(-0.4, 1.0, 5.0),
        ];
        let masked = point_cloud_pt_and_mass(&constituents, &[true, false]);
        let alone = point_cloud_pt_and_mass(&constituents[..1], &[true]);
        assert_relative_eq!(masked.pt, alone.pt);
        assert_relative_eq!(masked.mass, alone.mass);
    }

    #[test]
    fn test_recompute_overwrites_requested_columns() {
        let metadata = DatasetMetadata::new(
            vec![
                crate::ParticleFeature::EtaRel,
                crate::ParticleFeature::PhiRel,
                crate::ParticleFeature::PtRel,
            ],
            vec![JetFeature::Pt, JetFeature::Eta, JetFeature::Mass],
            2,
        )
        .unwrap();
        let mut jets = vec![JetData {
            constituents: vec![Constituent::new(0.0, 0.0, 1.0), Constituent::default()],
            features: vec![99.0, 0.5, 99.0],
            jet_pt: 1.0,
        }];
        recompute_jet_features(&mut jets, &metadata);
        assert_relative_eq!(jets[0].features[0], 1.0);
        // Eta is not recomputable from relative coordinates and must survive.
        assert_relative_eq!(jets[0].features[1], 0.5);
        assert_relative_eq!(jets[0].features[2], 0.0);
    }
}
