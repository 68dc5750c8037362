//! The log-squash momentum transform and masked preprocessing helpers.
//!
//! Transverse-momentum spectra are heavy-tailed, which is numerically awkward
//! for generative modelling. `log_squash` compresses them with a signed
//! logarithm that is exactly zero at zero and strictly increasing, so the
//! zero-padding convention of fixed-size point clouds survives the transform.
//! All functions here are stateless.

use crate::data::Constituent;
use crate::Float;

/// Map a momentum to the signed-log domain: $`\mathrm{sign}(x)\ln(|x| + 1)`$.
///
/// Behaves like the identity near zero and like a logarithm for large
/// magnitudes. `log_squash(0.0)` is exactly `0.0`.
pub fn log_squash(x: Float) -> Float {
    x.signum() * (x.abs() + 1.0).ln()
}

/// The exact analytic inverse of [`log_squash`]:
/// $`\mathrm{sign}(y)(e^{|y|} - 1)`$.
pub fn undo_log_squash(y: Float) -> Float {
    y.signum() * (y.abs().exp() - 1.0)
}

/// Apply [`log_squash`] in place wherever the mask is true.
///
/// Masked-out entries are left untouched, so exact-zero padding stays exact
/// zero regardless of floating-point behaviour inside the transform.
pub fn log_squash_masked(values: &mut [Float], mask: &[bool]) {
    debug_assert_eq!(values.len(), mask.len());
    for (value, &valid) in values.iter_mut().zip(mask) {
        if valid {
            *value = log_squash(*value);
        }
    }
}

/// Apply [`undo_log_squash`] in place wherever the mask is true.
pub fn undo_log_squash_masked(values: &mut [Float], mask: &[bool]) {
    debug_assert_eq!(values.len(), mask.len());
    for (value, &valid) in values.iter_mut().zip(mask) {
        if valid {
            *value = undo_log_squash(*value);
        }
    }
}

/// Replace each valid constituent's fractional transverse momentum with the
/// log-squashed absolute value, `log_squash(pt_frac * jet_pt)`.
///
/// This is the loader-side preprocessing step; padded constituents keep their
/// zero momentum.
pub fn log_squash_pt(constituents: &mut [Constituent], jet_pt: Float, mask: &[bool]) {
    debug_assert_eq!(constituents.len(), mask.len());
    for (constituent, &valid) in constituents.iter_mut().zip(mask) {
        if valid {
            constituent.pt = log_squash(constituent.pt * jet_pt);
        }
    }
}

/// Undo [`log_squash_pt`] up to the jet-momentum scaling, leaving each valid
/// constituent with its absolute transverse momentum.
///
/// Used to post-process generated point clouds whose momentum channel was
/// modelled in the log-squash domain.
pub fn recover_absolute_pt(constituents: &mut [Constituent], mask: &[bool]) {
    debug_assert_eq!(constituents.len(), mask.len());
    for (constituent, &valid) in constituents.iter_mut().zip(mask) {
        if valid {
            constituent.pt = undo_log_squash(constituent.pt);
        }
    }
}

/// Fully undo [`log_squash_pt`], leaving each valid constituent with its
/// transverse momentum as a fraction of the jet's.
pub fn recover_fractional_pt(constituents: &mut [Constituent], jet_pt: Float, mask: &[bool]) {
    debug_assert_eq!(constituents.len(), mask.len());
    for (constituent, &valid) in constituents.iter_mut().zip(mask) {
        if valid {
            constituent.pt = undo_log_squash(constituent.pt) / jet_pt;
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::data::derive_mask;

    #[test]
    fn test_log_squash_zero_is_exact() {
        assert_eq!(log_squash(0.0), 0.0);
        assert_eq!(undo_log_squash(0.0), 0.0);
    }

    #[test]
    fn test_round_trip_law() {
        for x in [
            -1000.0, -57.3, -1.0, -0.37, -1e-9, 1e-9, 0.004, 0.5, 1.0, 42.0, 3000.0,
        ] {
            assert_relative_eq!(undo_log_squash(log_squash(x)), x, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_strictly_increasing() {
        let xs = [-100.0, -5.0, -0.1, 0.0, 1e-6, 0.3, 2.0, 80.0, 1e4];
        for pair in xs.windows(2) {
            assert!(log_squash(pair[0]) < log_squash(pair[1]));
        }
    }

    #[test]
    fn test_masked_application_preserves_padding() {
        let mut values = [0.5, 0.0, 2.0, 0.0];
        let mask = [true, false, true, false];
        log_squash_masked(&mut values, &mask);
        assert_eq!(values[1], 0.0);
        assert_eq!(values[3], 0.0);
        undo_log_squash_masked(&mut values, &mask);
        assert_relative_eq!(values[0], 0.5, max_relative = 1e-12);
        assert_relative_eq!(values[2], 2.0, max_relative = 1e-12);
        assert_eq!(values[1], 0.0);
        assert_eq!(values[3], 0.0);
    }

    #[test]
    fn test_pt_preprocessing_round_trip() {
        let jet_pt = 850.0;
        let mut constituents = vec![
            Constituent::new(0.1, -0.2, 0.6),
            Constituent::new(-0.05, 0.3, 0.4),
            Constituent::default(),
        ];
        let original = constituents.clone();
        let mask = derive_mask(&constituents);

        log_squash_pt(&mut constituents, jet_pt, &mask);
        assert_relative_eq!(constituents[0].pt, log_squash(0.6 * jet_pt));
        // Padding must survive the forward transform untouched.
        assert_eq!(constituents[2].pt, 0.0);

        recover_fractional_pt(&mut constituents, jet_pt, &mask);
        for (recovered, expected) in constituents.iter().zip(&original) {
            assert_relative_eq!(recovered.pt, expected.pt, max_relative = 1e-12);
        }
        assert_eq!(constituents[2].pt, 0.0);
    }

    #[test]
    fn test_recover_absolute_pt() {
        let mut constituents = vec![Constituent::new(0.0, 0.0, log_squash(123.0))];
        let mask = [true];
        recover_absolute_pt(&mut constituents, &mask);
        assert_relative_eq!(constituents[0].pt, 123.0, max_relative = 1e-12);
    }
}
