use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::JetCloudError;

/// The jet classes available in the JetNet datasets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JetType {
    /// Gluon-initiated jets.
    Gluon,
    /// Light-quark-initiated jets.
    LightQuark,
    /// Top-quark jets.
    Top,
    /// W-boson jets.
    WBoson,
    /// Z-boson jets.
    ZBoson,
}

impl JetType {
    /// The single-letter tag used in dataset file names.
    pub fn tag(&self) -> &'static str {
        match self {
            JetType::Gluon => "g",
            JetType::LightQuark => "q",
            JetType::Top => "t",
            JetType::WBoson => "w",
            JetType::ZBoson => "z",
        }
    }
}

impl Display for JetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for JetType {
    type Err = JetCloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "g" | "gluon" => Ok(Self::Gluon),
            "q" | "quark" | "lightquark" => Ok(Self::LightQuark),
            "t" | "top" => Ok(Self::Top),
            "w" | "wboson" => Ok(Self::WBoson),
            "z" | "zboson" => Ok(Self::ZBoson),
            _ => Err(JetCloudError::ParseError {
                name: s.to_string(),
                object: "JetType".to_string(),
            }),
        }
    }
}

/// A named slice of a dataset file, carved out by cumulative split fractions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Split {
    /// The training slice.
    Train,
    /// The validation slice.
    Valid,
    /// The test slice.
    Test,
    /// The whole file, ignoring split fractions.
    All,
}

impl Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Split::Train => write!(f, "train"),
            Split::Valid => write!(f, "valid"),
            Split::Test => write!(f, "test"),
            Split::All => write!(f, "all"),
        }
    }
}

impl FromStr for Split {
    type Err = JetCloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "train" | "training" => Ok(Self::Train),
            "valid" | "validation" | "val" => Ok(Self::Valid),
            "test" => Ok(Self::Test),
            "all" => Ok(Self::All),
            _ => Err(JetCloudError::ParseError {
                name: s.to_string(),
                object: "Split".to_string(),
            }),
        }
    }
}

/// Per-constituent features, expressed relative to the parent jet axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleFeature {
    /// Pseudorapidity offset from the jet axis.
    EtaRel,
    /// Azimuthal-angle offset from the jet axis.
    PhiRel,
    /// Transverse momentum as a fraction of the jet transverse momentum.
    PtRel,
}

impl ParticleFeature {
    /// The column name used for this feature in dataset files.
    pub fn column_name(&self) -> &'static str {
        match self {
            ParticleFeature::EtaRel => "etarel",
            ParticleFeature::PhiRel => "phirel",
            ParticleFeature::PtRel => "ptrel",
        }
    }
}

impl Display for ParticleFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

impl FromStr for ParticleFeature {
    type Err = JetCloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "etarel" | "eta_rel" => Ok(Self::EtaRel),
            "phirel" | "phi_rel" => Ok(Self::PhiRel),
            "ptrel" | "pt_rel" => Ok(Self::PtRel),
            _ => Err(JetCloudError::ParseError {
                name: s.to_string(),
                object: "ParticleFeature".to_string(),
            }),
        }
    }
}

/// High-level (per-jet) features.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JetFeature {
    /// Jet transverse momentum.
    Pt,
    /// Jet pseudorapidity.
    Eta,
    /// Jet invariant mass.
    Mass,
    /// Number of real (non-padding) constituents.
    NumParticles,
}

impl JetFeature {
    /// The column name used for this feature in dataset files.
    pub fn column_name(&self) -> &'static str {
        match self {
            JetFeature::Pt => "pt",
            JetFeature::Eta => "eta",
            JetFeature::Mass => "mass",
            JetFeature::NumParticles => "num_particles",
        }
    }
}

impl Display for JetFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

impl FromStr for JetFeature {
    type Err = JetCloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pt" => Ok(Self::Pt),
            "eta" => Ok(Self::Eta),
            "mass" | "m" => Ok(Self::Mass),
            "num_particles" | "nparticles" => Ok(Self::NumParticles),
            _ => Err(JetCloudError::ParseError {
                name: s.to_string(),
                object: "JetFeature".to_string(),
            }),
        }
    }
}
