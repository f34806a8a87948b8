use std::fmt;
use serde::{Deserialize, Serialize};
use strum::EnumString;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "PascalCase")]
pub enum PetColor {
    NeonBlue, CrimsonRed, AuroraPurple, CyberYellow,
    PrismGold, LiquidChrome, VoidOpal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "PascalCase")]
pub enum PetAura {
    Smoke, Sparks, Halo, Glitch,
    Radiant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "PascalCase")]
pub enum PetEyes {
    GlitchGreen, LaserPink, Chrome, Void,
    MoltenGold, Supernova,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "PascalCase")]
pub enum PetPattern {
    None, Stripes, Spots, Circuit,
    Holographic,
}

impl PetColor {
    pub const NORMAL: &'static [Self] =
        &[Self::NeonBlue, Self::CrimsonRed, Self::AuroraPurple, Self::CyberYellow];
    pub const SHINY: &'static [Self] =
        &[Self::PrismGold, Self::LiquidChrome, Self::VoidOpal];

    pub const fn description(&self) -> &'static str {
        match self {
            Self::NeonBlue => "Neon Blue", Self::CrimsonRed => "Crimson Red",
            Self::AuroraPurple => "Aurora Purple", Self::CyberYellow => "Cyber Yellow",
            Self::PrismGold => "Prism Gold", Self::LiquidChrome => "Liquid Chrome",
            Self::VoidOpal => "Void Opal",
        }
    }
}

impl PetAura {
    pub const NORMAL: &'static [Self] =
        &[Self::Smoke, Self::Sparks, Self::Halo, Self::Glitch];
    /// Every shiny pet carries the same distinguished aura.
    pub const SHINY_FIXED: Self = Self::Radiant;

    pub const fn description(&self) -> &'static str {
        match self {
            Self::Smoke => "Smoke", Self::Sparks => "Sparks",
            Self::Halo => "Halo", Self::Glitch => "Glitch",
            Self::Radiant => "Radiant",
        }
    }
}

impl PetEyes {
    pub const NORMAL: &'static [Self] =
        &[Self::GlitchGreen, Self::LaserPink, Self::Chrome, Self::Void];
    pub const SHINY: &'static [Self] = &[Self::MoltenGold, Self::Supernova];

    pub const fn description(&self) -> &'static str {
        match self {
            Self::GlitchGreen => "Glitch Green", Self::LaserPink => "Laser Pink",
            Self::Chrome => "Chrome", Self::Void => "Void",
            Self::MoltenGold => "Molten Gold", Self::Supernova => "Supernova",
        }
    }
}

impl PetPattern {
    pub const NORMAL: &'static [Self] =
        &[Self::None, Self::Stripes, Self::Spots, Self::Circuit];
    /// Every shiny pet carries the same distinguished pattern.
    pub const SHINY_FIXED: Self = Self::Holographic;

    pub const fn description(&self) -> &'static str {
        match self {
            Self::None => "None", Self::Stripes => "Stripes",
            Self::Spots => "Spots", Self::Circuit => "Circuit",
            Self::Holographic => "Holographic",
        }
    }
}

macro_rules! impl_display {
    ($type:ty) => {
        impl fmt::Display for $type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:?}", self)
            }
        }
    }
}

impl_display!(PetColor);
impl_display!(PetAura);
impl_display!(PetEyes);
impl_display!(PetPattern);

/// The full cosmetic loadout of one pet, one value per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitSet {
    pub color: PetColor,
    pub aura: PetAura,
    pub eyes: PetEyes,
    pub pattern: PetPattern,
}

impl TraitSet {
    /// One-line listing used in hatch announcements.
    pub fn summary(&self) -> String {
        format!(
            "color: {}; aura: {}; eyes: {}; pattern: {}",
            self.color.description(),
            self.aura.description(),
            self.eyes.description(),
            self.pattern.description(),
        )
    }
}
