use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::constants::SHINY_RATE;
use crate::palettes::{PetAura, PetColor, PetEyes, PetPattern, TraitSet};

/// The egg fields that feed a roll. Rolling only ever reads this snapshot,
/// so two calls with equal snapshots produce byte-identical pets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EggSnapshot {
    pub id: Uuid,
    pub owner_id: i64,
    pub species: String,
    pub seed: Option<String>,
    pub hatch_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolledPet {
    pub is_shiny: bool,
    pub traits: TraitSet,
}

#[derive(Debug, thiserror::Error)]
pub enum RollError {
    #[error("egg snapshot has no usable {field}")]
    Malformed { field: &'static str },
}

/// Roll the pet for an egg.
///
/// The stream is seeded from the egg's own seed when one was set, otherwise
/// from the canonical `id:owner:hatch_at` string. Draw order is fixed: the
/// first draw decides shininess, then color, aura, eyes and pattern follow in
/// that order. Shiny pets skip the aura and pattern draws (those collapse to
/// fixed shiny values) and take color and eyes from the shiny-only palettes.
pub fn roll_pet_from_egg(egg: &EggSnapshot) -> Result<RolledPet, RollError> {
    if egg.id.is_nil() {
        return Err(RollError::Malformed { field: "id" });
    }
    if egg.owner_id == 0 {
        return Err(RollError::Malformed { field: "owner" });
    }
    if egg.species.trim().is_empty() {
        return Err(RollError::Malformed { field: "species" });
    }
    if matches!(egg.seed.as_deref(), Some(s) if s.trim().is_empty()) {
        return Err(RollError::Malformed { field: "seed" });
    }

    let mut rng = rng_for(&seed_material(egg));
    let is_shiny = rng.gen::<f64>() < SHINY_RATE;

    let traits = if is_shiny {
        TraitSet {
            color: draw(&mut rng, PetColor::SHINY),
            aura: PetAura::SHINY_FIXED,
            eyes: draw(&mut rng, PetEyes::SHINY),
            pattern: PetPattern::SHINY_FIXED,
        }
    } else {
        TraitSet {
            color: draw(&mut rng, PetColor::NORMAL),
            aura: draw(&mut rng, PetAura::NORMAL),
            eyes: draw(&mut rng, PetEyes::NORMAL),
            pattern: draw(&mut rng, PetPattern::NORMAL),
        }
    };

    Ok(RolledPet { is_shiny, traits })
}

fn seed_material(egg: &EggSnapshot) -> String {
    match &egg.seed {
        Some(seed) => seed.clone(),
        None => format!("{}:{}:{}", egg.id, egg.owner_id, egg.hatch_at.unix_timestamp()),
    }
}

fn rng_for(material: &str) -> StdRng {
    let digest = Sha256::digest(material.as_bytes());
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    StdRng::from_seed(seed)
}

fn draw<T: Copy>(rng: &mut StdRng, palette: &[T]) -> T {
    palette[rng.gen_range(0..palette.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn snapshot(seed: Option<&str>) -> EggSnapshot {
        EggSnapshot {
            id: Uuid::from_u128(0x1234_5678_9abc_def0),
            owner_id: 4242,
            species: "chick".to_string(),
            seed: seed.map(str::to_string),
            hatch_at: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
        }
    }

    #[test]
    fn same_snapshot_rolls_same_pet() {
        let egg = snapshot(None);
        let first = roll_pet_from_egg(&egg).unwrap();
        let second = roll_pet_from_egg(&egg.clone()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn explicit_seed_wins_over_identity() {
        let mut a = snapshot(Some("abc"));
        let mut b = snapshot(Some("abc"));
        a.id = Uuid::from_u128(1);
        b.id = Uuid::from_u128(2);
        b.owner_id = 99;
        assert_eq!(roll_pet_from_egg(&a).unwrap(), roll_pet_from_egg(&b).unwrap());
    }

    #[test]
    fn identity_fields_change_the_roll() {
        let rolls: HashSet<String> = (0..50)
            .map(|i| {
                let mut egg = snapshot(None);
                egg.id = Uuid::from_u128(1000 + i);
                let pet = roll_pet_from_egg(&egg).unwrap();
                format!("{}:{}", pet.is_shiny, pet.traits.summary())
            })
            .collect();
        assert!(rolls.len() > 1, "50 distinct eggs all rolled the same pet");
    }

    #[test]
    fn fixed_seed_is_stable_and_palette_valid() {
        let egg = snapshot(Some("abc"));
        let pet = roll_pet_from_egg(&egg).unwrap();
        // Pinned by rerolling: byte-identical output and values from the
        // palettes the shiny flag selects.
        assert_eq!(pet, roll_pet_from_egg(&egg).unwrap());
        if pet.is_shiny {
            assert!(PetColor::SHINY.contains(&pet.traits.color));
            assert!(PetEyes::SHINY.contains(&pet.traits.eyes));
            assert_eq!(pet.traits.aura, PetAura::SHINY_FIXED);
            assert_eq!(pet.traits.pattern, PetPattern::SHINY_FIXED);
        } else {
            assert!(PetColor::NORMAL.contains(&pet.traits.color));
            assert!(PetAura::NORMAL.contains(&pet.traits.aura));
            assert!(PetEyes::NORMAL.contains(&pet.traits.eyes));
            assert!(PetPattern::NORMAL.contains(&pet.traits.pattern));
        }
    }

    #[test]
    fn shiny_rate_converges_to_five_percent() {
        let total = 20_000;
        let shiny = (0..total)
            .filter(|i| {
                let egg = snapshot(Some(&format!("sample-{i}")));
                roll_pet_from_egg(&egg).unwrap().is_shiny
            })
            .count();
        let rate = shiny as f64 / total as f64;
        assert!(
            (0.04..=0.06).contains(&rate),
            "shiny rate {rate} outside 5% +/- 1%"
        );
    }

    #[test]
    fn shiny_pets_use_the_shiny_palettes() {
        let mut seen_shiny = false;
        for i in 0..10_000 {
            let egg = snapshot(Some(&format!("shiny-hunt-{i}")));
            let pet = roll_pet_from_egg(&egg).unwrap();
            if !pet.is_shiny {
                continue;
            }
            seen_shiny = true;
            assert!(PetColor::SHINY.contains(&pet.traits.color));
            assert!(PetEyes::SHINY.contains(&pet.traits.eyes));
            assert_eq!(pet.traits.aura, PetAura::SHINY_FIXED);
            assert_eq!(pet.traits.pattern, PetPattern::SHINY_FIXED);
        }
        assert!(seen_shiny, "no shiny pet in 10k samples");
    }

    #[test]
    fn non_shiny_pets_use_the_normal_palettes() {
        for i in 0..200 {
            let egg = snapshot(Some(&format!("plain-{i}")));
            let pet = roll_pet_from_egg(&egg).unwrap();
            if pet.is_shiny {
                continue;
            }
            assert!(PetColor::NORMAL.contains(&pet.traits.color));
            assert!(PetAura::NORMAL.contains(&pet.traits.aura));
            assert!(PetEyes::NORMAL.contains(&pet.traits.eyes));
            assert!(PetPattern::NORMAL.contains(&pet.traits.pattern));
        }
    }

    #[test]
    fn malformed_snapshots_fail_closed() {
        let mut egg = snapshot(None);
        egg.id = Uuid::nil();
        assert!(roll_pet_from_egg(&egg).is_err());

        let mut egg = snapshot(None);
        egg.owner_id = 0;
        assert!(roll_pet_from_egg(&egg).is_err());

        let mut egg = snapshot(None);
        egg.species = "   ".to_string();
        assert!(roll_pet_from_egg(&egg).is_err());

        let egg = snapshot(Some(""));
        assert!(roll_pet_from_egg(&egg).is_err());
    }
}
