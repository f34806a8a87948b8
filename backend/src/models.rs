use serde::{Deserialize, Serialize};
use strum::EnumString;
use time::OffsetDateTime;
use uuid::Uuid;

use shared::palettes::TraitSet;
use shared::roller::EggSnapshot;

/// Lifecycle state of an egg. Forward-only except for the
/// `claimed -> pending` requeue edge used when delivery fails.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, strum::Display, sqlx::Type,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EggStatus {
    Pending,
    Claimed,
    Hatched,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Egg {
    pub id: Uuid,
    pub owner_id: i64,
    pub species: String,
    pub seed: Option<String>,
    pub hatch_at: OffsetDateTime,
    pub status: EggStatus,
    pub claimed_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl Egg {
    /// The immutable slice of this egg that the trait roller consumes.
    pub fn snapshot(&self) -> EggSnapshot {
        EggSnapshot {
            id: self.id,
            owner_id: self.owner_id,
            species: self.species.clone(),
            seed: self.seed.clone(),
            hatch_at: self.hatch_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Pet {
    pub id: Uuid,
    pub egg_id: Uuid,
    pub owner_id: i64,
    pub species: String,
    pub is_shiny: bool,
    pub traits: TraitSet,
    pub created_at: OffsetDateTime,
}

/// A pet about to be persisted. Id and creation time are assigned by the
/// store so retries of the same egg cannot mint two different rows.
#[derive(Debug, Clone)]
pub struct NewPet {
    pub egg_id: Uuid,
    pub owner_id: i64,
    pub species: String,
    pub is_shiny: bool,
    pub traits: TraitSet,
}
