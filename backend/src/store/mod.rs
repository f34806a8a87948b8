use async_trait::async_trait;
use time::Duration;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{Egg, NewPet, Pet};

pub mod memory;
pub mod postgres;

pub use memory::MemoryEggStore;
pub use postgres::PgEggStore;

/// Durable storage for users, eggs and pets.
///
/// The claim step is the concurrency contract of the whole service: it must
/// be atomic with respect to other claimers, so any backing store that can do
/// an atomic conditional update can implement this trait.
#[async_trait]
pub trait EggStore: Send + Sync {
    /// Insert or refresh a user keyed by their external chat id.
    async fn upsert_user(&self, user_id: i64, username: &str) -> Result<(), Error>;

    /// Insert a new `pending` egg hatching `hatch_delay` from now.
    /// The delay may be negative, which makes the egg due immediately.
    async fn create_egg(
        &self,
        owner_id: i64,
        species: &str,
        seed: Option<String>,
        hatch_delay: Duration,
    ) -> Result<Egg, Error>;

    /// Atomically move up to `limit` due `pending` eggs to `claimed` and
    /// return them, earliest `(hatch_at, created_at)` first. Concurrent
    /// callers never receive the same egg.
    async fn claim_due_eggs(&self, limit: i64) -> Result<Vec<Egg>, Error>;

    /// Persist a pet. Idempotent on the originating egg: returns `true` if a
    /// row was inserted, `false` if that egg already has its pet.
    async fn insert_pet(&self, pet: NewPet) -> Result<bool, Error>;

    async fn get_pet_by_egg(&self, egg_id: Uuid) -> Result<Option<Pet>, Error>;

    /// Move a `claimed` egg to `hatched`. Only call once the pet row is
    /// durable. Completing an already-hatched egg is a no-op.
    async fn complete_hatch(&self, egg_id: Uuid) -> Result<(), Error>;

    /// Move a `claimed` egg back to `pending` so a later tick retries it.
    async fn release_claim(&self, egg_id: Uuid) -> Result<(), Error>;

    /// Requeue eggs that have sat in `claimed` longer than `lease`, which
    /// recovers claims orphaned by a crashed worker. Returns how many eggs
    /// were requeued.
    async fn release_expired_claims(&self, lease: Duration) -> Result<u64, Error>;
}
