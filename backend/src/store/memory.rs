use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::Error;
use crate::models::{Egg, EggStatus, NewPet, Pet};
use crate::store::EggStore;

/// In-memory store for tests and local development.
///
/// One mutex around all tables makes every operation atomic, which is the
/// same guarantee the Postgres store gets from its locked claim subselect.
#[derive(Default)]
pub struct MemoryEggStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    eggs: HashMap<Uuid, Egg>,
    // Keyed by originating egg so a retry can never mint a second pet.
    pets: HashMap<Uuid, Pet>,
    users: HashMap<i64, String>,
    broken_pet_inserts: HashSet<Uuid>,
    broken_egg_creation: bool,
}

impl MemoryEggStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `insert_pet` fail for one egg, simulating a storage fault in the
    /// middle of that egg's pipeline.
    pub fn break_pet_insert(&self, egg_id: Uuid) {
        self.inner.lock().unwrap().broken_pet_inserts.insert(egg_id);
    }

    pub fn repair_pet_insert(&self, egg_id: Uuid) {
        self.inner.lock().unwrap().broken_pet_inserts.remove(&egg_id);
    }

    /// Make every `create_egg` fail, simulating a storage outage.
    pub fn break_egg_creation(&self, broken: bool) {
        self.inner.lock().unwrap().broken_egg_creation = broken;
    }

    pub fn egg_count(&self) -> usize {
        self.inner.lock().unwrap().eggs.len()
    }

    pub fn egg(&self, egg_id: Uuid) -> Option<Egg> {
        self.inner.lock().unwrap().eggs.get(&egg_id).cloned()
    }

    pub fn username(&self, user_id: i64) -> Option<String> {
        self.inner.lock().unwrap().users.get(&user_id).cloned()
    }
}

#[async_trait]
impl EggStore for MemoryEggStore {
    async fn upsert_user(&self, user_id: i64, username: &str) -> Result<(), Error> {
        self.inner
            .lock()
            .unwrap()
            .users
            .insert(user_id, username.to_string());
        Ok(())
    }

    async fn create_egg(
        &self,
        owner_id: i64,
        species: &str,
        seed: Option<String>,
        hatch_delay: Duration,
    ) -> Result<Egg, Error> {
        if self.inner.lock().unwrap().broken_egg_creation {
            return Err(Error::Database(sqlx::Error::PoolClosed));
        }
        let now = OffsetDateTime::now_utc();
        let egg = Egg {
            id: Uuid::new_v4(),
            owner_id,
            species: species.to_string(),
            seed,
            hatch_at: now + hatch_delay,
            status: EggStatus::Pending,
            claimed_at: None,
            created_at: now,
        };
        self.inner.lock().unwrap().eggs.insert(egg.id, egg.clone());
        Ok(egg)
    }

    async fn claim_due_eggs(&self, limit: i64) -> Result<Vec<Egg>, Error> {
        let now = OffsetDateTime::now_utc();
        let mut inner = self.inner.lock().unwrap();

        let mut due: Vec<Uuid> = inner
            .eggs
            .values()
            .filter(|egg| egg.status == EggStatus::Pending && egg.hatch_at <= now)
            .map(|egg| egg.id)
            .collect();
        due.sort_by_key(|id| {
            let egg = &inner.eggs[id];
            (egg.hatch_at, egg.created_at, egg.id)
        });
        due.truncate(limit.max(0) as usize);

        let mut claimed = Vec::with_capacity(due.len());
        for id in due {
            let egg = inner.eggs.get_mut(&id).expect("due egg exists");
            egg.status = EggStatus::Claimed;
            egg.claimed_at = Some(now);
            claimed.push(egg.clone());
        }
        Ok(claimed)
    }

    async fn insert_pet(&self, pet: NewPet) -> Result<bool, Error> {
        let mut inner = self.inner.lock().unwrap();
        if inner.broken_pet_inserts.contains(&pet.egg_id) {
            return Err(Error::Database(sqlx::Error::PoolClosed));
        }
        if inner.pets.contains_key(&pet.egg_id) {
            return Ok(false);
        }
        let stored = Pet {
            id: Uuid::new_v4(),
            egg_id: pet.egg_id,
            owner_id: pet.owner_id,
            species: pet.species,
            is_shiny: pet.is_shiny,
            traits: pet.traits,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.pets.insert(stored.egg_id, stored);
        Ok(true)
    }

    async fn get_pet_by_egg(&self, egg_id: Uuid) -> Result<Option<Pet>, Error> {
        Ok(self.inner.lock().unwrap().pets.get(&egg_id).cloned())
    }

    async fn complete_hatch(&self, egg_id: Uuid) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        let egg = inner
            .eggs
            .get_mut(&egg_id)
            .ok_or(Error::EggNotFound(egg_id))?;
        match egg.status {
            EggStatus::Claimed => {
                egg.status = EggStatus::Hatched;
                egg.claimed_at = None;
                Ok(())
            }
            EggStatus::Hatched => Ok(()),
            EggStatus::Pending => Err(Error::InvalidTransition {
                egg_id,
                from: EggStatus::Pending,
                to: EggStatus::Hatched,
            }),
        }
    }

    async fn release_claim(&self, egg_id: Uuid) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        let egg = inner
            .eggs
            .get_mut(&egg_id)
            .ok_or(Error::EggNotFound(egg_id))?;
        match egg.status {
            EggStatus::Claimed => {
                egg.status = EggStatus::Pending;
                egg.claimed_at = None;
                Ok(())
            }
            EggStatus::Pending => Ok(()),
            EggStatus::Hatched => Err(Error::InvalidTransition {
                egg_id,
                from: EggStatus::Hatched,
                to: EggStatus::Pending,
            }),
        }
    }

    async fn release_expired_claims(&self, lease: Duration) -> Result<u64, Error> {
        let cutoff = OffsetDateTime::now_utc() - lease;
        let mut released = 0;
        let mut inner = self.inner.lock().unwrap();
        for egg in inner.eggs.values_mut() {
            if egg.status == EggStatus::Claimed
                && egg.claimed_at.map_or(false, |at| at <= cutoff)
            {
                egg.status = EggStatus::Pending;
                egg.claimed_at = None;
                released += 1;
            }
        }
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completing_a_pending_egg_is_rejected() {
        let store = MemoryEggStore::new();
        let egg = store
            .create_egg(1, "chick", None, Duration::seconds(-1))
            .await
            .unwrap();
        let err = store.complete_hatch(egg.id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn releasing_a_hatched_egg_is_rejected() {
        let store = MemoryEggStore::new();
        let egg = store
            .create_egg(1, "chick", None, Duration::seconds(-1))
            .await
            .unwrap();
        let claimed = store.claim_due_eggs(1).await.unwrap();
        assert_eq!(claimed.len(), 1);
        store.complete_hatch(egg.id).await.unwrap();

        let err = store.release_claim(egg.id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        // And completion stays idempotent.
        store.complete_hatch(egg.id).await.unwrap();
        assert_eq!(store.egg(egg.id).unwrap().status, EggStatus::Hatched);
    }

    #[tokio::test]
    async fn expired_claims_are_requeued() {
        let store = MemoryEggStore::new();
        let egg = store
            .create_egg(1, "chick", None, Duration::seconds(-1))
            .await
            .unwrap();
        store.claim_due_eggs(1).await.unwrap();

        // A generous lease keeps the fresh claim alive.
        assert_eq!(
            store.release_expired_claims(Duration::minutes(5)).await.unwrap(),
            0
        );
        // A zero lease treats it as orphaned.
        assert_eq!(
            store.release_expired_claims(Duration::ZERO).await.unwrap(),
            1
        );
        assert_eq!(store.egg(egg.id).unwrap().status, EggStatus::Pending);
    }
}
