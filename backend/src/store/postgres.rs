use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::types::Json;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{Egg, EggStatus, NewPet, Pet};
use crate::store::EggStore;

use shared::palettes::TraitSet;

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Postgres-backed store. Queries are built at runtime so the tree compiles
/// without a live database; every statement is parameterized.
#[derive(Clone)]
pub struct PgEggStore {
    pool: PgPool,
}

impl PgEggStore {
    pub async fn connect(database_url: &str) -> Result<Self, Error> {
        let options: PgConnectOptions = database_url.parse::<PgConnectOptions>()?;
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(std::time::Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect_with(options)
            .await?;
        info!("Connected to Postgres");
        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by the live-database tests).
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn egg_status(&self, egg_id: Uuid) -> Result<Option<EggStatus>, Error> {
        let status = sqlx::query_scalar::<_, EggStatus>("SELECT status FROM eggs WHERE id = $1")
            .bind(egg_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(status)
    }
}

#[derive(sqlx::FromRow)]
struct PetRow {
    id: Uuid,
    egg_id: Uuid,
    owner_id: i64,
    species: String,
    is_shiny: bool,
    traits: Json<TraitSet>,
    created_at: OffsetDateTime,
}

impl From<PetRow> for Pet {
    fn from(row: PetRow) -> Self {
        Self {
            id: row.id,
            egg_id: row.egg_id,
            owner_id: row.owner_id,
            species: row.species,
            is_shiny: row.is_shiny,
            traits: row.traits.0,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl EggStore for PgEggStore {
    async fn upsert_user(&self, user_id: i64, username: &str) -> Result<(), Error> {
        let now = OffsetDateTime::now_utc();
        sqlx::query(
            r"INSERT INTO users (id, username, created_at, last_seen_at)
              VALUES ($1, $2, $3, $3)
              ON CONFLICT (id)
              DO UPDATE SET username = EXCLUDED.username, last_seen_at = EXCLUDED.last_seen_at",
        )
        .bind(user_id)
        .bind(username)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_egg(
        &self,
        owner_id: i64,
        species: &str,
        seed: Option<String>,
        hatch_delay: Duration,
    ) -> Result<Egg, Error> {
        let now = OffsetDateTime::now_utc();
        let egg = sqlx::query_as::<_, Egg>(
            r"INSERT INTO eggs (id, owner_id, species, seed, hatch_at, status, created_at)
              VALUES ($1, $2, $3, $4, $5, 'pending', $6)
              RETURNING id, owner_id, species, seed, hatch_at, status, claimed_at, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(species)
        .bind(seed)
        .bind(now + hatch_delay)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(egg)
    }

    async fn claim_due_eggs(&self, limit: i64) -> Result<Vec<Egg>, Error> {
        let now = OffsetDateTime::now_utc();
        // The locked subselect is what keeps concurrent claimers disjoint:
        // rows another transaction already picked are skipped, not awaited.
        let mut eggs = sqlx::query_as::<_, Egg>(
            r"UPDATE eggs
              SET status = 'claimed', claimed_at = $1
              WHERE id IN (
                  SELECT id FROM eggs
                  WHERE status = 'pending' AND hatch_at <= $1
                  ORDER BY hatch_at, created_at
                  LIMIT $2
                  FOR UPDATE SKIP LOCKED
              )
              RETURNING id, owner_id, species, seed, hatch_at, status, claimed_at, created_at",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        // RETURNING does not promise the subselect's order.
        eggs.sort_by(|a, b| {
            a.hatch_at
                .cmp(&b.hatch_at)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(eggs)
    }

    async fn insert_pet(&self, pet: NewPet) -> Result<bool, Error> {
        let result = sqlx::query(
            r"INSERT INTO pets (id, egg_id, owner_id, species, is_shiny, traits, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7)
              ON CONFLICT (egg_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(pet.egg_id)
        .bind(pet.owner_id)
        .bind(&pet.species)
        .bind(pet.is_shiny)
        .bind(Json(pet.traits))
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_pet_by_egg(&self, egg_id: Uuid) -> Result<Option<Pet>, Error> {
        let row = sqlx::query_as::<_, PetRow>(
            r"SELECT id, egg_id, owner_id, species, is_shiny, traits, created_at
              FROM pets WHERE egg_id = $1",
        )
        .bind(egg_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Pet::from))
    }

    async fn complete_hatch(&self, egg_id: Uuid) -> Result<(), Error> {
        let updated = sqlx::query(
            "UPDATE eggs SET status = 'hatched', claimed_at = NULL WHERE id = $1 AND status = 'claimed'",
        )
        .bind(egg_id)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 1 {
            return Ok(());
        }
        match self.egg_status(egg_id).await? {
            None => Err(Error::EggNotFound(egg_id)),
            // A repeated completion after a crash-retry is harmless.
            Some(EggStatus::Hatched) => Ok(()),
            Some(from) => Err(Error::InvalidTransition {
                egg_id,
                from,
                to: EggStatus::Hatched,
            }),
        }
    }

    async fn release_claim(&self, egg_id: Uuid) -> Result<(), Error> {
        let updated = sqlx::query(
            "UPDATE eggs SET status = 'pending', claimed_at = NULL WHERE id = $1 AND status = 'claimed'",
        )
        .bind(egg_id)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 1 {
            return Ok(());
        }
        match self.egg_status(egg_id).await? {
            None => Err(Error::EggNotFound(egg_id)),
            Some(EggStatus::Pending) => Ok(()),
            Some(from) => Err(Error::InvalidTransition {
                egg_id,
                from,
                to: EggStatus::Pending,
            }),
        }
    }

    async fn release_expired_claims(&self, lease: Duration) -> Result<u64, Error> {
        let cutoff = OffsetDateTime::now_utc() - lease;
        let released = sqlx::query(
            r"UPDATE eggs
              SET status = 'pending', claimed_at = NULL
              WHERE status = 'claimed' AND claimed_at IS NOT NULL AND claimed_at <= $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if released > 0 {
            info!("⏱️ Re-queued {} eggs from expired claims", released);
        }
        Ok(released)
    }
}
