use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::models::{Egg, NewPet};
use crate::services::notify::{hatch_message, Notifier};
use crate::store::EggStore;
use shared::roller::roll_pet_from_egg;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often a tick fires.
    pub tick_interval: std::time::Duration,
    /// Maximum eggs claimed per tick.
    pub claim_batch_size: i64,
    /// How long an egg may sit in `claimed` before the sweep assumes its
    /// worker died and re-queues it. Must comfortably exceed the time one
    /// batch takes to process.
    pub claim_lease: time::Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: std::time::Duration::from_secs(30),
            claim_batch_size: 25,
            claim_lease: time::Duration::minutes(5),
        }
    }
}

/// What one tick did, for the tick log line and for tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub swept: u64,
    pub claimed: usize,
    pub hatched: usize,
    pub requeued: usize,
    pub failed: usize,
}

enum EggOutcome {
    Hatched,
    Requeued,
    Failed,
}

/// Drives due eggs through `claimed` to `hatched`.
///
/// Both the periodic loop and any external "hatch now" trigger go through
/// [`HatchScheduler::run_tick`], so behavior is identical regardless of what
/// fired the tick. Multiple workers may run ticks concurrently against the
/// same database; the store's claim step keeps their batches disjoint.
pub struct HatchScheduler<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    config: SchedulerConfig,
}

impl<S: EggStore, N: Notifier> HatchScheduler<S, N> {
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: SchedulerConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Tick forever at the configured interval.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.config.tick_interval);
        loop {
            interval.tick().await;
            match self.run_tick().await {
                Ok(summary) if summary.claimed > 0 || summary.swept > 0 => {
                    info!(
                        "🐣 Tick: claimed {}, hatched {}, re-queued {}, failed {}, swept {}",
                        summary.claimed,
                        summary.hatched,
                        summary.requeued,
                        summary.failed,
                        summary.swept
                    );
                }
                Ok(_) => {}
                Err(e) => error!("Tick aborted: {}", e),
            }
        }
    }

    /// Run one batch: sweep orphaned claims, claim due eggs, process each
    /// claimed egg independently.
    ///
    /// A storage error while sweeping or claiming aborts the whole tick with
    /// no eggs claimed. Errors inside a single egg's pipeline never touch the
    /// rest of the batch.
    pub async fn run_tick(&self) -> Result<TickSummary, Error> {
        let swept = self
            .store
            .release_expired_claims(self.config.claim_lease)
            .await?;
        let eggs = self.store.claim_due_eggs(self.config.claim_batch_size).await?;

        let mut summary = TickSummary {
            swept,
            claimed: eggs.len(),
            ..TickSummary::default()
        };

        let outcomes = join_all(eggs.into_iter().map(|egg| self.process_egg(egg))).await;
        for outcome in outcomes {
            match outcome {
                EggOutcome::Hatched => summary.hatched += 1,
                EggOutcome::Requeued => summary.requeued += 1,
                EggOutcome::Failed => summary.failed += 1,
            }
        }
        Ok(summary)
    }

    /// Resolve one claimed egg: roll, persist the pet, deliver the news,
    /// then mark the egg hatched.
    ///
    /// The pet is persisted before the egg leaves `claimed`, and the insert
    /// is idempotent on the egg id, so a crash or requeue anywhere in here
    /// re-runs safely and lands on the identical pet.
    async fn process_egg(&self, egg: Egg) -> EggOutcome {
        let rolled = match roll_pet_from_egg(&egg.snapshot()) {
            Ok(rolled) => rolled,
            Err(e) => {
                // Data-integrity problem. Leave the egg claimed; the lease
                // sweep will resurface it instead of silently dropping it.
                error!("Egg {} has an unrollable snapshot: {}", egg.id, e);
                return EggOutcome::Failed;
            }
        };

        let pet = NewPet {
            egg_id: egg.id,
            owner_id: egg.owner_id,
            species: egg.species.clone(),
            is_shiny: rolled.is_shiny,
            traits: rolled.traits,
        };
        if let Err(e) = self.store.insert_pet(pet).await {
            error!("Failed to persist pet for egg {}: {}", egg.id, e);
            return EggOutcome::Failed;
        }

        let text = hatch_message(&egg.species, rolled.is_shiny, &rolled.traits);
        match self.notifier.notify(egg.owner_id, &text).await {
            Ok(()) => match self.store.complete_hatch(egg.id).await {
                Ok(()) => {
                    if rolled.is_shiny {
                        info!(
                            "✨ Egg {} hatched a SHINY {} for user {}",
                            egg.id, egg.species, egg.owner_id
                        );
                    } else {
                        info!(
                            "🐣 Egg {} hatched a {} for user {}",
                            egg.id, egg.species, egg.owner_id
                        );
                    }
                    EggOutcome::Hatched
                }
                Err(e) => {
                    error!("Failed to complete hatch for egg {}: {}", egg.id, e);
                    EggOutcome::Failed
                }
            },
            Err(e) => {
                warn!("📣 Delivery failed for egg {}: {}; re-queuing", egg.id, e);
                match self.store.release_claim(egg.id).await {
                    Ok(()) => EggOutcome::Requeued,
                    Err(release_err) => {
                        error!(
                            "Failed to release claim on egg {}: {}",
                            egg.id, release_err
                        );
                        EggOutcome::Failed
                    }
                }
            }
        }
    }
}
