use uuid::Uuid;

use crate::models::EggStatus;
use crate::services::notify::NotifyError;
use shared::roller::RollError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("trait roll failed: {0}")]
    Roll(#[from] RollError),

    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),

    #[error("egg {0} not found")]
    EggNotFound(Uuid),

    #[error("egg {egg_id} cannot move from {from} to {to}")]
    InvalidTransition {
        egg_id: Uuid,
        from: EggStatus,
        to: EggStatus,
    },
}
