//! Reply builders for the bot commands. The chat transport lives elsewhere;
//! it hands user input to these and sends back whatever string it gets.
//! Internal errors never reach the user: they collapse to a generic line
//! and the detail goes to the log.

use tracing::{error, info};

use crate::error::Error;
use crate::models::Egg;
use crate::store::EggStore;
use shared::constants::{GENERIC_FAILURE_MESSAGE, INVALID_DELAY_MESSAGE, INVALID_SPECIES_MESSAGE};
use shared::validation::{parse_hatch_delay, validate_species};

pub fn welcome() -> String {
    "Welcome to Glitch Pets! 🐣\n\nUse: /hatch <delay> <species>\nExample: /hatch 5m chick"
        .to_string()
}

/// Handle `/hatch <delay> <species>`: onboard the user, validate the input
/// and schedule an egg.
pub async fn take_egg<S: EggStore>(
    store: &S,
    user_id: i64,
    username: &str,
    species: &str,
    delay_text: &str,
) -> String {
    if validate_species(species).is_err() {
        return INVALID_SPECIES_MESSAGE.to_string();
    }
    let Some(delay) = parse_hatch_delay(delay_text) else {
        return INVALID_DELAY_MESSAGE.to_string();
    };

    match schedule_egg(store, user_id, username, species.trim(), delay).await {
        Ok(_egg) => format!(
            "Egg scheduled: a {} will hatch in {}!",
            species.trim(),
            delay_text.trim()
        ),
        Err(e) => {
            error!("Failed to schedule an egg for user {}: {}", user_id, e);
            GENERIC_FAILURE_MESSAGE.to_string()
        }
    }
}

async fn schedule_egg<S: EggStore>(
    store: &S,
    user_id: i64,
    username: &str,
    species: &str,
    delay: time::Duration,
) -> Result<Egg, Error> {
    store.upsert_user(user_id, username).await?;
    let egg = store.create_egg(user_id, species, None, delay).await?;
    info!(
        "🥚 {} scheduled a {} egg to hatch at {}",
        username, species, egg.hatch_at
    );
    Ok(egg)
}
