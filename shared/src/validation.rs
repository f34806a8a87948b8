use once_cell::sync::Lazy;
use regex::Regex;
use rustrict::CensorStr;
use time::Duration;
use validator::ValidationError;

use crate::constants::{MAX_HATCH_DELAY_SECS, MAX_SPECIES_LENGTH, MIN_HATCH_DELAY_SECS};

static DELAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,6})\s*([smh])$").unwrap()
});

pub fn validate_species(species: &str) -> Result<(), ValidationError> {
    let species = species.trim();
    if species.is_empty() || species.len() > MAX_SPECIES_LENGTH {
        return Err(ValidationError::new("invalid_species_length"));
    }
    if !species
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-' || c == '_')
    {
        return Err(ValidationError::new("invalid_species_characters"));
    }
    if species.is_inappropriate() {
        return Err(ValidationError::new("inappropriate_species"));
    }
    Ok(())
}

/// Parse a hatch delay like `10s`, `5m` or `2h`.
///
/// Returns `None` for anything unreadable or outside the allowed window.
pub fn parse_hatch_delay(text: &str) -> Option<Duration> {
    let caps = DELAY_RE.captures(text.trim())?;
    let amount: u64 = caps.get(1)?.as_str().parse().ok()?;
    let seconds = match caps.get(2)?.as_str().to_ascii_lowercase().as_str() {
        "s" => amount,
        "m" => amount.checked_mul(60)?,
        "h" => amount.checked_mul(60 * 60)?,
        _ => return None,
    };
    if !(MIN_HATCH_DELAY_SECS..=MAX_HATCH_DELAY_SECS).contains(&seconds) {
        return None;
    }
    Some(Duration::seconds(seconds as i64))
}
