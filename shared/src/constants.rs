/// Probability that a hatch rolls a shiny pet.
pub const SHINY_RATE: f64 = 0.05;

pub const MIN_HATCH_DELAY_SECS: u64 = 10;
pub const MAX_HATCH_DELAY_SECS: u64 = 72 * 60 * 60;

pub const MAX_SPECIES_LENGTH: usize = 32;

pub const GENERIC_FAILURE_MESSAGE: &str = "Sorry, I couldn't complete that right now. Please try again in a bit.";
pub const INVALID_DELAY_MESSAGE: &str = "I couldn't read that delay. Use formats like 10s, 5m, 2h";
pub const INVALID_SPECIES_MESSAGE: &str = "That species name won't work. Keep it short and friendly.";
