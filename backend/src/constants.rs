// =============================================================================
// Daymatch Backend Constants
// =============================================================================
// This file contains all constants used throughout the backend to enable
// easy tuning and configuration from a single location.

use once_cell::sync::Lazy;
use regex::Regex;

// =============================================================================
// TOKEN ECONOMY
// =============================================================================

/// Tokens charged per rating point when a new attraction is created
pub const ATTRACTION_TOKEN_COST_PER_POINT: i64 = 1;

/// Tokens granted to a newly created user
pub const INITIAL_TOKEN_GRANT_AMOUNT: i64 = 100;

/// Tokens granted by the monthly replenishment job
pub const MONTHLY_REPLENISHMENT_AMOUNT: i64 = 100;

// =============================================================================
// ATTRACTION RATINGS
// =============================================================================

/// Maximum value of each individual attraction rating
pub const MAX_RATING: i16 = 3;

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Default server port if not specified in environment
pub const DEFAULT_SERVER_PORT: u16 = 3000;

// =============================================================================
// HELPER FUNCTIONS FOR VALIDATION
// =============================================================================

static DATE_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// Validates if a rating is within the allowed [0, MAX_RATING] range
pub fn is_valid_rating(rating: i16) -> bool {
    (0..=MAX_RATING).contains(&rating)
}

/// Validates if a string matches the YYYY-MM-DD date format
pub fn is_valid_date_format(date: &str) -> bool {
    DATE_FORMAT.is_match(date)
}
