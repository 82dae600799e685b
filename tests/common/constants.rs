//! Shared constants for end-to-end tests
//!
//! When the fixture song lists change, update only this file.

// ============================================================================
// Song list fixtures
// ============================================================================

/// First song of the Happy list (stored as .xlsx)
pub const HAPPY_FIRST_SONG: &str = "Walking on Sunshine";

/// Artist of the first Happy song
pub const HAPPY_FIRST_ARTIST: &str = "Katrina and the Waves";

/// First song of the Sad list
pub const SAD_FIRST_SONG: &str = "Everybody Hurts";

/// First song of the Angry list
pub const ANGRY_FIRST_SONG: &str = "Killing in the Name";

/// Number of songs in every fixture list
pub const SONGS_PER_LIST: usize = 2;

// ============================================================================
// Fake model thresholds
// ============================================================================
//
// The test model picks an emotion from the mean gray level of the picture.
// A solid picture of one of these gray levels scans as the named emotion.

pub const ANGRY_GRAY: u8 = 20;
pub const SAD_GRAY: u8 = 100;
pub const NEUTRAL_GRAY: u8 = 160;
pub const HAPPY_GRAY: u8 = 240;

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for the server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Default request timeout
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
