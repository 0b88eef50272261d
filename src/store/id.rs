//! Record identifier generation
//!
//! Identifiers are random alphanumeric strings, long enough that
//! collision probability is negligible. Not cryptographically random.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Generated identifier length: 62^20 possible values.
const ID_LENGTH: usize = 20;

/// Generates a fresh record identifier.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect()
}
