//! Unique resource names for sample runs

use rand::distributions::Alphanumeric;
use rand::Rng;

const SUFFIX_LEN: usize = 8;

/// Random lowercase alphanumeric suffix
pub fn random_name() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Queue name prefix unique to one sample run
pub fn queue_prefix() -> String {
    format!("queue-{}", random_name())
}
