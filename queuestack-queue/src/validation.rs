//! Request validation shared by queue backends

use queuestack_core::{QueueError, Result};
use std::time::Duration;

use crate::models::{Metadata, MAX_MESSAGES_PER_CALL, MAX_MESSAGE_SIZE};

/// Queue names: 3-63 lowercase letters, digits and single dashes, starting
/// and ending with a letter or digit.
pub(crate) fn queue_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| -> Result<()> {
        Err(QueueError::InvalidResourceName(format!("{name}: {reason}")))
    };

    if !(3..=63).contains(&name.len()) {
        return invalid("length must be between 3 and 63 characters");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return invalid("only lowercase letters, digits and dashes are allowed");
    }
    if name.starts_with('-') || name.ends_with('-') {
        return invalid("must start and end with a letter or digit");
    }
    if name.contains("--") {
        return invalid("consecutive dashes are not allowed");
    }
    Ok(())
}

/// Metadata names follow identifier rules
pub(crate) fn metadata(metadata: &Metadata) -> Result<()> {
    for key in metadata.keys() {
        let mut chars = key.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(QueueError::InvalidMetadata(format!(
                "metadata name is not a valid identifier: {key:?}"
            )));
        }
    }
    Ok(())
}

pub(crate) fn message_count(parameter: &str, count: u32) -> Result<()> {
    if count == 0 || count > MAX_MESSAGES_PER_CALL {
        return Err(QueueError::out_of_range(
            parameter,
            format!("must be between 1 and {MAX_MESSAGES_PER_CALL}, got {count}"),
        ));
    }
    Ok(())
}

pub(crate) fn duration_between(
    parameter: &str,
    value: Duration,
    min: Duration,
    max: Duration,
) -> Result<()> {
    if value < min || value > max {
        return Err(QueueError::out_of_range(
            parameter,
            format!(
                "must be between {}s and {}s, got {}s",
                min.as_secs(),
                max.as_secs(),
                value.as_secs()
            ),
        ));
    }
    Ok(())
}

pub(crate) fn message_text(text: &str) -> Result<()> {
    if text.len() > MAX_MESSAGE_SIZE {
        return Err(QueueError::RequestBodyTooLarge {
            size: text.len(),
            limit: MAX_MESSAGE_SIZE,
        });
    }
    Ok(())
}
