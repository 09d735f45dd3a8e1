use crate::types::{RelativeAge, Result, TimeUnit, WatchError};
use tracing::debug;

/// Parse a relative timestamp like `3 分钟前` into magnitude and unit.
///
/// The input must split on whitespace into exactly two tokens; anything else
/// is `UnparseableTimestamp`. A non-integer first token is `InvalidMagnitude`.
pub fn parse_relative_age(raw: &str) -> Result<RelativeAge> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();

    let [magnitude, label] = tokens.as_slice() else {
        debug!("Timestamp '{}' has {} tokens, expected 2", raw, tokens.len());
        return Err(WatchError::UnparseableTimestamp { raw: raw.to_string() });
    };

    let magnitude: u32 = magnitude
        .parse()
        .map_err(|_| WatchError::InvalidMagnitude { raw: raw.to_string() })?;

    Ok(RelativeAge {
        magnitude,
        unit: TimeUnit::from_label(label),
        label: label.to_string(),
    })
}
