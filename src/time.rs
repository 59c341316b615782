/// Time utilities.
///
/// Event timestamps are Unix seconds. Everything in this crate stamps with
/// `chrono::Utc::now()`; deterministic tests inject explicit timestamps
/// instead of mocking the clock.

/// Returns the current Unix timestamp in seconds.
pub fn now_timestamp() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_timestamp_is_reasonable() {
        let ts = now_timestamp();
        // Should be after 2024-01-01 (1704067200)
        assert!(ts > 1_704_067_200, "Timestamp {} is too old", ts);
        // Should be before 2100-01-01 (4102444800)
        assert!(ts < 4_102_444_800, "Timestamp {} is too far in future", ts);
    }
}
