//! Small helpers shared by the world types.

/// Milliseconds since the Unix epoch.
///
/// Used for `createdAt` stamps on mail and notifications. A clock set before
/// the epoch yields `0` rather than failing.
pub fn current_timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
