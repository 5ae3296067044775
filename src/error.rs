use thiserror::Error;

/// Errors returned by [`LeaderBoard`](crate::LeaderBoard) window queries.
///
/// Missing ids and empty boards are not errors; those come back as `None`
/// or an empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LeaderBoardError {
    /// The requested rank window cannot be resolved: `to` was below `from`,
    /// or a bound resolved to a position before the first entry.
    #[error("rank window [{from}, {to}] is out of bounds")]
    RangeOutOfBounds {
        /// First position requested by the caller.
        from: i64,
        /// Last position requested by the caller.
        to: i64,
    },
}

/// Result alias used throughout the crate.
pub type Result<T, E = LeaderBoardError> = std::result::Result<T, E>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display_names_the_window() {
        let error = LeaderBoardError::RangeOutOfBounds { from: 6, to: 4 };
        assert_eq!(error.to_string(), "rank window [6, 4] is out of bounds");
    }
}
