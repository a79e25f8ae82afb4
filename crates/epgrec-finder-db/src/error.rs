//! Error kinds raised while connecting to and querying the database.

/// Errors raised by the database layer.
#[derive(Debug)]
pub enum FinderError {
    /// The configured driver is not `mysql`.
    UnsupportedDriver(String),
    /// A driver option in the `option` string has an invalid value.
    InvalidOption {
        /// Option key.
        key: String,
        /// Rejected value.
        value: String,
    },
    /// The server is unreachable or rejected the credentials.
    Connection(sqlx::Error),
    /// Statement preparation or execution failed.
    Query(sqlx::Error),
    /// A returned row could not be mapped to a program record.
    Decode {
        /// Offending column.
        column: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

impl std::fmt::Display for FinderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedDriver(driver) => {
                write!(f, "unsupported database driver: {driver} (only \"mysql\" is supported)")
            }
            Self::InvalidOption { key, value } => {
                write!(f, "invalid value for connection option {key}: {value}")
            }
            Self::Connection(e) => write!(f, "failed to connect to database: {e}"),
            Self::Query(e) => write!(f, "failed to query programs: {e}"),
            Self::Decode { column, reason } => {
                write!(f, "failed to decode column {column}: {reason}")
            }
        }
    }
}

impl std::error::Error for FinderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connection(e) | Self::Query(e) => Some(e),
            Self::UnsupportedDriver(_) | Self::InvalidOption { .. } | Self::Decode { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::FinderError;

    #[test]
    fn test_unsupported_driver_display() {
        // Arrange
        let err = FinderError::UnsupportedDriver(String::from("postgres"));

        // Act
        let msg = err.to_string();

        // Assert
        assert_eq!(
            msg,
            "unsupported database driver: postgres (only \"mysql\" is supported)"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_query_error_keeps_source() {
        // Arrange
        let err = FinderError::Query(sqlx::Error::RowNotFound);

        // Act & Assert
        assert!(err.to_string().starts_with("failed to query programs: "));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_decode_display() {
        // Arrange
        let err = FinderError::Decode {
            column: "channel",
            reason: String::from("not a channel number: BS15_0"),
        };

        // Act & Assert
        assert_eq!(
            err.to_string(),
            "failed to decode column channel: not a channel number: BS15_0"
        );
    }
}
