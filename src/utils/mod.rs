//! The `utils` module provides the shared pieces used across `acksub`:
//! the crate error type and logging setup.

pub mod error;
pub mod logging;

#[cfg(test)]
mod tests {
    use super::error::BrokerError;
    use super::logging;

    #[test]
    fn logging_init_accepts_levels() {
        // Should not panic
        logging::init("info");
        logging::init("debug");
        logging::init("warn");
    }

    #[test]
    fn parse_level_falls_back_to_info() {
        assert_eq!(logging::parse_level("WARNING"), tracing::Level::WARN);
        assert_eq!(logging::parse_level("trace"), tracing::Level::TRACE);
        assert_eq!(logging::parse_level("nonsense"), tracing::Level::INFO);
    }

    #[test]
    fn id_generation_error_mentions_cause() {
        let err = BrokerError::from(rand::Error::new(std::io::Error::other("entropy pool gone")));
        assert!(err.to_string().contains("failed to generate subscriber id"));
    }
}
