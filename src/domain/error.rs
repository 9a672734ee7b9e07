//! Domain error types.
//!
//! The analytics pipeline itself is total; only adapters and the CLI produce these.

/// Top-level error type for tradelens.
#[derive(Debug, thiserror::Error)]
pub enum TradelensError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("rate fetch failed: {reason}")]
    RateFetch { reason: String },

    #[error("rate cache error: {reason}")]
    Cache { reason: String },

    #[error("export failed: {reason}")]
    Export { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradelensError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TradelensError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&TradelensError> for std::process::ExitCode {
    fn from(err: &TradelensError) -> Self {
        let code: u8 = match err {
            TradelensError::Io(_) | TradelensError::Export { .. } => 1,
            TradelensError::ConfigParse { .. }
            | TradelensError::ConfigMissing { .. }
            | TradelensError::ConfigInvalid { .. } => 2,
            TradelensError::Data { .. } => 3,
            TradelensError::RateFetch { .. } | TradelensError::Cache { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_section_and_key() {
        let err = TradelensError::invalid("dashboard", "histogram_bins", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid config value [dashboard] histogram_bins: must be at least 1"
        );
    }

    #[test]
    fn exit_codes_by_category() {
        use std::process::ExitCode;
        let config = TradelensError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        };
        let data = TradelensError::Data {
            reason: "bad row".into(),
        };
        assert_eq!(ExitCode::from(&config), ExitCode::from(2));
        assert_eq!(ExitCode::from(&data), ExitCode::from(3));
    }
}
