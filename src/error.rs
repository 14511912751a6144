use std::process::ExitCode;

/// Errors that cause npm-release-check to exit with a specific code.
#[derive(Debug, thiserror::Error)]
pub enum ExitError {
    #[error("no <owner>/<repo> given and {manifest} declares no repository")]
    NoRepository { manifest: String },

    #[error("malformed repository {given:?}: expected <owner>/<repo>")]
    MalformedRepository { given: String },
}

impl ExitError {
    pub const fn code(&self) -> u8 {
        match self {
            Self::NoRepository { .. } => USAGE_FAILURE,
            Self::MalformedRepository { .. } => 2,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

/// Exit code for a missing repository and for unparseable arguments.
pub const USAGE_FAILURE: u8 = 1;

/// Exit code for any failure during the release sequence itself.
pub const RUNTIME_FAILURE: u8 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_have_distinct_codes() {
        let missing = ExitError::NoRepository {
            manifest: "package.json".into(),
        };
        let malformed = ExitError::MalformedRepository {
            given: "a/b/c".into(),
        };
        assert_eq!(missing.code(), 1);
        assert_eq!(malformed.code(), 2);
        assert_ne!(RUNTIME_FAILURE, 1);
        assert_ne!(RUNTIME_FAILURE, 2);
    }

    #[test]
    fn malformed_message_quotes_input() {
        let err = ExitError::MalformedRepository {
            given: "just-a-name".into(),
        };
        assert!(err.to_string().contains("\"just-a-name\""));
    }
}
