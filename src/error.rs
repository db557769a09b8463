// Error types for fan-out setup

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while building a fan-out.
///
/// Every variant aborts the whole setup: there is no mode where a subset of
/// the declared reporters keeps running.
#[derive(Error, Debug)]
pub enum MultiError {
    #[error(
        "reporter definitions should be set in the `multi` shell variable\n\
         eg. `multi='dot=- junit=report.xml' multireport`"
    )]
    NoDefinitions,

    #[error("'{definition}' is an invalid definition\nexpected <reporter>=<destination>")]
    InvalidDefinition { definition: String },

    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    #[error("Unable to find '{name}' reporter")]
    UnknownReporter { name: String },

    #[error("cannot prepare destination '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MultiError {
    /// True for every malformed or empty setup
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoDefinitions | Self::InvalidDefinition { .. } | Self::Configuration { .. }
        )
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MultiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(MultiError::NoDefinitions.is_configuration());
        assert!(
            MultiError::InvalidDefinition {
                definition: "x".into()
            }
            .is_configuration()
        );
        assert!(
            !MultiError::UnknownReporter {
                name: "nope".into()
            }
            .is_configuration()
        );
    }

    #[test]
    fn test_display_names_the_reporter() {
        let err = MultiError::UnknownReporter {
            name: "doesnotexist".into(),
        };
        assert_eq!(err.to_string(), "Unable to find 'doesnotexist' reporter");
    }
}
