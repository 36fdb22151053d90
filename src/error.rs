use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Model '{name}' not found. Available models: {available:?}")]
    ModelNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("{0}")]
    InvalidSelection(String),

    #[error("Cannot connect to LM Studio at {base_url}. Is it running? ({message})")]
    Connection { base_url: String, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(String),
}

impl Error {
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn selection(msg: impl Into<String>) -> Self {
        Self::InvalidSelection(msg.into())
    }

    pub fn model_not_found<'a>(
        name: impl Into<String>,
        available: impl IntoIterator<Item = &'a String>,
    ) -> Self {
        Self::ModelNotFound {
            name: name.into(),
            available: available.into_iter().cloned().collect(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// CLI rendering of an error: `* ERROR: <message>` plus newline.
pub fn report(e: &Error) -> String {
    format!("* ERROR: {e}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_not_found_lists_alternatives() {
        let keys = vec!["a".to_string(), "b".to_string()];
        let err = Error::model_not_found("zzz", &keys);
        assert_eq!(
            err.to_string(),
            r#"Model 'zzz' not found. Available models: ["a", "b"]"#
        );
    }

    #[test]
    fn missing_file_names_path() {
        let err = Error::ConfigNotFound {
            path: PathBuf::from(".env.toml"),
        };
        assert_eq!(err.to_string(), "Configuration file not found: .env.toml");
    }

    #[test]
    fn report_uses_error_marker() {
        let err = Error::selection("'x' is not a valid number");
        assert_eq!(report(&err), "* ERROR: 'x' is not a valid number\n");
    }
}
