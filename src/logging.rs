use std::path::Path;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "hello_crew=warn";

/// `RUST_LOG` from the process, else from the `.env` file, else the default.
pub fn filter_directive(process: Option<String>, dotenv: Option<&Path>) -> String {
    process
        .filter(|v| !v.is_empty())
        .or_else(|| {
            dotenvy::from_path_iter(dotenv?)
                .ok()?
                .filter_map(|item| item.ok())
                .find(|(key, _)| key == "RUST_LOG")
                .map(|(_, value)| value)
        })
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

/// Load `.env`, then install the fmt subscriber so a `RUST_LOG` there applies.
pub fn init() {
    let dotenv = dotenvy::dotenv().ok();
    let directive = filter_directive(std::env::var("RUST_LOG").ok(), dotenv.as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotenv_value_is_used_when_process_has_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "OTHER=1\nRUST_LOG=hello_crew=debug\n").unwrap();
        assert_eq!(filter_directive(None, Some(&path)), "hello_crew=debug");
    }

    #[test]
    fn process_value_wins_over_dotenv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "RUST_LOG=hello_crew=debug\n").unwrap();
        assert_eq!(
            filter_directive(Some("hello_crew=trace".into()), Some(&path)),
            "hello_crew=trace"
        );
    }

    #[test]
    fn falls_back_to_default() {
        assert_eq!(filter_directive(None, None), DEFAULT_LOG_FILTER);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "OTHER=1\n").unwrap();
        assert_eq!(filter_directive(None, Some(&path)), DEFAULT_LOG_FILTER);
    }
}
