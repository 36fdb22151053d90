// Selects the default model profile by its position in the listing.

use crate::config::{Config, ConfigFile, ModelProfile};
use crate::error::{self, Error, Result};
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

/// A parsed switcher argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// No argument: usage followed by the listing.
    Usage,
    List,
    Help,
    /// 1-based position, unchecked against the model count.
    Ordinal(i64),
}

impl Selection {
    pub fn parse(arg: Option<&str>) -> Result<Self> {
        match arg {
            None => Ok(Self::Usage),
            Some("list") => Ok(Self::List),
            Some("help" | "--help" | "-h") => Ok(Self::Help),
            Some(other) => {
                let trimmed = other.trim();
                match trimmed.parse::<i64>() {
                    Ok(n) => Ok(Self::Ordinal(n)),
                    // Too large for i64 but still a number: out of range, not malformed.
                    Err(_) if is_integer_literal(trimmed) => Ok(Self::Ordinal(
                        if trimmed.starts_with('-') {
                            i64::MIN
                        } else {
                            i64::MAX
                        },
                    )),
                    Err(_) => Err(Error::selection(format!(
                        "'{other}' is not a valid number"
                    ))),
                }
            }
        }
    }
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Result of a successful switch.
#[derive(Debug, Clone, PartialEq)]
pub struct Switched {
    pub key: String,
    pub profile: ModelProfile,
}

/// Key at 1-based `ordinal` in document order.
pub fn key_at(config: &Config, ordinal: i64) -> Result<String> {
    let count = config.models.len();
    usize::try_from(ordinal)
        .ok()
        .filter(|n| (1..=count).contains(n))
        .and_then(|n| config.models.get_index(n - 1))
        .map(|(key, _)| key.clone())
        .ok_or_else(|| Error::selection(format!("Number must be between 1 and {count}")))
}

/// Make `key` the default and rewrite the file.
pub fn switch_model(file: &ConfigFile, key: &str) -> Result<Switched> {
    let mut config = file.load()?;
    let profile = config.set_default_model(key)?.clone();
    file.save(&config)?;
    debug!(%key, model = %profile.name, "default model switched");
    Ok(Switched {
        key: key.to_string(),
        profile,
    })
}

/// Resolve `ordinal` against the current listing and switch to it.
///
/// The file is only written when the ordinal is in range.
pub fn switch_to_ordinal(file: &ConfigFile, ordinal: i64) -> Result<Switched> {
    let config = file.load()?;
    let key = key_at(&config, ordinal)?;
    switch_model(file, &key)
}

pub fn render_listing(config: &Config) -> String {
    let current = config.current_model();
    let mut out = String::from("# Available models:\n\n");
    for (i, (key, description)) in config.list_models().into_iter().enumerate() {
        let marker = if key == current { ">" } else { " " };
        let _ = writeln!(out, "{marker} {}. {key}: {description}", i + 1);
    }
    let _ = write!(out, "\nCurrent default: {current}\n");
    out
}

pub fn render_switched(switched: &Switched) -> String {
    let profile = &switched.profile;
    let timeout = profile
        .timeout
        .map(|t| t.to_string())
        .unwrap_or_else(|| "N/A".into());
    format!(
        "+ Switched to model: {}\n   Name: {}\n   Description: {}\n   Timeout: {}s\n",
        switched.key,
        profile.name,
        profile.description.as_deref().unwrap_or("N/A"),
        timeout,
    )
}

fn listing_or_error(config_path: &Path) -> String {
    match ConfigFile::locate(config_path).and_then(|f| f.load()) {
        Ok(config) => render_listing(&config),
        Err(e) => error::report(&e),
    }
}

/// Handle one switcher invocation and return what to print.
///
/// Errors never escape: they are rendered and, where the user picked a bad
/// entry, followed by the listing again.
pub fn run(config_path: &Path, arg: Option<&str>) -> String {
    let selection = match Selection::parse(arg) {
        Ok(selection) => selection,
        Err(e) => return format!("{}\n{}", error::report(&e), listing_or_error(config_path)),
    };

    match selection {
        Selection::Usage | Selection::Help => {
            format!("{}\n{}", usage(), listing_or_error(config_path))
        }
        Selection::List => listing_or_error(config_path),
        Selection::Ordinal(n) => {
            match ConfigFile::locate(config_path).and_then(|f| switch_to_ordinal(&f, n)) {
                Ok(switched) => format!(
                    "{}\n> You can now run: hello-crew run\n",
                    render_switched(&switched)
                ),
                Err(e @ Error::InvalidSelection(_)) => {
                    format!("{}\n{}", error::report(&e), listing_or_error(config_path))
                }
                Err(e) => error::report(&e),
            }
        }
    }
}

pub fn usage() -> &'static str {
    "# Model Switcher\n\n\
     Usage:\n  \
     hello-crew switch list              - List available models\n  \
     hello-crew switch <number>          - Switch to model by number\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_models() -> Config {
        Config::from_toml(
            r#"
[models.a]
name = "m1"
description = "first"
[models.b]
name = "m2"
[settings]
default_model = "a"
"#,
        )
        .unwrap()
    }

    #[test]
    fn parses_commands_and_numbers() {
        assert_eq!(Selection::parse(None).unwrap(), Selection::Usage);
        assert_eq!(Selection::parse(Some("list")).unwrap(), Selection::List);
        assert_eq!(Selection::parse(Some("-h")).unwrap(), Selection::Help);
        assert_eq!(Selection::parse(Some("2")).unwrap(), Selection::Ordinal(2));
        assert_eq!(Selection::parse(Some("-3")).unwrap(), Selection::Ordinal(-3));
    }

    #[test]
    fn oversized_numbers_are_out_of_range_not_malformed() {
        assert_eq!(
            Selection::parse(Some("99999999999999999999")).unwrap(),
            Selection::Ordinal(i64::MAX)
        );
        assert_eq!(
            Selection::parse(Some("-99999999999999999999")).unwrap(),
            Selection::Ordinal(i64::MIN)
        );
        let err = key_at(&two_models(), i64::MAX).unwrap_err();
        assert_eq!(err.to_string(), "Number must be between 1 and 2");
        assert!(Selection::parse(Some("12a")).is_err());
        assert!(Selection::parse(Some("-")).is_err());
    }

    #[test]
    fn rejects_non_numeric() {
        let err = Selection::parse(Some("two")).unwrap_err();
        assert_eq!(err.to_string(), "'two' is not a valid number");
    }

    #[test]
    fn ordinal_maps_to_listing_order() {
        let config = two_models();
        assert_eq!(key_at(&config, 1).unwrap(), "a");
        assert_eq!(key_at(&config, 2).unwrap(), "b");
    }

    #[test]
    fn out_of_range_ordinals_fail() {
        let config = two_models();
        for n in [0, 3, -1, i64::MAX] {
            let err = key_at(&config, n).unwrap_err();
            assert_eq!(err.to_string(), "Number must be between 1 and 2");
        }
    }

    #[test]
    fn listing_marks_current_default() {
        let text = render_listing(&two_models());
        assert!(text.contains("> 1. a: first"));
        assert!(text.contains("  2. b: No description"));
        assert!(text.contains("Current default: a"));
    }

    #[test]
    fn switched_echo_shows_missing_fields_as_na() {
        let switched = Switched {
            key: "b".into(),
            profile: ModelProfile {
                name: "m2".into(),
                ..Default::default()
            },
        };
        let text = render_switched(&switched);
        assert!(text.contains("Switched to model: b"));
        assert!(text.contains("Description: N/A"));
        assert!(text.contains("Timeout: N/As"));
    }
}
