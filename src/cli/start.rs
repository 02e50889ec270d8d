use crate::cli::{actions::Action, commands, dispatch::handler, telemetry};
use anyhow::Result;
use std::ffi::OsString;

/// `-v` info, `-vv` debug, anything above trace. Without `-v` only errors
/// are logged unless `RUST_LOG` says otherwise.
const fn get_verbosity_level(verbose_count: u8) -> Option<tracing::Level> {
    match verbose_count {
        0 => None,
        1 => Some(tracing::Level::INFO),
        2 => Some(tracing::Level::DEBUG),
        _ => Some(tracing::Level::TRACE),
    }
}

/// Parse the process arguments, install logging and resolve the action.
///
/// # Errors
///
/// Returns an error if telemetry initialization or argument validation fails
pub fn start() -> Result<Action> {
    start_from(std::env::args_os())
}

/// Same as [`start`] for an explicit argument list.
///
/// # Errors
///
/// Returns an error if telemetry initialization or argument validation fails
pub fn start_from<I, T>(args: I) -> Result<Action>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = commands::new().get_matches_from(args);

    telemetry::init(get_verbosity_level(matches.get_count("verbose")))?;

    handler(&matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_verbosity_level() {
        assert_eq!(get_verbosity_level(0), None);
        assert_eq!(get_verbosity_level(1), Some(tracing::Level::INFO));
        assert_eq!(get_verbosity_level(2), Some(tracing::Level::DEBUG));
        assert_eq!(get_verbosity_level(3), Some(tracing::Level::TRACE));
    }

    #[test]
    fn test_get_verbosity_level_saturates() {
        assert_eq!(get_verbosity_level(10), Some(tracing::Level::TRACE));
        assert_eq!(get_verbosity_level(u8::MAX), Some(tracing::Level::TRACE));
    }
}
