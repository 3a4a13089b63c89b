//! Tracing setup and build identification

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset. `robot` is the binary's own target.
pub const DEFAULT_DIRECTIVES: &str = "warn,robot=info,robot_cli=info,robot_common=info";

/// Filter used with `-v`
pub const VERBOSE_DIRECTIVES: &str = "warn,robot=debug,robot_cli=debug,robot_common=debug";

/// Effective filter: `-v` wins over `RUST_LOG`, which wins over the default
pub fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_DIRECTIVES)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
    }
}

/// Install the global subscriber; logs go to stderr, stdout carries records only
pub fn init(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .init();
}

/// Startup line identifying this build
pub fn build_banner() -> String {
    format!(
        "robot v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_build_banner_names_version_and_profile() {
        let banner = build_banner();
        assert!(banner.starts_with(&format!("robot v{} [", env!("CARGO_PKG_VERSION"))));
        assert!(banner.ends_with(&format!("({})", env!("BUILD_PROFILE"))));
    }

    #[test]
    fn test_default_filter_shows_startup_line_at_info() {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(DEFAULT_DIRECTIVES))
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(target: "robot", Level::INFO));
            assert!(!tracing::enabled!(target: "robot", Level::DEBUG));
        });
    }

    #[test]
    fn test_verbose_filter_enables_debug() {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(env_filter(true))
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(target: "robot_cli", Level::DEBUG));
        });
    }
}
