use super::constants::{APP_NAME_LOWER, ENV_LOG};

/// Install a compact `tracing` subscriber for an embedding application.
///
/// The filter comes from `STATSVIEW_LOG`, then `RUST_LOG`, then defaults to
/// `info`. Does nothing if a global subscriber is already installed.
pub fn init_logging() {
    let filter = log_filter(|key| std::env::var(key).ok());

    let installed = tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(true)
        .compact()
        .with_env_filter(filter)
        .try_init()
        .is_ok();

    if !installed {
        tracing::debug!("Global subscriber already installed, keeping it");
    }
}

fn log_filter<F>(env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env(ENV_LOG)
        .or_else(|| env("RUST_LOG"))
        .unwrap_or_else(|| format!("info,{}=info", APP_NAME_LOWER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_default() {
        assert_eq!(log_filter(|_| None), "info,statsview=info");
    }

    #[test]
    fn test_log_filter_precedence() {
        let filter = log_filter(|key| match key {
            "STATSVIEW_LOG" => Some("statsview=trace".to_string()),
            "RUST_LOG" => Some("warn".to_string()),
            _ => None,
        });
        assert_eq!(filter, "statsview=trace");

        let filter = log_filter(|key| (key == "RUST_LOG").then(|| "warn".to_string()));
        assert_eq!(filter, "warn");
    }

    #[test]
    fn test_init_logging_twice_is_harmless() {
        init_logging();
        init_logging();
    }
}
