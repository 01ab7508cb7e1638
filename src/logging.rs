use std::backtrace::Backtrace;

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{AppConfig, defaults::DEFAULT_RUST_LOG};

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt().with_env_filter(filter).with_target(false).init();
    set_panic_hook();
}

/// Level for the subscriber installed at startup. Falls back to the default
/// when the config failed to load, so the load error still gets printed.
pub fn startup_log_level(cfg: Option<&AppConfig>) -> &str {
    cfg.map_or(DEFAULT_RUST_LOG, |cfg| cfg.logging.rust_log.as_str())
}

fn set_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let message = panic_message(info.payload());
        let backtrace = Backtrace::capture();

        match info.location() {
            Some(location) => tracing::error!(
                panic = %message,
                location = %location,
                backtrace = %backtrace,
                "panic"
            ),
            None => tracing::error!(panic = %message, backtrace = %backtrace, "panic"),
        }
    }));
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::{panic_message, startup_log_level};
    use crate::config::{AppConfig, defaults::DEFAULT_RUST_LOG};

    #[test]
    fn startup_level_survives_a_failed_config_load() {
        assert_eq!(startup_log_level(None), DEFAULT_RUST_LOG);

        let mut cfg = AppConfig::default();
        cfg.logging.rust_log = "debug".to_string();
        assert_eq!(startup_log_level(Some(&cfg)), "debug");
    }

    #[test]
    fn extracts_static_and_owned_payloads() {
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("boom"));
        let borrowed: Box<dyn std::any::Any + Send> = Box::new("bang");
        let other: Box<dyn std::any::Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(owned.as_ref()), "boom");
        assert_eq!(panic_message(borrowed.as_ref()), "bang");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
