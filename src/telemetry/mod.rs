//! 观测性初始化脚手架。

pub mod events;

use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// 控制台日志始终开启；设置 `KAIWA_LOG_DIR` 时追加按天滚动的
/// JSON 文件层。
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false);

    let file_layer = std::env::var("KAIWA_LOG_DIR").ok().map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, "kaiwa-core.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer().json().with_writer(writer)
    });

    let subscriber = Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber).expect("failed to set global subscriber");
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    #[test]
    fn rolling_appender_writes_to_log_dir() {
        let dir = tempdir().expect("tempdir for log files");
        {
            let appender = tracing_appender::rolling::daily(dir.path(), "kaiwa-core.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let subscriber = tracing_subscriber::fmt()
                .json()
                .with_writer(writer)
                .finish();
            tracing::subscriber::with_default(subscriber, || {
                tracing::info!(target: "telemetry::turn_loop", "file sink smoke");
            });
            drop(guard);
        }

        let mut found = false;
        for entry in std::fs::read_dir(dir.path()).expect("read log dir") {
            let entry = entry.expect("dir entry");
            let content = std::fs::read_to_string(entry.path()).expect("read log file");
            if content.contains("file sink smoke") {
                found = true;
            }
        }
        assert!(found, "log line should reach the rolling file");
    }
}
