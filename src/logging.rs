use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset
fn default_filter(crate_name: &str) -> String {
    format!("info,{crate_name}=info,mcp_weather=info,rmcp=warn,hyper=warn,reqwest=warn")
}

/// Creates `dir` if needed and returns a daily-rotated appender writing
/// `<dir>/<component>.log.YYYY-MM-DD`.
pub fn daily_appender(dir: &Path, component: &str) -> Result<tracing_appender::rolling::RollingFileAppender> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    Ok(tracing_appender::rolling::daily(dir, format!("{component}.log")))
}

/// Installs the global subscriber: stderr always, plus a rotated file under
/// `log_dir` when given.
///
/// stdout is never written to; the server's stdio transport owns it. The
/// returned guard flushes the file writer and must live until exit.
pub fn init(crate_name: &str, component: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(crate_name)));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let (writer, guard) = tracing_appender::non_blocking(daily_appender(dir, component)?);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}
