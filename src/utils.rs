use std::fmt::Display;
use std::sync::LazyLock;
use std::time::Instant;

use console::Style;
use indicatif::ProgressStyle;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const ANSI_BLUE: Style = Style::new().blue();

static STYLE_BAR: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .expect("invalid progress bar template")
        .progress_chars("#>-")
});

static STYLE_TASK: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {span_child_prefix}{msg}")
        .expect("invalid progress bar template")
});

pub(crate) fn get_style_bar() -> ProgressStyle {
    STYLE_BAR.clone()
}

pub(crate) fn get_style_task() -> ProgressStyle {
    STYLE_TASK.clone()
}

/// Renders the time elapsed since `start`, e.g. `(+12ms)`.
pub fn as_overhead(start: Instant) -> impl Display {
    let spent = start.elapsed().as_millis();
    ANSI_BLUE.apply_to(format!("(+{spent}ms)"))
}

/// Installs the tracing subscriber with progress-aware output.
///
/// Log lines route through the progress bar writer so they don't tear
/// active bars. The filter honors `RUST_LOG` and defaults to `info`.
/// Calling this twice is harmless.
pub fn init_logging() {
    let indicatif_layer = IndicatifLayer::new();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(indicatif_layer.get_stderr_writer())
        .with_target(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(indicatif_layer)
        .try_init();
}
