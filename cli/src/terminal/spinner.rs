// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Terminal UI & Logging
//!
//! 1.  **Global Logging**: Wires up `tracing` so that `info!`, `warn!`, etc.
//!     print cleanly to stderr without breaking the progress bar, and are
//!     also appended to the log file in the data directory.
//! 2.  **The Spinner**: Background animation while a profile replays. It
//!     alternates between the replay counter and a random tip.
//!
//! ## How the Spinner Works
//!
//! The spinner runs in a dedicated `tokio` task on a time-based cycle:
//!
//! * **0s - 2s**: Show Status (e.g., "Applied 3 of 12 rules...")
//! * **2s - 5s**: Show Random Tip
//! * **Repeat**

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use colored::*;
use indicatif::ProgressStyle;
use pfwd_common::insights;
use tracing::Span;
use tracing_indicatif::{IndicatifLayer, span_ext::IndicatifSpanExt};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::terminal::{colors, logging};

/// Total length of one text cycle (Status + Tip).
const CYCLE_MS: u128 = 5000;
/// How long the "Status" message stays visible at the start of a cycle.
const STATUS_MS: u128 = 2000;

/// Wires up the global tracing subscriber.
///
/// 1.  **Filter**: `RUST_LOG`, else `info` (or `debug` with `-v`).
/// 2.  **Formatter**: [`logging::PfwdFormatter`] on stderr.
/// 3.  **File**: the same events, plain and timestamped, appended to `log_file`.
/// 4.  **Indicatif**: Ensures logs print *above* the spinner line, not over it.
pub fn init_logging(verbosity: u8, log_file: Option<&Path>) {
    let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ]);
    let indicatif_layer = IndicatifLayer::new().with_progress_style(style);

    let default_directive = if verbosity > 0 { "debug" } else { "info" };
    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_directive},mio=error")));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .event_format(logging::PfwdFormatter::terminal(verbosity))
        .with_writer(indicatif_layer.get_stderr_writer());

    let file_layer = log_file.and_then(open_log).map(|file| {
        tracing_subscriber::fmt::layer()
            .event_format(logging::PfwdFormatter::file())
            .with_writer(Mutex::new(file))
            .with_filter(filter_fn(|meta| meta.target() != logging::PRINT_TARGET))
    });

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(formatting_layer)
        .with(file_layer)
        .with(indicatif_layer)
        .init();
}

/// The log file is optional; a read-only data directory must not stop the tool.
fn open_log(path: &Path) -> Option<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

/// The actual animation loop running in the background.
async fn run_spinner_loop<F>(span: Span, running: Arc<AtomicBool>, status_fn: Option<F>)
where
    F: Fn() -> ColoredString + Send + Sync + 'static,
{
    let mut interval = tokio::time::interval(Duration::from_millis(100));
    let start_time = tokio::time::Instant::now();
    let mut last_text = String::new();

    let active_insights = insights::get_shuffled_insights();

    while running.load(Ordering::Relaxed) {
        interval.tick().await;

        let elapsed_ms = start_time.elapsed().as_millis();
        let cycle_time = elapsed_ms % CYCLE_MS;

        let tip_index = (elapsed_ms / CYCLE_MS) as usize % active_insights.len().max(1);

        let colored_msg: ColoredString = match &status_fn {
            Some(status) if cycle_time < STATUS_MS => status(),
            _ => active_insights
                .get(tip_index)
                .copied()
                .unwrap_or_default()
                .italic()
                .color(colors::TEXT_DEFAULT),
        };

        let current_text = colored_msg.to_string();

        // Only redraw the terminal if the text actually changed.
        if current_text != last_text {
            span.pb_set_message(&current_text);
            last_text = current_text;
        }
    }
}

/// A RAII guard that keeps the spinner spinning.
///
/// Dropping it signals the background task to stop.
pub struct SpinnerGuard {
    running: Arc<AtomicBool>,
    handle: tokio::task::JoinHandle<()>,
}

impl SpinnerGuard {
    /// Starts a spinner that alternates between a dynamic status message and tips.
    pub fn with_status<F>(span: tracing::Span, status_fn: F) -> Self
    where
        F: Fn() -> ColoredString + Send + Sync + 'static,
    {
        Self::start(span, Some(status_fn))
    }

    fn start<F>(span: tracing::Span, status_fn: Option<F>) -> Self
    where
        F: Fn() -> ColoredString + Send + Sync + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let run_clone = running.clone();

        let handle = tokio::spawn(async move {
            run_spinner_loop(span, run_clone, status_fn).await;
        });

        Self { running, handle }
    }
}

impl Drop for SpinnerGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        self.handle.abort();
    }
}
