#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal output for the `pubmetrics` binary.
//!
//! `harvest` draws a single bar over the configured repositories. `usage`
//! draws one bar per repository over its statistics requests. Both are
//! [`IndicatifProgress`] values handed to the library crates as
//! [`ProgressCallback`]s. [`init_logger`] suspends the bars while a `log`
//! line is printed.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use pubmetrics_harvest::progress::ProgressCallback;

pub use indicatif::MultiProgress;

const STATISTICS_TEMPLATE: &str = "  {msg} {wide_bar:.cyan/dim} {pos}/{len} records [{eta}]";
const HARVEST_TEMPLATE: &str =
    "{msg} {wide_bar:.green/dim} {pos}/{len} repositories [{elapsed_precise}]";

/// A repository or record bar drawn by `indicatif`.
pub struct IndicatifProgress {
    bar: ProgressBar,
    /// Applied by `set_total()`, when the spinner turns into a counted bar.
    counted_style: ProgressStyle,
}

impl IndicatifProgress {
    /// Bar for the statistics requests of one repository.
    ///
    /// Spins under the repository name while the harvest file is read, and
    /// becomes a counted bar with an ETA once the collector knows how many
    /// records it will query. A repository served from its usage cache
    /// never reports a count and finishes as a spinner.
    #[must_use]
    pub fn statistics_bar(multi: &MultiProgress, repository: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(repository.to_owned());

        Arc::new(Self {
            bar,
            counted_style: counted_style(STATISTICS_TEMPLATE),
        })
    }

    /// Bar over the `repositories` a harvest run visits.
    #[must_use]
    pub fn harvest_bar(multi: &MultiProgress, repositories: u64) -> Arc<dyn ProgressCallback> {
        let counted_style = counted_style(HARVEST_TEMPLATE);
        let bar = multi.add(ProgressBar::new(repositories));
        bar.set_style(counted_style.clone());
        bar.set_message("Harvesting");

        Arc::new(Self { bar, counted_style })
    }
}

fn counted_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(self.counted_style.clone());
    }

    fn advance(&self) {
        self.bar.inc(1);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Installs `pretty_env_logger` behind `indicatif-log-bridge` and returns
/// the [`MultiProgress`] every bar of the run must be added to.
///
/// The `pubmetrics` crates log at `info` unless `RUST_LOG` says otherwise.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .filter_module("pubmetrics", log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // Fails only when a logger is already installed.
    let _ = indicatif_log_bridge::LogWrapper::new(multi.clone(), logger).try_init();
    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden(template: &str) -> IndicatifProgress {
        IndicatifProgress {
            bar: ProgressBar::hidden(),
            counted_style: counted_style(template),
        }
    }

    #[test]
    fn set_total_restarts_the_count() {
        let progress = hidden(STATISTICS_TEMPLATE);
        progress.advance();

        progress.set_total(3);
        progress.advance();
        progress.advance();

        assert_eq!(progress.bar.length(), Some(3));
        assert_eq!(progress.bar.position(), 2);
    }

    #[test]
    fn finish_keeps_the_outcome_message() {
        let progress = hidden(HARVEST_TEMPLATE);
        progress.set_total(2);
        progress.advance();
        progress.finish("Harvested 2 repositories".to_owned());

        assert!(progress.bar.is_finished());
        assert_eq!(progress.bar.message(), "Harvested 2 repositories");
    }

    #[test]
    fn templates_parse() {
        assert!(ProgressStyle::with_template(STATISTICS_TEMPLATE).is_ok());
        assert!(ProgressStyle::with_template(HARVEST_TEMPLATE).is_ok());
    }
}
