// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loading / ready / error indicator
//!
//! Drives an indicatif spinner on stderr while the corpus loads. The spinner
//! hides itself when stderr is not a terminal.

use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiState {
    Loading,
    Ready,
    /// Permanent for the rest of the session
    Error(String),
}

#[derive(Debug)]
pub struct StatusIndicator {
    spinner: ProgressBar,
    state: UiState,
}

impl StatusIndicator {
    /// Enter the loading state, showing a spinner when `visible`
    pub fn start(visible: bool) -> Self {
        let spinner = if visible {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
                spinner.set_style(style);
            }
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        } else {
            ProgressBar::hidden()
        };
        spinner.set_message("Loading stories...");
        Self {
            spinner,
            state: UiState::Loading,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn ready(&mut self) {
        if matches!(self.state, UiState::Error(_)) {
            return;
        }
        self.spinner.finish_and_clear();
        self.state = UiState::Ready;
    }

    /// Switch to the error state. Later calls to [`StatusIndicator::ready`]
    /// are ignored.
    pub fn fail(&mut self, message: &str) {
        self.spinner
            .abandon_with_message(format!("{} {}", "✗".red(), "Failed to load stories"));
        self.state = UiState::Error(message.to_string());
    }
}

impl Drop for StatusIndicator {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
