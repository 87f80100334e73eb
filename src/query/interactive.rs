// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interactive search over stdin
//!
//! Each input line replaces the current search box value. Queries run once
//! input has been idle for the debounce delay; a line holding only ESC
//! clears the box and prints the empty result at once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use storysearch::config::Config;
use storysearch::debounce::Debouncer;
use storysearch::session::SearchSession;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::cli::OutputFormat;
use crate::query::search::format_outcome;
use crate::query::{open_session, SnippetArgs, SourceArgs};

const ESCAPE: &str = "\u{1b}";

/// What a single line of input asks for
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Clear,
    Query(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let line = line.trim_end_matches('\r');
    if line == ESCAPE {
        Input::Clear
    } else {
        Input::Query(line)
    }
}

/// Orders printed results by input. Every input line takes a new
/// generation; a result is printed only while its generation is the latest.
#[derive(Debug, Default)]
struct OutputGate {
    generation: Mutex<u64>,
}

impl OutputGate {
    fn lock(&self) -> MutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn advance(&self) -> u64 {
        let mut generation = self.lock();
        *generation += 1;
        *generation
    }

    /// Print unless a newer input arrived; returns whether it printed
    fn print_if_current(&self, generation: u64, rendered: &str) -> bool {
        let current = self.lock();
        if *current != generation {
            debug!(generation, latest = *current, "dropping superseded results");
            return false;
        }
        println!("{rendered}");
        true
    }
}

fn emit(
    session: &SearchSession,
    query: &str,
    format: OutputFormat,
    gate: &OutputGate,
    generation: u64,
) {
    let outcome = session.search(query);
    match format_outcome(session, &outcome, format) {
        Ok(rendered) => {
            gate.print_if_current(generation, &rendered);
        }
        Err(e) => warn!(error = %e, "failed to render results"),
    }
}

/// Run the interactive command
pub async fn run(
    sources: &SourceArgs<'_>,
    config: &Config,
    debounce_ms: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let session = Arc::new(open_session(sources, config, SnippetArgs::default()).await?);
    let mut debouncer = Debouncer::new(config.merge_debounce(debounce_ms));
    debug!(delay_ms = debouncer.delay().as_millis() as u64, "reading queries from stdin");

    let gate = Arc::new(OutputGate::default());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let generation = gate.advance();
        match classify(&line) {
            Input::Clear => {
                debouncer.cancel();
                emit(&session, "", format, &gate, generation);
            }
            Input::Query(query) => {
                let session = Arc::clone(&session);
                let gate = Arc::clone(&gate);
                let query = query.to_string();
                debouncer.schedule(move || emit(&session, &query, format, &gate, generation));
            }
        }
    }

    debouncer.flush().await;
    Ok(())
}
