// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot search command

use anyhow::Result;
use serde::Serialize;
use storysearch::config::Config;
use storysearch::model::Match;
use storysearch::render;
use storysearch::session::{SearchOutcome, SearchSession};

use crate::cli::OutputFormat;
use crate::query::{open_session, SnippetArgs, SourceArgs};

/// JSON output for one query
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchReport<'a> {
    query: &'a str,
    count_text: &'a str,
    total: usize,
    stories: usize,
    matches: &'a [Match],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// Render an outcome in the requested format
pub(crate) fn format_outcome(
    session: &SearchSession,
    outcome: &SearchOutcome,
    format: OutputFormat,
) -> Result<String> {
    let view = session.view(outcome);
    let rendered = match format {
        OutputFormat::Html => view.to_html(),
        OutputFormat::Text => render::render_text(
            &view,
            &outcome.matches,
            &outcome.query,
            &session.options().render,
            colored::control::SHOULD_COLORIZE.should_colorize(),
        ),
        OutputFormat::Json => {
            let report = SearchReport {
                query: &outcome.query,
                count_text: &view.count_text,
                total: outcome.matches.len(),
                stories: outcome.story_count(),
                matches: &outcome.matches,
                error: outcome.error.as_deref(),
            };
            serde_json::to_string_pretty(&report)?
        }
    };
    Ok(rendered)
}

/// Run the search command
pub async fn run(
    query: &str,
    sources: &SourceArgs<'_>,
    config: &Config,
    max_snippets: Option<usize>,
    max_chars: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let snippets = SnippetArgs {
        max_snippets,
        max_chars,
    };
    let session = open_session(sources, config, snippets).await?;
    let outcome = session.search(query);
    println!("{}", format_outcome(&session, &outcome, format)?);
    Ok(())
}
