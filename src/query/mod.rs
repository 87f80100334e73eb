//! Query module - search, interactive and stats commands

pub mod interactive;
pub mod search;
pub mod stats;

use std::io::IsTerminal;

use anyhow::{Context, Result};
use storysearch::config::Config;
use storysearch::loader::Sources;
use storysearch::pipeline::PipelineOptions;
use storysearch::render::RenderOptions;
use storysearch::session::{SearchSession, SessionOptions};
use storysearch::status::StatusIndicator;
use tracing::info;

/// Source overrides given on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceArgs<'a> {
    pub index: Option<&'a str>,
    pub metadata: Option<&'a str>,
}

/// Snippet limits given on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct SnippetArgs {
    pub max_snippets: Option<usize>,
    pub max_chars: Option<usize>,
}

fn session_options(config: &Config, snippets: SnippetArgs) -> SessionOptions {
    SessionOptions {
        index: config.index.clone(),
        pipeline: PipelineOptions {
            result_limit: config.result_limit(),
            max_snippets_per_story: config.merge_max_snippets(snippets.max_snippets),
        },
        render: RenderOptions {
            snippet_max_chars: config.merge_snippet_max_chars(snippets.max_chars),
        },
    }
}

/// Load the corpus behind a loading spinner and build the session
pub(crate) async fn open_session(
    sources: &SourceArgs<'_>,
    config: &Config,
    snippets: SnippetArgs,
) -> Result<SearchSession> {
    let sources = Sources::new(
        &config.merge_index_source(sources.index),
        &config.merge_metadata_source(sources.metadata),
    )
    .with_timeout(config.fetch_timeout());

    let mut status = StatusIndicator::start(std::io::stderr().is_terminal());
    match SearchSession::load(&sources, session_options(config, snippets)).await {
        Ok(session) => {
            status.ready();
            info!(stories = session.documents().len(), "session ready");
            Ok(session)
        }
        Err(e) => {
            status.fail(&e.to_string());
            Err(e).with_context(|| {
                format!(
                    "Failed to load stories from {} and {}",
                    sources.index, sources.metadata
                )
            })
        }
    }
}
