//! Corpus statistics command

use anyhow::Result;
use colored::Colorize;
use storysearch::config::Config;

use crate::cli::OutputFormat;
use crate::query::{open_session, SnippetArgs, SourceArgs};

/// Run the stats command
pub async fn run(sources: &SourceArgs<'_>, config: &Config, format: OutputFormat) -> Result<()> {
    let session = open_session(sources, config, SnippetArgs::default()).await?;
    let stats = session.stats();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Html => {
            println!("<dl class=\"index-stats\">");
            println!("<dt>Stories</dt><dd>{}</dd>", stats.stories);
            println!("<dt>Paragraphs</dt><dd>{}</dd>", stats.paragraphs);
            println!("<dt>Words</dt><dd>{}</dd>", stats.words);
            println!("<dt>Avg words per story</dt><dd>{}</dd>", stats.avg_words_per_story);
            println!("<dt>Authors</dt><dd>{}</dd>", stats.authors);
            println!("<dt>Tags</dt><dd>{}</dd>", stats.tags);
            println!("</dl>");
        }
        OutputFormat::Text => {
            println!("{}", "Index Statistics".bold());
            println!("  Stories:    {}", stats.stories);
            println!("  Paragraphs: {}", stats.paragraphs);
            println!("  Words:      {}", stats.words);
            println!("  Avg words per story: {}", stats.avg_words_per_story);
            println!("  Authors:    {}", stats.authors);
            println!("  Tags:       {}", stats.tags);
            if stats.missing_metadata > 0 {
                println!(
                    "  {} {} stories have no metadata and never appear in results",
                    "!".yellow(),
                    stats.missing_metadata
                );
            }
            if stats.malformed_content > 0 {
                println!(
                    "  {} {} stories have malformed content",
                    "!".yellow(),
                    stats.malformed_content
                );
            }
        }
    }
    Ok(())
}
