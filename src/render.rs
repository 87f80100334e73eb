// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering of matches into escaped, highlighted result cards
//!
//! Everything interpolated into HTML goes through [`escape_html`] first.
//! Highlighting runs over the escaped text with the query treated as a
//! literal pattern, then the snippet is truncated.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use colored::Colorize;
use regex::{Captures, Regex, RegexBuilder};
use serde::Serialize;

use crate::model::Match;

/// Maximum snippet length in characters, excluding the ellipsis
pub const SNIPPET_MAX_CHARS: usize = 400;

const ELLIPSIS: &str = "...";
const SEARCH_ERROR_TEXT: &str = "A search error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub snippet_max_chars: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            snippet_max_chars: SNIPPET_MAX_CHARS,
        }
    }
}

/// What the results area should show after a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultsView {
    pub count_text: String,
    pub show_no_results: bool,
    pub show_results: bool,
    pub cards: Vec<String>,
}

impl ResultsView {
    /// Cleared display for an empty query
    pub fn cleared() -> Self {
        Self {
            count_text: String::new(),
            show_no_results: false,
            show_results: false,
            cards: Vec::new(),
        }
    }

    pub fn search_error() -> Self {
        Self {
            count_text: SEARCH_ERROR_TEXT.to_string(),
            ..Self::cleared()
        }
    }

    /// Results area as an HTML fragment
    pub fn to_html(&self) -> String {
        let mut out = format!(
            "<p class=\"results-count\">{}</p>\n",
            escape_html(&self.count_text)
        );
        if self.show_no_results {
            out.push_str("<div class=\"no-results\">No stories matched your search.</div>\n");
        }
        if self.show_results {
            out.push_str("<div class=\"results\">\n");
            for card in &self.cards {
                out.push_str(card);
                out.push('\n');
            }
            out.push_str("</div>\n");
        }
        out
    }
}

/// Escape text for interpolation into HTML text or attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// `"{N} match|matches in {M} story|stories"`
pub fn count_text(total: usize, stories: usize) -> String {
    format!(
        "{} {} in {} {}",
        total,
        if total == 1 { "match" } else { "matches" },
        stories,
        if stories == 1 { "story" } else { "stories" }
    )
}

/// Case-insensitive literal pattern for `query`, metacharacters escaped
fn literal_pattern(query: &str) -> Option<Regex> {
    if query.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Escape the snippet, then wrap every occurrence of the query in `<mark>`
pub fn highlight(snippet: &str, query: &str) -> String {
    let escaped = escape_html(snippet);
    match literal_pattern(query) {
        Some(re) => re
            .replace_all(&escaped, |caps: &Captures| format!("<mark>{}</mark>", &caps[0]))
            .into_owned(),
        None => escaped,
    }
}

/// Cut `text` to at most `max_chars` characters.
///
/// The cut moves back to the last space when that space sits within the
/// final 20% of the limit; otherwise the cut is hard. An ellipsis is appended
/// whenever anything was removed.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len());
    let head = &text[..cut];
    let min_boundary = max_chars * 4 / 5;

    let kept = match head.rfind(' ') {
        Some(space) if head[..space].chars().count() >= min_boundary => &head[..space],
        _ => head,
    };
    format!("{kept}{ELLIPSIS}")
}

/// Long US-style date (`March 9, 2024`), the raw string if it does not
/// parse, or blank when absent
pub fn format_date(date: Option<&str>) -> String {
    let Some(raw) = date.map(str::trim).filter(|d| !d.is_empty()) else {
        return String::new();
    };
    match parse_date(raw) {
        Some(parsed) => parsed.format("%B %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// One result card as an HTML fragment
pub fn render_card(m: &Match, query: &str, options: &RenderOptions) -> String {
    let snippet = truncate_snippet(&highlight(&m.snippet_text, query), options.snippet_max_chars);

    let mut card = format!(
        "<article class=\"result-card\" data-story-id=\"{}\" data-paragraph=\"{}\">\n",
        m.document_id, m.paragraph_index
    );
    card.push_str(&format!(
        "  <h3 class=\"result-title\"><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a></h3>\n",
        escape_html(&m.url),
        escape_html(&m.title)
    ));
    if let Some(subtitle) = m.subtitle.as_deref() {
        card.push_str(&format!(
            "  <p class=\"result-subtitle\">{}</p>\n",
            escape_html(subtitle)
        ));
    }
    card.push_str(&format!(
        "  <p class=\"result-meta\"><span class=\"result-author\">{}</span> <span class=\"result-date\">{}</span></p>\n",
        escape_html(&m.author),
        escape_html(&format_date(m.date.as_deref()))
    ));
    card.push_str(&format!("  <p class=\"result-snippet\">{snippet}</p>\n"));
    if !m.tags.is_empty() {
        card.push_str("  <ul class=\"result-tags\">");
        for tag in &m.tags {
            card.push_str(&format!("<li>{}</li>", escape_html(tag)));
        }
        card.push_str("</ul>\n");
    }
    card.push_str("</article>");
    card
}

/// Build the results view for a completed query
pub fn render_results(matches: &[Match], query: &str, options: &RenderOptions) -> ResultsView {
    let query = query.trim();
    if query.is_empty() {
        return ResultsView::cleared();
    }

    let mut stories: Vec<u64> = matches.iter().map(|m| m.document_id).collect();
    stories.sort_unstable();
    stories.dedup();

    ResultsView {
        count_text: count_text(matches.len(), stories.len()),
        show_no_results: matches.is_empty(),
        show_results: !matches.is_empty(),
        cards: matches
            .iter()
            .map(|m| render_card(m, query, options))
            .collect(),
    }
}

/// Colorize a matched fragment for terminal output
fn colorize_match(text: &str, use_color: bool) -> String {
    if use_color {
        text.red().bold().to_string()
    } else {
        text.to_string()
    }
}

/// Plain-text rendition of a view's matches for terminals
pub fn render_text(
    view: &ResultsView,
    matches: &[Match],
    query: &str,
    options: &RenderOptions,
    use_color: bool,
) -> String {
    let mut out = String::new();
    if !view.count_text.is_empty() {
        out.push_str(&view.count_text);
        out.push('\n');
    }
    if view.show_no_results {
        out.push_str(&format!("No stories matched '{}'\n", query.trim()));
    }
    if !view.show_results {
        return out;
    }

    let pattern = literal_pattern(query.trim());
    for m in matches {
        let snippet = truncate_snippet(&m.snippet_text, options.snippet_max_chars);
        let snippet = match (&pattern, use_color) {
            (Some(re), true) => re
                .replace_all(&snippet, |caps: &Captures| colorize_match(&caps[0], true))
                .into_owned(),
            _ => snippet,
        };

        out.push('\n');
        let title = if use_color {
            m.title.bold().to_string()
        } else {
            m.title.clone()
        };
        out.push_str(&title);
        if let Some(subtitle) = m.subtitle.as_deref() {
            out.push_str(" - ");
            out.push_str(subtitle);
        }
        out.push('\n');

        let date = format_date(m.date.as_deref());
        let byline = if date.is_empty() {
            m.author.clone()
        } else {
            format!("{} · {}", m.author, date)
        };
        out.push_str(&format!("{}  [{}]\n", byline, m.url));
        out.push_str(&format!("  ¶{} {}\n", m.paragraph_index + 1, snippet));
    }
    out
}
