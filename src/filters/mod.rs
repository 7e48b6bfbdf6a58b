//! Line filters that make a set of Markdown pages survive being merged into one.
//!
//! Every filter takes the lines of a page (or of the whole combined document),
//! and returns rewritten lines. Filters know nothing about each other; the
//! combiner is responsible for running them in the right order. Per-page
//! filters are constructed fresh for each page with that page's parameters.
//!
//! The filters work on text lines rather than a syntax tree. To keep them from
//! mangling code samples most of them skip fenced code blocks, tracked with
//! [`FenceTracker`].

use anyhow::Result;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

mod admonition;
mod anchor;
mod chapterhead;
mod exclude;
mod headlevel;
mod image;
mod include;
mod math;
mod metadata;
mod table;
pub mod toc;
mod xref;

pub use admonition::AdmonitionFilter;
pub use anchor::AnchorFilter;
pub use chapterhead::ChapterheadFilter;
pub use exclude::ExcludeFilter;
pub use headlevel::HeadlevelFilter;
pub use image::ImageFilter;
pub use include::IncludeFilter;
pub use math::MathFilter;
pub use metadata::MetadataFilter;
pub use table::TableFilter;
pub use toc::TocFilter;
pub use xref::{XrefFilter, XrefMode};

/// Deepest heading level Markdown supports
pub const MAX_HEADING_LEVEL: usize = 6;

/// A single stage of the conversion pipeline.
pub trait Filter {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Rewrite a sequence of lines.
    fn run(&self, lines: Vec<String>) -> Result<Vec<String>>;
}

/// Run `lines` through each filter in turn.
pub fn apply(filters: &[Box<dyn Filter + '_>], lines: Vec<String>) -> Result<Vec<String>> {
    filters.iter().try_fold(lines, |lines, filter| {
        log::trace!("running {} filter over {} lines", filter.name(), lines.len());
        filter.run(lines)
    })
}

/// Tracks whether a line sits inside a fenced (```` ``` ```` or `~~~`) code block.
#[derive(Debug, Default)]
pub struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    /// Feed the next line; returns true if the line is code, fence lines included.
    pub fn is_code(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start_matches(' ');
        if line.len() - trimmed.len() > 3 && self.open.is_none() {
            return false;
        }
        let marker = trimmed.chars().next();
        let run = match marker {
            Some(c @ ('`' | '~')) => trimmed.chars().take_while(|&x| x == c).count(),
            _ => 0,
        };

        match (self.open, marker) {
            (Some((fence, len)), Some(c)) if c == fence && run >= len => {
                // a closing fence can't carry an info string
                if trimmed[run * c.len_utf8()..].trim().is_empty() {
                    self.open = None;
                }
                true
            }
            (Some(_), _) => true,
            (None, Some(c)) if run >= 3 => {
                self.open = Some((c, run));
                true
            }
            (None, _) => false,
        }
    }

    /// Whether a fence is currently open
    pub fn in_block(&self) -> bool {
        self.open.is_some()
    }
}

/// An ATX (`#`-prefixed) heading split into its parts.
#[derive(Debug, PartialEq, Eq)]
pub struct AtxHeading<'a> {
    pub indent: &'a str,
    pub level: usize,
    /// Everything after the `#` run, leading whitespace included
    pub rest: &'a str,
}

impl<'a> AtxHeading<'a> {
    pub fn parse(line: &'a str) -> Option<AtxHeading<'a>> {
        let trimmed = line.trim_start_matches(' ');
        let indent = line.len() - trimmed.len();
        if indent > 3 {
            return None;
        }
        let level = trimmed.bytes().take_while(|&b| b == b'#').count();
        if level == 0 || level > MAX_HEADING_LEVEL {
            return None;
        }
        let rest = &trimmed[level..];
        if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
            return None;
        }
        Some(AtxHeading {
            indent: &line[..indent],
            level,
            rest,
        })
    }

    /// The heading text without the optional closing `#` run
    pub fn text(&self) -> &'a str {
        let text = self.rest.trim();
        let without_closing = text.trim_end_matches('#');
        if without_closing.is_empty() || without_closing.ends_with([' ', '\t']) {
            without_closing.trim_end()
        } else {
            text
        }
    }
}

lazy_static! {
    /// `[text](target "title")`, with a leading `!` for images
    static ref INLINE_LINK: Regex = Regex::new(
        r#"(!?)\[([^\[\]]*)\]\(\s*([^\s()]+)(?:\s+(?:"([^"]*)"|'([^']*)'))?\s*\)"#
    )
    .expect("inline link pattern is a valid regex");
}

/// An inline Markdown link or image found in a line.
#[derive(Debug)]
pub struct InlineLink<'a> {
    pub is_image: bool,
    pub text: &'a str,
    pub target: &'a str,
    pub title: Option<&'a str>,
}

impl<'a> InlineLink<'a> {
    fn from_captures(caps: &Captures<'a>) -> InlineLink<'a> {
        InlineLink {
            is_image: !caps[1].is_empty(),
            text: caps.get(2).map_or("", |m| m.as_str()),
            target: caps.get(3).map_or("", |m| m.as_str()),
            title: caps.get(4).or_else(|| caps.get(5)).map(|m| m.as_str()),
        }
    }

    /// Render back to Markdown, keeping the image marker
    pub fn to_markdown(&self) -> String {
        let bang = if self.is_image { "!" } else { "" };
        match self.title {
            Some(title) => format!(r#"{bang}[{}]({} "{}")"#, self.text, self.target, title),
            None => format!("{bang}[{}]({})", self.text, self.target),
        }
    }
}

/// Replace every inline link in `line` with the output of `rewrite`; `None` keeps the link as is.
pub fn rewrite_links<F>(line: &str, mut rewrite: F) -> String
where
    F: FnMut(&InlineLink<'_>) -> Option<String>,
{
    INLINE_LINK
        .replace_all(line, |caps: &Captures<'_>| {
            let link = InlineLink::from_captures(caps);
            rewrite(&link).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// True for targets that point outside the site: `scheme://`, `mailto:`, `data:` and the like
pub fn is_external(target: &str) -> bool {
    match target.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fences_are_tracked() {
        let mut fences = FenceTracker::default();
        let lines = ["text", "````rust", "# not a heading", "```", "````", "after"];
        let code: Vec<bool> = lines.iter().map(|l| fences.is_code(l)).collect();
        assert_eq!(code, vec![false, true, true, true, true, false]);

        let mut fences = FenceTracker::default();
        assert!(fences.is_code("~~~~"));
        assert!(fences.is_code("~~~"));
        assert!(fences.is_code("~~~~"));
        assert!(!fences.is_code("done"));
    }

    #[test]
    fn atx_headings_are_parsed() {
        let heading = AtxHeading::parse("## Install ##").expect("is a heading");
        assert_eq!(heading.level, 2);
        assert_eq!(heading.text(), "Install");
        assert_eq!(AtxHeading::parse("#").map(|h| h.level), Some(1));
        assert_eq!(AtxHeading::parse("   # Indented").map(|h| h.level), Some(1));
        assert_eq!(AtxHeading::parse("#hashtag"), None);
        assert_eq!(AtxHeading::parse("####### seven"), None);
        assert_eq!(AtxHeading::parse("    # code"), None);
        assert_eq!(
            AtxHeading::parse("# C#").map(|h| h.text()),
            Some("C#")
        );
    }

    #[test]
    fn links_can_be_rewritten_selectively() {
        let line = r#"See ![logo](img/logo.png) and [docs](guide.md "Guide")."#;
        let rewritten = rewrite_links(line, |link| {
            (!link.is_image).then(|| format!("{}|{}", link.text, link.title.unwrap_or("")))
        });
        assert_eq!(rewritten, "See ![logo](img/logo.png) and docs|Guide.");
    }

    #[test]
    fn external_targets_are_recognised() {
        assert!(is_external("https://example.com/a.md"));
        assert!(is_external("mailto:someone@example.com"));
        assert!(is_external("data:image/png;base64,AAAA"));
        assert!(!is_external("guide/install.md"));
        assert!(!is_external("../img/logo.png"));
    }
}
