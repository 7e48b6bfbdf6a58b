//! Table of contents generation for the combined document.
//!
//! The `toc` Markdown extension replaces a `[TOC]` marker with a list of the
//! page's headings. After combining, the marker should list the headings of
//! the whole document, so the list is built here from the combined lines.
//! The slug rules are shared with the HTML renderer so the generated links
//! resolve there too.

use super::{AtxHeading, FenceTracker, Filter};
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

const MARKER: &str = "[TOC]";

lazy_static! {
    /// A trailing attribute list: `{: .class}`, `{#id .class}` and friends
    static ref ATTRIBUTES: Regex =
        Regex::new(r"\s*\{:?\s*([^{}]*)\}\s*$").expect("attribute list pattern is a valid regex");
}

/// Turn a heading title into an anchor: lower case, anything that isn't a
/// letter or digit collapses into single hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("section");
    }
    slug
}

/// Hands out unique slugs, suffixing repeats with `-1`, `-2`, ...
#[derive(Debug, Default)]
pub struct Slugger {
    used: HashSet<String>,
}

impl Slugger {
    pub fn slug(&mut self, title: &str) -> String {
        let base = slugify(title);
        let mut slug = base.clone();
        let mut n = 1;
        while self.used.contains(&slug) {
            slug = format!("{}-{}", base, n);
            n += 1;
        }
        self.used.insert(slug.clone());
        slug
    }

    /// Record an explicitly chosen id so generated slugs avoid it.
    pub fn claim(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }
}

/// A heading title with its attribute list removed, plus any explicit `{#id}`.
pub fn split_attributes(title: &str) -> (&str, Option<&str>) {
    match ATTRIBUTES.captures(title) {
        Some(caps) => {
            let id = caps
                .get(1)
                .and_then(|attrs| {
                    attrs
                        .as_str()
                        .split_whitespace()
                        .find_map(|attr| attr.strip_prefix('#'))
                })
                .filter(|id| !id.is_empty());
            let start = caps.get(0).map_or(title.len(), |m| m.start());
            (title[..start].trim_end(), id)
        }
        None => (title, None),
    }
}

/// A heading of the document with the anchor it ends up with
#[derive(Debug)]
pub struct TocEntry {
    pub level: usize,
    pub title: String,
    pub slug: String,
}

/// Every heading outside code, in order, slugged the way the table of
/// contents and the HTML renderer slug them.
pub fn headings(lines: &[String]) -> Vec<TocEntry> {
    let mut fences = FenceTracker::default();
    let mut slugger = Slugger::default();
    let mut entries = Vec::new();
    for line in lines {
        if fences.is_code(line) {
            continue;
        }
        let Some(heading) = AtxHeading::parse(line) else {
            continue;
        };
        let (title, id) = split_attributes(heading.text());
        let slug = match id {
            Some(id) => {
                slugger.claim(id);
                id.to_string()
            }
            None => slugger.slug(title),
        };
        entries.push(TocEntry {
            level: heading.level,
            title: title.to_string(),
            slug,
        });
    }
    entries
}

/// Replaces `[TOC]` markers with a nested list of links to every heading.
#[derive(Debug, Default)]
pub struct TocFilter;

impl TocFilter {
    pub fn new() -> TocFilter {
        TocFilter
    }

    fn render(entries: &[TocEntry]) -> Vec<String> {
        let top = entries.iter().map(|e| e.level).min().unwrap_or(1);
        entries
            .iter()
            .map(|entry| {
                format!(
                    "{}- [{}](#{})",
                    "    ".repeat(entry.level - top),
                    entry.title,
                    entry.slug
                )
            })
            .collect()
    }
}

impl Filter for TocFilter {
    fn name(&self) -> &'static str {
        "toc"
    }

    fn run(&self, lines: Vec<String>) -> Result<Vec<String>> {
        let mut fences = FenceTracker::default();
        let markers: Vec<bool> = lines
            .iter()
            .map(|line| !fences.is_code(line) && line.trim() == MARKER)
            .collect();
        if !markers.contains(&true) {
            return Ok(lines);
        }

        let toc = TocFilter::render(&headings(&lines));
        log::debug!("table of contents has {} entries", toc.len());

        let mut out = Vec::with_capacity(lines.len() + toc.len());
        for (line, is_marker) in lines.into_iter().zip(markers) {
            if is_marker {
                out.extend(toc.iter().cloned());
            } else {
                out.push(line);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn slugs_are_lowercase_and_hyphenated() {
        assert_eq!(slugify("Getting Started!"), "getting-started");
        assert_eq!(slugify("  C++ / Rust: FFI  "), "c-rust-ffi");
        assert_eq!(slugify("Ünïcode Tïtle"), "ünïcode-tïtle");
        assert_eq!(slugify("???"), "section");
    }

    #[test]
    fn repeated_slugs_get_numbered() {
        let mut slugger = Slugger::default();
        assert_eq!(slugger.slug("Usage"), "usage");
        assert_eq!(slugger.slug("Usage"), "usage-1");
        slugger.claim("usage-2");
        assert_eq!(slugger.slug("usage"), "usage-3");
    }

    #[test]
    fn attribute_lists_are_split_off() {
        assert_eq!(split_attributes("Intro {: .page-title}"), ("Intro", None));
        assert_eq!(split_attributes("Intro {#start .x}"), ("Intro", Some("start")));
        assert_eq!(split_attributes("Plain"), ("Plain", None));
    }

    #[test]
    fn markers_become_a_nested_list() {
        let out = TocFilter::new()
            .run(lines(&[
                "[TOC]",
                "",
                "# Index {.page-title}",
                "## Usage",
                "```",
                "# not a heading",
                "```",
                "# Guide",
                "## Usage",
                "### Deep Dive {#deep}",
            ]))
            .expect("infallible");
        assert_eq!(
            out[..6],
            lines(&[
                "- [Index](#index)",
                "    - [Usage](#usage)",
                "- [Guide](#guide)",
                "    - [Usage](#usage-1)",
                "        - [Deep Dive](#deep)",
                "",
            ])[..]
        );
        assert_eq!(out.len(), 14);
    }

    #[test]
    fn documents_without_markers_are_untouched() {
        let text = lines(&["# Title", "[TOC] is mentioned inline"]);
        assert_eq!(TocFilter::new().run(text.clone()).expect("infallible"), text);
    }
}
