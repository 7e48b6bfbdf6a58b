use super::toc::{headings, slugify};
use super::{is_external, rewrite_links, FenceTracker, Filter, InlineLink, MAX_HEADING_LEVEL};
use crate::pages::{title_from_filename, PageDescriptor};
use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

/// What to do with links between pages of the site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefMode {
    /// Drop the link and keep only its title
    Replace,
    /// Point the link at the target's heading inside the combined document
    Normalize,
}

/// Fixes links from one page of the site to another.
///
/// A link such as `[Installing](install.md)` means nothing once every page is
/// part of the same document. Depending on the mode it is either flattened to
/// its title, or turned into an in-document link to the heading the target
/// page now starts with.
#[derive(Debug)]
pub struct XrefFilter {
    mode: XrefMode,
    /// Page paths with forward slashes, alongside their titles
    titles: Vec<(String, String)>,
    /// The pages that made it into the document, in order
    present: Vec<PageDescriptor>,
}

fn slashed(file: &Path) -> String {
    file.to_string_lossy().replace('\\', "/")
}

impl XrefFilter {
    pub fn new(mode: XrefMode, pages: &[PageDescriptor]) -> XrefFilter {
        let titles = pages
            .iter()
            .filter_map(|page| Some((slashed(page.file.as_ref()?), page.title.clone())))
            .collect();
        XrefFilter {
            mode,
            titles,
            present: pages.to_vec(),
        }
    }

    /// Restrict the pages expected in the document, e.g. when some were excluded.
    pub fn in_document(mut self, pages: &[PageDescriptor]) -> XrefFilter {
        self.present = pages.to_vec();
        self
    }

    /// The site file a link path refers to, with its title
    fn lookup(&self, path: &str) -> Option<&(String, String)> {
        let wanted = path
            .split('/')
            .filter(|part| !matches!(*part, "" | "." | ".."))
            .collect::<Vec<_>>()
            .join("/");
        self.titles
            .iter()
            .find(|(file, _)| *file == wanted || file.ends_with(&format!("/{}", wanted)))
    }

    /// Title of the page a link points at, derived from its file name when it isn't in the site
    fn page_title(&self, path: &str) -> String {
        self.lookup(path)
            .map(|(_, title)| title.clone())
            .unwrap_or_else(|| title_from_filename(Path::new(path)))
    }

    /// Anchors the chapter heads of the present pages receive, keyed by file.
    ///
    /// Chapter heads are found by walking the document's headings alongside
    /// the page list: a heading is the next page's chapter head when its level
    /// and title match it.
    fn chapter_anchors(&self, lines: &[String]) -> HashMap<String, String> {
        let mut anchors = HashMap::new();
        let mut expected = self.present.iter().peekable();
        for heading in headings(lines) {
            let Some(page) = expected.peek() else {
                break;
            };
            if heading.level == page.level.clamp(1, MAX_HEADING_LEVEL) && heading.title == page.title
            {
                if let Some(file) = &page.file {
                    anchors.insert(slashed(file), heading.slug);
                }
                expected.next();
            }
        }
        anchors
    }

    fn rewrite(&self, link: &InlineLink<'_>, anchors: &HashMap<String, String>) -> Option<String> {
        if link.is_image || link.target.starts_with('#') || is_external(link.target) {
            return None;
        }
        let (path, fragment) = match link.target.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (link.target, None),
        };
        if !path.to_ascii_lowercase().ends_with(".md") {
            return None;
        }

        let text = Some(link.text.trim()).filter(|text| !text.is_empty());
        match self.mode {
            XrefMode::Replace => Some(
                link.title
                    .or(text)
                    .map(str::to_string)
                    .unwrap_or_else(|| self.page_title(path)),
            ),
            XrefMode::Normalize => {
                let page_title = self.page_title(path);
                let anchor = match fragment.filter(|f| !f.is_empty()) {
                    Some(fragment) => fragment.to_string(),
                    None => self
                        .lookup(path)
                        .and_then(|(file, _)| anchors.get(file))
                        .cloned()
                        .unwrap_or_else(|| slugify(&page_title)),
                };
                let target = format!("#{}", anchor);
                let normalized = InlineLink {
                    is_image: false,
                    text: text.unwrap_or(&page_title),
                    target: &target,
                    title: link.title,
                };
                Some(normalized.to_markdown())
            }
        }
    }
}

impl Filter for XrefFilter {
    fn name(&self) -> &'static str {
        "xref"
    }

    fn run(&self, lines: Vec<String>) -> Result<Vec<String>> {
        let anchors = match self.mode {
            XrefMode::Normalize => self.chapter_anchors(&lines),
            XrefMode::Replace => HashMap::new(),
        };
        let mut fences = FenceTracker::default();
        Ok(lines
            .into_iter()
            .map(|line| {
                if fences.is_code(&line) || !line.contains("](") {
                    line
                } else {
                    rewrite_links(&line, |link| self.rewrite(link, &anchors))
                }
            })
            .collect())
    }
}
