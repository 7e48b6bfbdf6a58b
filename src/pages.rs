//! The site's page tree and its flattening into reading order.
//!
//! MkDocs describes a site as a nested list of pages and sections. When the
//! site is combined into a single document that tree has to become a flat list
//! where every entry remembers how deep it was nested, since the nesting depth
//! decides the heading level of the page's chapter head and how far its own
//! headings get pushed down.

use std::path::{Path, PathBuf};

/// One node of the site's page tree, as declared in the site configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageNode {
    /// A page backed by a Markdown file, optionally with an explicit title
    Leaf {
        file: PathBuf,
        title: Option<String>,
    },
    /// A titled group of pages with no content of its own
    Section {
        title: String,
        children: Vec<PageNode>,
    },
}

impl PageNode {
    pub fn leaf<P: Into<PathBuf>>(file: P) -> PageNode {
        PageNode::Leaf {
            file: file.into(),
            title: None,
        }
    }

    pub fn titled<P: Into<PathBuf>, S: ToString>(file: P, title: S) -> PageNode {
        PageNode::Leaf {
            file: file.into(),
            title: Some(title.to_string()),
        }
    }

    pub fn section<S: ToString>(title: S, children: Vec<PageNode>) -> PageNode {
        PageNode::Section {
            title: title.to_string(),
            children,
        }
    }
}

/// A page (or section heading) at its position in the combined document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    /// The page's source file relative to the docs directory; `None` for a section
    pub file: Option<PathBuf>,
    pub title: String,
    /// Nesting depth, starting at 1 for top level pages
    pub level: usize,
}

impl PageDescriptor {
    pub fn is_section(&self) -> bool {
        self.file.is_none()
    }
}

/// Flatten the page tree depth-first into document order, starting at level 1.
pub fn flatten(pages: &[PageNode]) -> Vec<PageDescriptor> {
    let mut flattened = Vec::new();
    flatten_into(pages, 1, &mut flattened);
    flattened
}

fn flatten_into(pages: &[PageNode], level: usize, flattened: &mut Vec<PageDescriptor>) {
    for page in pages {
        match page {
            PageNode::Leaf { file, title } => flattened.push(PageDescriptor {
                file: Some(file.clone()),
                title: title.clone().unwrap_or_else(|| title_from_filename(file)),
                level,
            }),
            PageNode::Section { title, children } => {
                // the section's own heading comes first, then its children one level deeper
                flattened.push(PageDescriptor {
                    file: None,
                    title: title.clone(),
                    level,
                });
                flatten_into(children, level + 1, flattened);
            }
        }
    }
}

/// Derive a human readable title from a page's file name.
///
/// The extension and any directories are dropped, hyphens and underscores
/// become spaces and every word is title-cased, so `user-guide/getting_started.md`
/// becomes `Getting Started`.
pub fn title_from_filename(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    stem.replace(['-', '_'], " ")
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn files(pages: &[PageDescriptor]) -> Vec<Option<PathBuf>> {
        pages.iter().map(|p| p.file.clone()).collect()
    }

    #[test]
    fn flattening_preserves_declaration_order() {
        let tree = vec![
            PageNode::leaf("index.md"),
            PageNode::section(
                "User Guide",
                vec![
                    PageNode::titled("guide/install.md", "Installing"),
                    PageNode::section("Advanced", vec![PageNode::leaf("guide/tuning.md")]),
                    PageNode::leaf("guide/usage.md"),
                ],
            ),
            PageNode::leaf("about.md"),
        ];

        let pages = flatten(&tree);
        assert_eq!(
            files(&pages),
            vec![
                Some(PathBuf::from("index.md")),
                None,
                Some(PathBuf::from("guide/install.md")),
                None,
                Some(PathBuf::from("guide/tuning.md")),
                Some(PathBuf::from("guide/usage.md")),
                Some(PathBuf::from("about.md")),
            ]
        );
        let levels: Vec<usize> = pages.iter().map(|p| p.level).collect();
        assert_eq!(levels, vec![1, 1, 2, 2, 3, 2, 1]);
    }

    #[test]
    fn sections_carry_their_title_and_no_file() {
        let pages = flatten(&[PageNode::section("Reference", vec![PageNode::leaf("api.md")])]);
        assert_eq!(
            pages[0],
            PageDescriptor {
                file: None,
                title: "Reference".to_string(),
                level: 1,
            }
        );
        assert!(pages[0].is_section());
        assert_eq!(pages[1].title, "Api");
        assert_eq!(pages[1].level, 2);
    }

    #[test]
    fn titled_leaves_are_not_sections() {
        let pages = flatten(&[PageNode::titled("changes.md", "Release Notes")]);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title, "Release Notes");
        assert_eq!(pages[0].file, Some(PathBuf::from("changes.md")));
    }

    #[test]
    fn titles_are_derived_from_filenames() {
        assert_eq!(title_from_filename(Path::new("index.md")), "Index");
        assert_eq!(
            title_from_filename(Path::new("user-guide/getting_started.md")),
            "Getting Started"
        );
        assert_eq!(title_from_filename(Path::new("faq")), "Faq");
    }
}
