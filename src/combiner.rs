//! Orchestration of a complete conversion.
//!
//! The combiner flattens the site's page tree, reads every page and runs it
//! through the per-page filters, then runs the concatenated document through
//! the document-wide filters. The order of both filter lists matters:
//!
//! - per page: include, metadata, headlevel, chapterhead, image. Includes must
//!   be expanded before headings are shifted, and the chapter head must be
//!   added after shifting or it would be shifted too.
//! - per document: anchor, math, xref, admonition, toc, table. The table of
//!   contents is built from the final headings, and grid tables come last so
//!   no other filter sees their box drawing.

use crate::config::SiteConfig;
use crate::filters::{
    self, AdmonitionFilter, AnchorFilter, ChapterheadFilter, ExcludeFilter, Filter,
    HeadlevelFilter, ImageFilter, IncludeFilter, MathFilter, MetadataFilter, TableFilter,
    TocFilter, XrefFilter, XrefMode,
};
use crate::pages::{flatten, PageDescriptor};
use anyhow::Result;
use derive_builder::Builder;
use encoding_rs::Encoding;

/// Switches controlling which transformations a conversion applies.
#[derive(Builder, Debug, Clone)]
#[builder(setter(into), default)]
pub struct Options {
    /// Encoding of the page sources
    pub encoding: &'static Encoding,
    /// Glob patterns of pages to leave out
    pub exclude: Vec<String>,
    pub strip_metadata: bool,
    pub add_chapter_heads: bool,
    /// Push each page's headings down by its nesting level
    pub increase_heads: bool,
    /// CSS class attached to chapter heads
    pub title_class: Option<String>,
    /// Replacement extension for every image
    pub image_ext: Option<String>,
    pub strip_anchors: bool,
    pub convert_math: bool,
    pub xrefs: XrefMode,
    pub convert_admonitions: bool,
    /// Convert pipe tables to grid tables
    pub grid_tables: bool,
    /// Total width of generated grid tables
    pub width: usize,
    /// Emit a `\newpage` after every page
    pub add_page_break: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::UTF_8,
            exclude: Vec::new(),
            strip_metadata: false,
            add_chapter_heads: true,
            increase_heads: true,
            title_class: None,
            image_ext: None,
            strip_anchors: true,
            convert_math: false,
            xrefs: XrefMode::Replace,
            convert_admonitions: false,
            grid_tables: false,
            width: 100,
            add_page_break: false,
        }
    }
}

/// Combines the pages of one site into a single document.
///
/// A combiner holds no state between conversions, so `combine` can be called
/// any number of times.
pub struct Combiner {
    site: SiteConfig,
    options: Options,
    exclude: ExcludeFilter,
}

impl Combiner {
    pub fn new(site: SiteConfig, options: Options) -> Result<Combiner> {
        let exclude = ExcludeFilter::new(&options.exclude)?;
        if !exclude.is_empty() {
            log::debug!("excluding pages matching {:?}", options.exclude);
        }
        Ok(Combiner {
            site,
            options,
            exclude,
        })
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// The site's pages in document order
    pub fn pages(&self) -> Vec<PageDescriptor> {
        flatten(&self.site.pages)
    }

    /// Run the conversion, returning the combined document as lines.
    pub fn combine(&self) -> Result<Vec<String>> {
        self.combine_pages(&self.pages())
    }

    /// Run the conversion over an already flattened page list.
    pub fn combine_pages(&self, pages: &[PageDescriptor]) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        let mut present = Vec::with_capacity(pages.len());

        for page in pages {
            if self.exclude.excludes(page) {
                log::info!("excluding {}", page.title);
                continue;
            }
            if page.is_section() {
                log::debug!("section '{}' at level {}", page.title, page.level);
            } else {
                log::debug!("processing '{}' at level {}", page.title, page.level);
            }
            present.push(page.clone());

            let content = self.read_page(page)?;
            let mut content = filters::apply(&self.page_filters(page), content)?;

            // exactly one blank line between pages, however the source file ended
            while content.last().is_some_and(|line| line.trim().is_empty()) {
                content.pop();
            }
            if content.is_empty() {
                continue;
            }
            lines.extend(content);
            lines.push(String::new());
            if self.options.add_page_break {
                lines.push("\\newpage".to_string());
                lines.push(String::new());
            }
        }

        filters::apply(&self.document_filters(pages, &present), lines)
    }

    fn read_page(&self, page: &PageDescriptor) -> Result<Vec<String>> {
        match &page.file {
            Some(file) => {
                crate::text::read_lines(&self.site.docs_dir.join(file), self.options.encoding)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Filters applied to each page on its own, in order
    pub fn page_filters<'a>(&'a self, page: &'a PageDescriptor) -> Vec<Box<dyn Filter + 'a>> {
        let options = &self.options;
        let mut stages: Vec<Box<dyn Filter + 'a>> = Vec::new();

        if self.site.include_enabled() {
            stages.push(Box::new(IncludeFilter::new(
                &self.site.docs_dir,
                options.encoding,
            )));
        }
        if options.strip_metadata {
            stages.push(Box::new(MetadataFilter::new()));
        }
        if options.increase_heads {
            stages.push(Box::new(HeadlevelFilter::new(page.level)));
        }
        if options.add_chapter_heads {
            stages.push(Box::new(
                ChapterheadFilter::new(page.level, &page.title)
                    .with_class(options.title_class.clone()),
            ));
        }
        stages.push(Box::new(ImageFilter::new(
            page.file.as_deref(),
            &self.site.site_dir,
            options.image_ext.as_deref(),
        )));

        stages
    }

    /// Filters applied to the combined document, in order. `present` are the
    /// pages that made it into the document.
    pub fn document_filters(
        &self,
        pages: &[PageDescriptor],
        present: &[PageDescriptor],
    ) -> Vec<Box<dyn Filter + '_>> {
        let options = &self.options;
        let mut stages: Vec<Box<dyn Filter + '_>> = Vec::new();

        if options.strip_anchors {
            stages.push(Box::new(AnchorFilter::new()));
        }
        if options.convert_math {
            stages.push(Box::new(MathFilter::new()));
        }
        stages.push(Box::new(
            XrefFilter::new(options.xrefs, pages).in_document(present),
        ));
        if options.convert_admonitions {
            stages.push(Box::new(AdmonitionFilter::new()));
        }
        if self.site.toc_enabled() {
            stages.push(Box::new(TocFilter::new()));
        }
        if options.grid_tables {
            stages.push(Box::new(TableFilter::new(options.width)));
        }

        stages
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("can create directories");
        }
        std::fs::write(path, contents).expect("can write file");
    }

    fn site(dir: &TempDir, config: &str) -> SiteConfig {
        write(dir.path(), "mkdocs.yml", config);
        SiteConfig::load(&dir.path().join("mkdocs.yml"), encoding_rs::UTF_8)
            .expect("can load site")
    }

    #[test]
    fn two_pages_combine_with_chapter_heads() {
        let dir = TempDir::new().expect("can create temp dir");
        write(dir.path(), "docs/index.md", "# Welcome\n\nHello.\n\n\n");
        write(dir.path(), "docs/guide.md", "# Guide\n\nSteps.\n");
        let combiner = Combiner::new(site(&dir, "pages: []\n"), Options::default())
            .expect("can build combiner");

        let pages = vec![
            PageDescriptor {
                file: Some(PathBuf::from("index.md")),
                title: "Index".to_string(),
                level: 1,
            },
            PageDescriptor {
                file: Some(PathBuf::from("guide.md")),
                title: "Guide".to_string(),
                level: 2,
            },
        ];
        let lines = combiner.combine_pages(&pages).expect("can combine");
        assert_eq!(
            lines,
            vec![
                "# Index", "", "## Welcome", "", "Hello.", "", "## Guide", "", "### Guide", "",
                "Steps.", "",
            ]
        );
    }

    #[test]
    fn full_site_runs_every_stage() {
        let dir = TempDir::new().expect("can create temp dir");
        write(
            dir.path(),
            "docs/index.md",
            "---\ntitle: Home\n---\n\n[TOC]\n\nSee [installing](guide/install.md).\n",
        );
        write(
            dir.path(),
            "docs/guide/install.md",
            "Install\n=======\n\n{!snippets/req.md!}\n\n![shot](img/shot.svg)\n",
        );
        write(dir.path(), "docs/snippets/req.md", "| Need | Version |\n|:--|--:|\n| rust | 1.80 |\n");
        write(dir.path(), "docs/drafts.md", "# Not ready\n");
        let site = site(
            &dir,
            r#"
site_name: Demo
pages:
  - index.md
  - Guide:
      - guide/install.md
  - drafts.md
markdown_extensions:
  - toc
  - markdown_include.include
"#,
        );
        let options = OptionsBuilder::default()
            .strip_metadata(true)
            .exclude(vec!["drafts.md".to_string()])
            .image_ext(Some("png".to_string()))
            .grid_tables(true)
            .width(30usize)
            .build()
            .expect("can build options");
        let site_dir = site.site_dir.to_string_lossy().to_string();
        let lines = Combiner::new(site, options)
            .expect("can build combiner")
            .combine()
            .expect("can combine");

        let expected: Vec<String> = vec![
            "# Index".to_string(),
            "".to_string(),
            "- [Index](#index)".to_string(),
            "- [Guide](#guide)".to_string(),
            "    - [Install](#install)".to_string(),
            "        - [Install](#install-1)".to_string(),
            "".to_string(),
            "See installing.".to_string(),
            "".to_string(),
            "# Guide".to_string(),
            "".to_string(),
            "## Install".to_string(),
            "".to_string(),
            "### Install".to_string(),
            "".to_string(),
            "+----------+-----------------+".to_string(),
            "| Need     |         Version |".to_string(),
            "+:=========+================:+".to_string(),
            "| rust     |            1.80 |".to_string(),
            "+----------+-----------------+".to_string(),
            "".to_string(),
            format!("![shot]({}/guide/img/shot.png)", site_dir),
            "".to_string(),
        ];
        assert_eq!(lines, expected);
    }

    #[test]
    fn missing_includes_abort_the_run() {
        let dir = TempDir::new().expect("can create temp dir");
        write(dir.path(), "docs/index.md", "{!missing.md!}\n");
        let site = site(
            &dir,
            "pages:\n  - index.md\nmarkdown_extensions:\n  - markdown_include.include\n",
        );
        let err = Combiner::new(site, Options::default())
            .expect("can build combiner")
            .combine()
            .expect_err("include target is missing");
        assert!(format!("{err:#}").contains("missing.md"));
    }

    #[test]
    fn missing_pages_abort_the_run() {
        let dir = TempDir::new().expect("can create temp dir");
        let site = site(&dir, "pages:\n  - ghost.md\n");
        let err = Combiner::new(site, Options::default())
            .expect("can build combiner")
            .combine()
            .expect_err("page is missing");
        assert!(format!("{err:#}").contains("ghost.md"));
    }

    #[test]
    fn page_breaks_and_untitled_output() {
        let dir = TempDir::new().expect("can create temp dir");
        write(dir.path(), "docs/a.md", "A\n");
        write(dir.path(), "docs/b.md", "B\n");
        let options = OptionsBuilder::default()
            .add_chapter_heads(false)
            .add_page_break(true)
            .build()
            .expect("can build options");
        let combiner = Combiner::new(site(&dir, "pages: [a.md, b.md]\n"), options)
            .expect("can build combiner");

        let first = combiner.combine().expect("can combine");
        assert_eq!(first, vec!["A", "", "\\newpage", "", "B", "", "\\newpage", ""]);
        // nothing accumulates between runs
        assert_eq!(combiner.combine().expect("can combine again"), first);
    }

    #[test]
    fn pages_without_content_add_no_separator() {
        let dir = TempDir::new().expect("can create temp dir");
        write(dir.path(), "docs/a.md", "A\n");
        write(dir.path(), "docs/b.md", "B\n");
        write(dir.path(), "docs/empty.md", "\n\n");
        let options = OptionsBuilder::default()
            .add_chapter_heads(false)
            .build()
            .expect("can build options");
        let combiner = Combiner::new(
            site(&dir, "pages:\n  - a.md\n  - Sec:\n      - empty.md\n      - b.md\n"),
            options,
        )
        .expect("can build combiner");

        assert_eq!(combiner.combine().expect("can combine"), vec!["A", "", "B", ""]);
    }

    #[test]
    fn normalized_xrefs_reach_the_right_chapter() {
        let dir = TempDir::new().expect("can create temp dir");
        write(
            dir.path(),
            "docs/index.md",
            "# Install\n\nSee [setup](install.md).\n",
        );
        write(dir.path(), "docs/install.md", "Steps.\n");
        let options = OptionsBuilder::default()
            .xrefs(XrefMode::Normalize)
            .build()
            .expect("can build options");
        let lines = Combiner::new(site(&dir, "pages: [index.md, install.md]\n"), options)
            .expect("can build combiner")
            .combine()
            .expect("can combine");

        assert_eq!(
            lines,
            vec![
                "# Index",
                "",
                "## Install",
                "",
                "See [setup](#install-1).",
                "",
                "# Install",
                "",
                "Steps.",
                "",
            ]
        );
    }
}
