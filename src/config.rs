//! Loading of the MkDocs site configuration (`mkdocs.yml`).
//!
//! Only the handful of settings the combiner needs are read: the site name,
//! the docs and site directories, the page tree and the names of the enabled
//! Markdown extensions. Everything else in the file is ignored.

use crate::pages::PageNode;
use anyhow::{anyhow, Context, Result};
use encoding_rs::Encoding;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Extension that enables `{!file!}` include directives
pub const INCLUDE_EXTENSION: &str = "markdown_include.include";

/// Everything the combiner needs to know about the site being combined.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub site_name: Option<String>,
    /// Directory holding the Markdown sources, resolved against the config file's directory
    pub docs_dir: PathBuf,
    /// Directory the built site lands in; images are rebased onto it
    pub site_dir: PathBuf,
    pub pages: Vec<PageNode>,
    /// Names of the enabled Markdown extensions, without parameters
    pub markdown_extensions: Vec<String>,
}

#[derive(Deserialize)]
struct RawSiteConfig {
    site_name: Option<String>,
    docs_dir: Option<PathBuf>,
    site_dir: Option<PathBuf>,
    #[serde(alias = "nav", default)]
    pages: Vec<RawPage>,
    #[serde(default)]
    markdown_extensions: Vec<RawExtension>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPage {
    File(String),
    Pair(String, String),
    Titled(serde_yaml::Mapping),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTarget {
    File(String),
    Children(Vec<RawPage>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExtension {
    Name(String),
    Configured(serde_yaml::Mapping),
}

impl SiteConfig {
    /// Read and parse a configuration file.
    pub fn load(path: &Path, encoding: &'static Encoding) -> Result<SiteConfig> {
        let contents = crate::text::read_to_string(path, encoding)?;
        let base_dir = path.parent().unwrap_or(Path::new(""));
        SiteConfig::parse(&contents, base_dir)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse configuration contents, resolving relative directories against `base_dir`.
    pub fn parse(contents: &str, base_dir: &Path) -> Result<SiteConfig> {
        let raw: RawSiteConfig =
            serde_yaml::from_str(contents).with_context(|| "Failed to parse YAML")?;

        let pages = raw
            .pages
            .into_iter()
            .map(RawPage::into_node)
            .collect::<Result<Vec<PageNode>>>()?;

        let markdown_extensions = raw
            .markdown_extensions
            .into_iter()
            .filter_map(|ext| match ext {
                RawExtension::Name(name) => Some(name),
                // configured extensions are a single-key mapping to their parameters
                RawExtension::Configured(map) => map
                    .iter()
                    .next()
                    .and_then(|(k, _)| k.as_str())
                    .map(str::to_string),
            })
            .map(|name| extension_name(&name).to_string())
            .collect();

        Ok(SiteConfig {
            site_name: raw.site_name,
            docs_dir: base_dir.join(raw.docs_dir.unwrap_or_else(|| PathBuf::from("docs"))),
            site_dir: base_dir.join(raw.site_dir.unwrap_or_else(|| PathBuf::from("site"))),
            pages,
            markdown_extensions,
        })
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.markdown_extensions.iter().any(|ext| ext == name)
    }

    /// Whether include directives should be expanded
    pub fn include_enabled(&self) -> bool {
        self.has_extension(INCLUDE_EXTENSION)
    }

    /// Whether `[TOC]` markers should be replaced by a table of contents
    pub fn toc_enabled(&self) -> bool {
        self.has_extension("toc") || self.has_extension("markdown.extensions.toc")
    }
}

/// Strip a legacy `name(key=value)` parameter suffix.
fn extension_name(ext: &str) -> &str {
    ext.split('(').next().unwrap_or(ext).trim()
}

impl RawPage {
    fn into_node(self) -> Result<PageNode> {
        match self {
            RawPage::File(file) => Ok(PageNode::leaf(file)),
            RawPage::Pair(file, title) => Ok(PageNode::titled(file, title)),
            RawPage::Titled(map) => {
                if map.len() != 1 {
                    return Err(anyhow!(
                        "Page entries must map exactly one title, found {} keys",
                        map.len()
                    ));
                }
                let Some((key, value)) = map.into_iter().next() else {
                    return Err(anyhow!("Empty page entry"));
                };
                let title = key
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("Page titles must be strings, found {:?}", key))?;
                let target: RawTarget = serde_yaml::from_value(value)
                    .with_context(|| format!("Invalid entry for page '{}'", title))?;
                match target {
                    RawTarget::File(file) => Ok(PageNode::titled(file, title)),
                    RawTarget::Children(children) => Ok(PageNode::section(
                        title,
                        children
                            .into_iter()
                            .map(RawPage::into_node)
                            .collect::<Result<Vec<PageNode>>>()?,
                    )),
                }
            }
        }
    }
}
