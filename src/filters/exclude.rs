use crate::pages::PageDescriptor;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Keeps pages matching any of the user's exclusion globs out of the combined document.
///
/// A page is excluded when either its path as written in the site configuration
/// or its bare file name matches. Plain names without glob syntax only match
/// themselves, so `-x changelog.md` works as expected.
#[derive(Debug)]
pub struct ExcludeFilter {
    globs: GlobSet,
}

impl ExcludeFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<ExcludeFilter> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = Glob::new(pattern)
                .with_context(|| format!("Failed to parse exclude glob '{}'", pattern))?;
            builder.add(glob);
        }
        let globs = builder
            .build()
            .with_context(|| "Failed to compile exclude globs")?;
        Ok(ExcludeFilter { globs })
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty()
    }

    /// Whether `page` should be dropped. Sections are never excluded.
    pub fn excludes(&self, page: &PageDescriptor) -> bool {
        match &page.file {
            Some(file) => self.matches(file),
            None => false,
        }
    }

    fn matches(&self, file: &Path) -> bool {
        self.globs.is_match(file)
            || file
                .file_name()
                .map(|name| self.globs.is_match(Path::new(name)))
                .unwrap_or(false)
    }
}
