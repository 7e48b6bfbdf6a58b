use super::{is_external, rewrite_links, FenceTracker, Filter, InlineLink};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Rebases relative image paths onto the site directory.
///
/// Image paths in a page are relative to that page. Once every page lives in a
/// single document they have to be relative to something fixed instead, so
/// `![](img/a.png)` in `guide/install.md` becomes `![](site/guide/img/a.png)`.
/// Optionally all images are switched to a different file extension, which is
/// handy when the build converted SVGs to PNGs for print.
#[derive(Debug)]
pub struct ImageFilter {
    page_dir: Option<PathBuf>,
    site_dir: PathBuf,
    extension: Option<String>,
}

impl ImageFilter {
    /// `page` is the page's file relative to the docs directory, `None` for sections.
    pub fn new<P: Into<PathBuf>>(
        page: Option<&Path>,
        site_dir: P,
        extension: Option<&str>,
    ) -> ImageFilter {
        ImageFilter {
            page_dir: page.map(|p| p.parent().map(Path::to_path_buf).unwrap_or_default()),
            site_dir: site_dir.into(),
            extension: extension
                .map(|ext| ext.trim_start_matches('.').to_string())
                .filter(|ext| !ext.is_empty()),
        }
    }

    fn rewrite(&self, page_dir: &Path, target: &str) -> Option<String> {
        if target.starts_with('#') || is_external(target) {
            return None;
        }

        // keep any query or fragment out of the path arithmetic
        let split = target.find(['?', '#']).unwrap_or(target.len());
        let (path, suffix) = target.split_at(split);

        let site = slashed(&self.site_dir);
        let joined = match path.strip_prefix('/') {
            Some(rooted) => format!("{}/{}", site, rooted),
            None => format!("{}/{}/{}", site, slashed(page_dir), path),
        };
        let mut rebased = normalize(&joined);

        if let Some(ext) = &self.extension {
            let name_start = rebased.rfind('/').map_or(0, |i| i + 1);
            if let Some(dot) = rebased[name_start..].rfind('.').filter(|&d| d > 0) {
                rebased.truncate(name_start + dot + 1);
                rebased.push_str(ext);
            }
        }

        Some(rebased + suffix)
    }
}

fn slashed(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Resolve `.` and `..` segments without touching the file system.
fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            part => parts.push(part),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

impl Filter for ImageFilter {
    fn name(&self) -> &'static str {
        "image"
    }

    fn run(&self, lines: Vec<String>) -> Result<Vec<String>> {
        let Some(page_dir) = &self.page_dir else {
            return Ok(lines);
        };

        let mut fences = FenceTracker::default();
        Ok(lines
            .into_iter()
            .map(|line| {
                if fences.is_code(&line) || !line.contains("![") {
                    return line;
                }
                rewrite_links(&line, |link| {
                    if !link.is_image {
                        return None;
                    }
                    let target = self.rewrite(page_dir, link.target)?;
                    let rewritten = InlineLink {
                        target: &target,
                        ..*link
                    };
                    Some(rewritten.to_markdown())
                })
            })
            .collect())
    }
}
