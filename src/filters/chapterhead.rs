use super::{Filter, MAX_HEADING_LEVEL};
use anyhow::Result;

/// Puts the page's title from the site configuration on top of its content.
#[derive(Debug)]
pub struct ChapterheadFilter {
    level: usize,
    title: String,
    class: Option<String>,
}

impl ChapterheadFilter {
    pub fn new<S: ToString>(level: usize, title: S) -> ChapterheadFilter {
        ChapterheadFilter {
            level,
            title: title.to_string(),
            class: None,
        }
    }

    /// Tag the heading with a CSS class using attribute list syntax (`{.class}`)
    pub fn with_class(mut self, class: Option<String>) -> ChapterheadFilter {
        self.class = class;
        self
    }

    fn heading(&self) -> String {
        let hashes = "#".repeat(self.level.clamp(1, MAX_HEADING_LEVEL));
        match &self.class {
            Some(class) => format!("{} {} {{.{}}}", hashes, self.title, class),
            None => format!("{} {}", hashes, self.title),
        }
    }
}

impl Filter for ChapterheadFilter {
    fn name(&self) -> &'static str {
        "chapterhead"
    }

    fn run(&self, lines: Vec<String>) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(lines.len() + 2);
        out.push(self.heading());
        if !lines.is_empty() {
            out.push(String::new());
        }
        out.extend(lines);
        Ok(out)
    }
}
