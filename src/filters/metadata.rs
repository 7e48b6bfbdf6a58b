use super::Filter;
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref META_KEY: Regex =
        Regex::new(r"^[A-Za-z0-9_-]+:(\s|$)").expect("metadata key pattern is a valid regex");
}

/// Strips a YAML or MultiMarkdown style metadata block from the top of a page.
///
/// Two shapes are recognised, both only when they start on the very first line:
/// a `---` fenced block closed by `---` or `...`, and a run of `key: value`
/// lines (indented lines continue the previous value) ended by a blank line.
/// The blank line after the block goes with it.
#[derive(Debug, Default)]
pub struct MetadataFilter;

impl MetadataFilter {
    pub fn new() -> MetadataFilter {
        MetadataFilter
    }

    /// Do these lines read as `key: value` pairs? Indented lines and YAML list
    /// items continue the previous value.
    fn is_metadata(body: &[String]) -> bool {
        let Some((first, rest)) = body.split_first() else {
            return false;
        };
        META_KEY.is_match(first)
            && rest.iter().all(|line| {
                META_KEY.is_match(line) || line.starts_with([' ', '\t']) || line.starts_with("- ")
            })
    }

    /// Number of leading lines making up the metadata block, if there is one
    fn block_len(lines: &[String]) -> Option<usize> {
        let first = lines.first()?;
        if first.trim() == "---" {
            let mut end = 1;
            while end < lines.len() {
                let line = lines[end].trim();
                if line == "---" || line == "..." {
                    // a rule over a setext heading is content, not metadata
                    return MetadataFilter::is_metadata(&lines[1..end]).then_some(end + 1);
                }
                if line.is_empty() {
                    break;
                }
                end += 1;
            }
            // unterminated: the block runs up to the first blank line
            return MetadataFilter::is_metadata(&lines[1..end]).then_some(end);
        }

        let end = lines
            .iter()
            .position(|line| line.trim().is_empty())
            .unwrap_or(lines.len());
        MetadataFilter::is_metadata(&lines[..end]).then_some(end)
    }
}

impl Filter for MetadataFilter {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn run(&self, mut lines: Vec<String>) -> Result<Vec<String>> {
        let Some(mut end) = MetadataFilter::block_len(&lines) else {
            return Ok(lines);
        };
        if lines.get(end).is_some_and(|l| l.trim().is_empty()) {
            end += 1;
        }
        log::debug!("stripping {} lines of metadata", end);
        lines.drain(..end);
        Ok(lines)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    fn strip(text: &[&str]) -> Vec<String> {
        MetadataFilter::new().run(lines(text)).expect("infallible")
    }

    #[test]
    fn yaml_front_matter_is_removed() {
        assert_eq!(
            strip(&["---", "title: Install", "tags: [setup]", "---", "", "# Install"]),
            lines(&["# Install"])
        );
        assert_eq!(
            strip(&["---", "title: Install", "...", "Body"]),
            lines(&["Body"])
        );
        assert_eq!(
            strip(&["---", "title: Install", "tags:", "- setup", "  - nested", "---", "Body"]),
            lines(&["Body"])
        );
    }

    #[test]
    fn multimarkdown_metadata_is_removed() {
        assert_eq!(
            strip(&["Title: Install", "Authors: Ann", "    Bob", "", "Body"]),
            lines(&["Body"])
        );
    }

    #[test]
    fn blocks_not_at_the_top_are_kept() {
        let text = &["# Install", "", "---", "title: nope", "---"];
        assert_eq!(strip(text), lines(text));
    }

    #[test]
    fn ordinary_pages_are_untouched() {
        let text = &["Note: this is prose", "that keeps going", "", "More"];
        assert_eq!(strip(text), lines(text));

        let text = &["---", "", "A page that opens with a rule"];
        assert_eq!(strip(text), lines(text));

        let text = &["---", "An introduction paragraph", "---", "", "Body"];
        assert_eq!(strip(text), lines(text));
        assert_eq!(strip(&[]), Vec::<String>::new());
    }
}
