use super::{FenceTracker, Filter};
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `<a name="x">text</a>` or `<a id='x'>text</a>`, nothing but the target attribute
    static ref ANCHOR: Regex = Regex::new(
        r#"(?i)<a\s+(?:name|id)\s*=\s*(?:"[^"]*"|'[^']*')\s*>(.*?)</a\s*>"#
    )
    .expect("anchor pattern is a valid regex");
    static ref EMPTY_ANCHOR: Regex =
        Regex::new(r#"(?i)<a\s+(?:name|id)\s*=\s*(?:"[^"]*"|'[^']*')\s*/>"#)
            .expect("self-closing anchor pattern is a valid regex");
}

/// Removes HTML jump-target anchors, keeping whatever text they wrap.
#[derive(Debug, Default)]
pub struct AnchorFilter;

impl AnchorFilter {
    pub fn new() -> AnchorFilter {
        AnchorFilter
    }
}

impl Filter for AnchorFilter {
    fn name(&self) -> &'static str {
        "anchor"
    }

    fn run(&self, lines: Vec<String>) -> Result<Vec<String>> {
        let mut fences = FenceTracker::default();
        Ok(lines
            .into_iter()
            .map(|line| {
                if fences.is_code(&line) || !line.contains('<') {
                    return line;
                }
                let line = ANCHOR.replace_all(&line, "$1");
                EMPTY_ANCHOR.replace_all(&line, "").into_owned()
            })
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn strip(line: &str) -> String {
        AnchorFilter::new()
            .run(vec![line.to_string()])
            .expect("infallible")
            .remove(0)
    }

    #[test]
    fn anchors_are_removed_and_text_kept() {
        assert_eq!(strip(r#"<a name="x"></a>Intro"#), "Intro");
        assert_eq!(strip(r#"See <a id="x">text</a> here"#), "See text here");
        assert_eq!(strip(r#"<A NAME='top'/>Top"#), "Top");
    }

    #[test]
    fn other_anchors_and_elements_are_kept() {
        let line = r#"<a href="https://example.com" id="ext">site</a> <span id="x">s</span>"#;
        assert_eq!(strip(line), line);
    }
}
