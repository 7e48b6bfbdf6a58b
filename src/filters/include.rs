use super::Filter;
use anyhow::Result;
use encoding_rs::Encoding;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::PathBuf;

lazy_static! {
    static ref DIRECTIVE: Regex =
        Regex::new(r"\{!\s*(.+?)\s*!\}").expect("include directive pattern is a valid regex");
}

/// Expands `{!path!}` include directives with the contents of the named file.
///
/// Paths are relative to the docs directory. Expansion is single-level: the
/// included text is not searched for further directives.
pub struct IncludeFilter {
    base_path: PathBuf,
    encoding: &'static Encoding,
}

impl IncludeFilter {
    pub fn new<P: Into<PathBuf>>(base_path: P, encoding: &'static Encoding) -> IncludeFilter {
        IncludeFilter {
            base_path: base_path.into(),
            encoding,
        }
    }

    fn expand(&self, line: &str, out: &mut Vec<String>) -> Result<()> {
        let mut current = String::new();
        let mut last = 0;
        for caps in DIRECTIVE.captures_iter(line) {
            let Some(directive) = caps.get(0) else {
                continue;
            };
            current.push_str(&line[last..directive.start()]);

            let path = self.base_path.join(&caps[1]);
            log::debug!("including {}", path.display());
            let mut included = crate::text::read_lines(&path, self.encoding)?.into_iter();

            // text around the directive sticks to the first and last included lines
            if let Some(first) = included.next() {
                current.push_str(&first);
                for next in included {
                    out.push(std::mem::replace(&mut current, next));
                }
            }
            last = directive.end();
        }
        current.push_str(&line[last..]);
        out.push(current);
        Ok(())
    }
}

impl Filter for IncludeFilter {
    fn name(&self) -> &'static str {
        "include"
    }

    fn run(&self, lines: Vec<String>) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(lines.len());
        for line in lines {
            if DIRECTIVE.is_match(&line) {
                self.expand(&line, &mut out)?;
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
    fn directives_are_replaced_by_file_contents() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        std::fs::write(dir.path().join("snippet.md"), "first\nsecond\n").expect("can write");

        let filter = IncludeFilter::new(dir.path(), encoding_rs::UTF_8);
        let out = filter
            .run(lines(&["before", "{!snippet.md!}", "after"]))
            .expect("can include");
        assert_eq!(out, lines(&["before", "first", "second", "after"]));
    }

    #[test]
    fn surrounding_text_is_kept() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        std::fs::write(dir.path().join("a.md"), "one\ntwo\n").expect("can write");
        std::fs::write(dir.path().join("b.md"), "three\n").expect("can write");

        let filter = IncludeFilter::new(dir.path(), encoding_rs::UTF_8);
        let out = filter
            .run(lines(&["<{! a.md !}|{!b.md!}>"]))
            .expect("can include");
        assert_eq!(out, lines(&["<one", "two|three>"]));
    }

    #[test]
    fn includes_are_not_recursive() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        std::fs::write(dir.path().join("outer.md"), "{!inner.md!}\n").expect("can write");

        let filter = IncludeFilter::new(dir.path(), encoding_rs::UTF_8);
        let out = filter.run(lines(&["{!outer.md!}"])).expect("can include");
        assert_eq!(out, lines(&["{!inner.md!}"]));
    }

    #[test]
    fn missing_targets_are_fatal() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let filter = IncludeFilter::new(dir.path(), encoding_rs::UTF_8);
        let err = filter
            .run(lines(&["{!nowhere.md!}"]))
            .expect_err("target is missing");
        assert!(format!("{err:#}").contains("nowhere.md"));
    }
}
