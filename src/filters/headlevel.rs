use super::{AtxHeading, FenceTracker, Filter, MAX_HEADING_LEVEL};
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SETEXT_UNDERLINE: Regex =
        Regex::new(r"^ {0,3}(=+|-+)[ \t]*$").expect("setext underline pattern is a valid regex");
    static ref THEMATIC_BREAK: Regex =
        Regex::new(r"^ {0,3}(?:(?:\*[ \t]*){3,}|(?:-[ \t]*){3,}|(?:_[ \t]*){3,})$")
            .expect("thematic break pattern is a valid regex");
    static ref BLOCK_START: Regex = Regex::new(r"^ {0,3}([>#|<]|[-*+](\s|$)|\d+[.)](\s|$))")
        .expect("block start pattern is a valid regex");
}

/// Pushes every heading of a page down by the page's nesting level.
///
/// A page nested two levels deep has its `#` headings turned into `###`, so
/// they sit below the chapter heads of the page and its section. Setext
/// headings are rewritten to ATX style along the way, with the lines of a
/// multi-line paragraph joined. Levels past six are clamped to six.
#[derive(Debug)]
pub struct HeadlevelFilter {
    offset: usize,
}

impl HeadlevelFilter {
    pub fn new(offset: usize) -> HeadlevelFilter {
        HeadlevelFilter { offset }
    }

    fn shifted(&self, level: usize) -> String {
        "#".repeat((level + self.offset).min(MAX_HEADING_LEVEL))
    }

    /// Could `line` be the text of a setext heading?
    fn is_paragraph_text(line: &str) -> bool {
        !line.trim().is_empty()
            && !line.starts_with('\t')
            && !line.starts_with("    ")
            && !BLOCK_START.is_match(line)
            && !SETEXT_UNDERLINE.is_match(line)
    }
}

impl Filter for HeadlevelFilter {
    fn name(&self) -> &'static str {
        "headlevel"
    }

    fn run(&self, lines: Vec<String>) -> Result<Vec<String>> {
        if self.offset == 0 {
            return Ok(lines);
        }

        let mut fences = FenceTracker::default();
        let mut out: Vec<String> = Vec::with_capacity(lines.len());
        // lines of the paragraph being read, which an underline turns into a heading
        let mut paragraph: Vec<String> = Vec::new();
        // a paragraph may start here: after a blank line, a heading, a rule or a code block
        let mut at_boundary = true;

        for line in lines {
            if fences.is_code(&line) {
                out.append(&mut paragraph);
                out.push(line);
                at_boundary = !fences.in_block();
                continue;
            }

            if let Some(heading) = AtxHeading::parse(&line) {
                out.append(&mut paragraph);
                out.push(format!(
                    "{}{}{}",
                    heading.indent,
                    self.shifted(heading.level),
                    heading.rest
                ));
                at_boundary = true;
                continue;
            }

            if let Some(caps) = SETEXT_UNDERLINE.captures(&line) {
                if paragraph.is_empty() {
                    // a thematic break, or an underline with nothing to underline
                    out.push(line);
                } else {
                    let level = if caps[1].starts_with('=') { 1 } else { 2 };
                    let text = paragraph
                        .drain(..)
                        .map(|l| l.trim().to_string())
                        .collect::<Vec<_>>()
                        .join(" ");
                    out.push(format!("{} {}", self.shifted(level), text));
                }
                at_boundary = true;
                continue;
            }

            if THEMATIC_BREAK.is_match(&line) {
                out.append(&mut paragraph);
                out.push(line);
                at_boundary = true;
                continue;
            }

            if HeadlevelFilter::is_paragraph_text(&line) && (at_boundary || !paragraph.is_empty()) {
                paragraph.push(line);
                continue;
            }

            out.append(&mut paragraph);
            at_boundary = line.trim().is_empty();
            out.push(line);
        }
        out.append(&mut paragraph);

        Ok(out)
    }
}
