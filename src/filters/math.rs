use super::{FenceTracker, Filter};
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INLINE_MATH: Regex =
        Regex::new(r"\\\((.+?)\\\)").expect("inline math pattern is a valid regex");
}

const DISPLAY: &str = "$$$$${1}$$$$";

/// End of the code span closing a run of `len` backticks, searching from `from`
fn closing_run(line: &str, from: usize, len: usize) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let run = bytes[i..].iter().take_while(|&&b| b == b'`').count();
            if run == len {
                return Some(i + run);
            }
            i += run;
        } else {
            i += 1;
        }
    }
    None
}

/// Convert math in `line`, leaving `code spans` as they are.
fn convert_line(line: &str) -> String {
    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len());
    let mut text_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let run = bytes[i..].iter().take_while(|&&b| b == b'`').count();
        match closing_run(line, i + run, run) {
            Some(end) => {
                out.push_str(&INLINE_MATH.replace_all(&line[text_start..i], DISPLAY));
                out.push_str(&line[i..end]);
                text_start = end;
                i = end;
            }
            // an unmatched run is plain text
            None => i += run,
        }
    }
    out.push_str(&INLINE_MATH.replace_all(&line[text_start..], DISPLAY));
    out
}

/// Turns `\( x \)` inline math into `$$x$$` for LaTeX-minded Markdown processors.
#[derive(Debug, Default)]
pub struct MathFilter;

impl MathFilter {
    pub fn new() -> MathFilter {
        MathFilter
    }
}

impl Filter for MathFilter {
    fn name(&self) -> &'static str {
        "math"
    }

    fn run(&self, lines: Vec<String>) -> Result<Vec<String>> {
        let mut fences = FenceTracker::default();
        Ok(lines
            .into_iter()
            .map(|line| {
                if fences.is_code(&line) || !line.contains("\\(") {
                    line
                } else {
                    convert_line(&line)
                }
            })
            .collect())
    }
}
