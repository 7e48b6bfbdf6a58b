//! Reading and writing text in the user's chosen character encoding.

use anyhow::{anyhow, Context, Result};
use encoding_rs::Encoding;
use std::path::Path;

/// Look up an encoding by its WHATWG label, e.g. `utf-8`, `latin1` or `windows-1252`.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| anyhow!("Unknown text encoding '{}'", label))
}

/// Read a whole file and decode it, stripping a byte order mark if present.
pub fn read_to_string(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Couldn't open {} for reading", path.display()))?;
    let (text, used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        log::warn!(
            "{} contains bytes that are not valid {}, they were replaced",
            path.display(),
            used.name()
        );
    }
    Ok(text.into_owned())
}

/// Read a file as lines with trailing whitespace removed.
pub fn read_lines(path: &Path, encoding: &'static Encoding) -> Result<Vec<String>> {
    let text = read_to_string(path, encoding)?;
    Ok(split_lines(&text))
}

pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(|line| line.trim_end().to_string()).collect()
}

/// Join lines, terminating every one of them with a newline, and encode the result.
///
/// `encoding_rs` only encodes to encodings that are their own output
/// encoding, so UTF-16 is written here directly. Decode-only encodings such as
/// `replacement` are an error.
pub fn encode_lines(lines: &[String], encoding: &'static Encoding) -> Result<Vec<u8>> {
    let mut text = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }

    if encoding == encoding_rs::UTF_16LE {
        return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
    }
    if encoding == encoding_rs::UTF_16BE {
        return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
    }
    if encoding.output_encoding() != encoding {
        return Err(anyhow!("Can't write text encoded as {}", encoding.name()));
    }

    let (bytes, _, had_errors) = encoding.encode(&text);
    if had_errors {
        log::warn!(
            "some characters can't be represented in {} and were replaced",
            encoding.name()
        );
    }
    Ok(bytes.into_owned())
}
