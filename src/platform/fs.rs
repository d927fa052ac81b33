// LogCutter - platform/fs.rs
//
// File reading for the cutter. Lines are kept as raw bytes with their
// original terminators so the written slice is byte-identical to the source
// region, whatever the file's encoding.

use std::io;
use std::path::Path;

/// Read the whole file and split it into lines, each keeping its `\n` (and
/// any preceding `\r`). The final line has no terminator when the file does
/// not end with one.
///
/// No decoding happens here: invalid UTF-8 is carried through untouched.
pub fn read_lines_preserving_terminators(path: &Path) -> io::Result<Vec<Vec<u8>>> {
    let content = std::fs::read(path)?;
    let lines: Vec<Vec<u8>> = content
        .split_inclusive(|b| *b == b'\n')
        .map(<[u8]>::to_vec)
        .collect();
    tracing::debug!(
        path = %path.display(),
        lines = lines.len(),
        bytes = content.len(),
        utf8 = std::str::from_utf8(&content).is_ok(),
        "Read log file"
    );
    Ok(lines)
}
