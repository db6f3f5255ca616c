/// Parser for Go's `-coverprofile` format.
///
/// Reference: https://go.dev/blog/cover
///
/// Format:
///   mode: set|count|atomic
///   <file>:<startLine>.<startCol>,<endLine>.<endCol> <numStatements> <count>
///
/// Each line describes a basic block with the number of statements it holds
/// and how many times it ran. Unlike a line-oriented report we keep the
/// column-precise ranges, since statements are matched against them.
use std::collections::BTreeMap;
use std::io::BufRead;
use std::sync::OnceLock;

use regex::Regex;

use super::ProfileParser;
use crate::error::{CheckError, Result};
use crate::model::{CoverageBlock, FileProfile, Mode, ProfileData};
use crate::position::Range;

const MODE_PREFIX: &str = "mode: ";

/// Go coverage profile parser.
pub struct GocoverParser;

impl ProfileParser for GocoverParser {
    fn parse(&self, input: &[u8]) -> Result<ProfileData> {
        parse(input)
    }
}

/// Parse a Go coverage profile from raw bytes.
pub fn parse(input: &[u8]) -> Result<ProfileData> {
    parse_reader(&mut &*input)
}

fn block_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.*):([0-9]+)\.([0-9]+),([0-9]+)\.([0-9]+) ([0-9]+) ([0-9]+)$")
            .expect("block line pattern is valid")
    })
}

fn format_error(line: usize, message: impl Into<String>) -> CheckError {
    CheckError::ProfileFormat {
        line,
        message: message.into(),
    }
}

/// Parse a single block line, returning (file_path, block).
fn parse_block_line(line: &str, line_number: usize) -> Result<(&str, CoverageBlock)> {
    let caps = block_line_regex().captures(line).ok_or_else(|| {
        format_error(
            line_number,
            format!("line {line:?} doesn't match <file>:<line>.<col>,<line>.<col> <stmts> <count>"),
        )
    })?;

    let number = |idx: usize| -> Result<u64> {
        caps[idx]
            .parse::<u64>()
            .map_err(|e| format_error(line_number, format!("invalid number {:?}: {e}", &caps[idx])))
    };
    let coord = |idx: usize| -> Result<u32> {
        caps[idx]
            .parse::<u32>()
            .map_err(|e| format_error(line_number, format!("invalid position {:?}: {e}", &caps[idx])))
    };

    let file = caps.get(1).map_or("", |m| m.as_str());
    if file.trim().is_empty() {
        return Err(format_error(line_number, "block has a blank file name"));
    }

    let range = Range::from_coords((coord(2)?, coord(3)?), (coord(4)?, coord(5)?));
    if range.is_inverted() {
        return Err(format_error(
            line_number,
            format!("block {range} ends before it starts"),
        ));
    }

    Ok((
        file,
        CoverageBlock {
            range,
            statement_count: number(6)?,
            hit_count: number(7)?,
        },
    ))
}

fn parse_reader(reader: &mut dyn BufRead) -> Result<ProfileData> {
    let mut mode: Option<Mode> = None;
    let mut files: BTreeMap<String, Vec<(usize, CoverageBlock)>> = BTreeMap::new();

    let mut raw_line = String::new();
    let mut line_number = 0;
    loop {
        raw_line.clear();
        let n = reader
            .read_line(&mut raw_line)
            .map_err(|e| format_error(line_number + 1, format!("could not read profile: {e}")))?;
        if n == 0 {
            break;
        }
        line_number += 1;

        let line = raw_line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }

        if let Some(declared) = line.strip_prefix(MODE_PREFIX) {
            let declared: Mode = declared
                .trim()
                .parse()
                .map_err(|e: String| format_error(line_number, e))?;
            match mode {
                None => mode = Some(declared),
                // Concatenated profiles repeat the header.
                Some(current) if current == declared => {}
                Some(current) => {
                    return Err(format_error(
                        line_number,
                        format!("mode '{declared}' conflicts with earlier mode '{current}'"),
                    ));
                }
            }
            continue;
        }

        if mode.is_none() {
            return Err(format_error(
                line_number,
                format!("expected a 'mode: ' header, found {line:?}"),
            ));
        }

        let (file, block) = parse_block_line(line, line_number)?;
        files
            .entry(file.to_string())
            .or_default()
            .push((line_number, block));
    }

    let Some(mode) = mode else {
        return Err(format_error(line_number.max(1), "profile is empty: missing 'mode: ' header"));
    };

    let files = files
        .into_iter()
        .map(|(path, blocks)| {
            let blocks = merge_blocks(mode, blocks)?;
            Ok(FileProfile { path, blocks })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ProfileData { mode, files })
}

/// Sort blocks by position and fold blocks that share a range, which happens
/// when profiles from several test binaries are concatenated.
fn merge_blocks(mode: Mode, mut blocks: Vec<(usize, CoverageBlock)>) -> Result<Vec<CoverageBlock>> {
    blocks.sort_by(|(_, a), (_, b)| {
        a.range
            .start
            .cmp(&b.range.start)
            .then(a.range.end.cmp(&b.range.end))
    });

    let mut merged: Vec<CoverageBlock> = Vec::with_capacity(blocks.len());
    for (line_number, block) in blocks {
        match merged.last_mut() {
            Some(last) if last.range == block.range => {
                if last.statement_count != block.statement_count {
                    return Err(format_error(
                        line_number,
                        format!(
                            "inconsistent statement count for block {}: {} vs {}",
                            block.range, last.statement_count, block.statement_count
                        ),
                    ));
                }
                last.hit_count = match mode {
                    Mode::Set => u64::from(last.hit_count > 0 || block.hit_count > 0),
                    Mode::Count | Mode::Atomic => last.hit_count.saturating_add(block.hit_count),
                };
            }
            _ => merged.push(block),
        }
    }
    Ok(merged)
}
