use std::path::Path;

use bevy::prelude::*;
use encoding_rs::WINDOWS_1252;

use crate::catalog::{ObjectCatalog, OBJ_NONE};
use crate::jump::Jump;
use crate::level::{Coordinate, Level, COLS, ROWS};
use crate::sanity::{check_backgrounds, SanityLog, Severity};
use crate::solution::Solution;

pub const HEADER: &str = "35+\u{a1}\u{b3}/r\u{e7}!\u{e6}\u{a7}";
pub const SENTINEL_NOTES: &str = "# ---------- NOTES ----------";

// Stored coordinates are x+1 and y+2.
const OFFSET_X: i32 = 1;
const OFFSET_Y: i32 = 2;
const COORDINATE_LIMIT: i32 = 1 << 16;
const STEP_PREFIX: char = '#';

fn decode(bytes: &[u8]) -> String {
    WINDOWS_1252
        .decode_without_bom_handling(bytes)
        .0
        .into_owned()
}

fn encode_line(text: &str, out: &mut Vec<u8>) {
    let (bytes, _, unmappable) = WINDOWS_1252.encode(text);
    if unmappable {
        debug!("[Level] {:?} is not representable in windows-1252", text);
    }
    out.extend_from_slice(&bytes);
    out.extend_from_slice(b"\r\n");
}

fn is_newline(byte: &u8) -> bool {
    *byte == b'\n'
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Line reader that yields empty lines once the input is exhausted.
struct Lines<'a> {
    lines: std::slice::Split<'a, u8, fn(&u8) -> bool>,
}

impl<'a> Lines<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            lines: bytes.split(is_newline as fn(&u8) -> bool),
        }
    }

    fn next_raw(&mut self) -> &'a [u8] {
        strip_cr(self.lines.next().unwrap_or(&[]))
    }

    fn next_line(&mut self) -> String {
        decode(self.next_raw())
    }

    fn rest(self) -> Vec<String> {
        self.lines.map(|line| decode(strip_cr(line))).collect()
    }
}

/// Reading goes on after most problems, so a damaged file opens as far as possible.
pub fn read_level(
    bytes: &[u8],
    catalog: &ObjectCatalog,
    level: &mut Level,
    solution: &mut Solution,
    sink: &mut dyn FnMut(Severity, &str),
) -> Severity {
    let mut log = SanityLog::new(sink);
    let mut lines = Lines::new(bytes);
    *level = Level::new();
    solution.clear();

    let header = lines.next_line();
    if header != HEADER {
        log.warning(&format!(
            "invalid header {:?}. should be {:?}.",
            header, HEADER
        ));
    }

    for row in 0..ROWS {
        let codes = lines.next_raw();
        if codes.len() != COLS as usize {
            log.error(&format!(
                "invalid number of columns in row {}: {} (should be {}) in line {:?}",
                row,
                codes.len(),
                COLS,
                decode(codes)
            ));
        }
        for (col, &code) in codes.iter().enumerate().take(COLS as usize) {
            if catalog.is_known(code) {
                level.set_field(col as i32, row, code);
            } else {
                level.set_field(col as i32, row, OBJ_NONE);
                log.error(&format!(
                    "invalid object at field (row={}, col={}): {} ({})",
                    row,
                    col,
                    char::from(code),
                    code
                ));
            }
        }
    }

    level.author = lines.next_line();
    level.bg_border = lines.next_line();
    level.bg_untouched = lines.next_line();
    level.bg_touched = lines.next_line();
    {
        let mut forward = |severity: Severity, message: &str| log.log(severity, message);
        check_backgrounds(level, &mut forward);
    }

    let count_line = lines.next_line();
    let Ok(declared) = count_line.trim().parse::<usize>() else {
        log.error(&format!(
            "illegal value for number of solution coordinates: {:?}. I am stopping here.",
            count_line
        ));
        return log.end();
    };
    for _ in 0..declared {
        let Some(cor) = read_coordinate(&mut lines, &mut log) else {
            break;
        };
        solution.append_coordinate(cor);
    }
    if solution.coordinates().len() != declared {
        log.error(&format!(
            "inconsistent number of steps in solution. declared {}, actual {}.",
            declared,
            solution.coordinates().len()
        ));
    }

    let mut steps: Vec<Jump> = Vec::new();
    let mut steps_failed = false;
    let mut line = lines.next_line();
    while !line.is_empty() && line != SENTINEL_NOTES {
        let parsed = line
            .strip_prefix(STEP_PREFIX)
            .ok_or_else(|| format!("failed to parse step: {:?}", line))
            .and_then(|text| text.parse::<Jump>());
        match parsed {
            Ok(step) => steps.push(step),
            Err(e) => {
                log.error(&format!("{}. I am stopping here.", e));
                steps_failed = true;
                break;
            }
        }
        line = lines.next_line();
    }

    if !steps_failed && !steps.is_empty() {
        let coordinates = solution.coordinates().to_vec();
        solution.set_steps(steps);
        match solution.init(&*level) {
            Ok(()) => {
                if coordinates != solution.coordinates() {
                    log.warning(
                        "solution coordinates and solution steps do not match. I am deciding for the steps.",
                    );
                }
            }
            Err(e) => {
                debug!("[Level] Steps not used: {}", e);
                log.warning("read file has solution steps but no start field");
                solution.clear();
                for cor in coordinates {
                    solution.append_coordinate(cor);
                }
            }
        }
    }

    let rest = if line == SENTINEL_NOTES {
        let notes = lines.rest().join("\n");
        level.notes = Some(notes.trim_end().to_string());
        Vec::new()
    } else {
        level.notes = None;
        lines.rest()
    };
    if rest.iter().any(|line| !line.is_empty()) {
        log.warning("did not reach end of file.");
    }

    log.end()
}

fn read_coordinate(lines: &mut Lines<'_>, log: &mut SanityLog<'_>) -> Option<Coordinate> {
    let mut read = |axis: &str, offset: i32| -> Option<i32> {
        let line = lines.next_line();
        match line.trim().parse::<i32>() {
            Ok(value) if (-COORDINATE_LIMIT..=COORDINATE_LIMIT).contains(&value) => {
                Some(value - offset)
            }
            _ => {
                log.error(&format!(
                    "illegal value for {} coordinate in solution: {}. I am breaking here.",
                    axis, line
                ));
                None
            }
        }
    };
    let x = read("x", OFFSET_X)?;
    let y = read("y", OFFSET_Y)?;
    Some((x, y))
}

pub fn read_level_file(
    path: &Path,
    catalog: &ObjectCatalog,
    level: &mut Level,
    solution: &mut Solution,
    sink: &mut dyn FnMut(Severity, &str),
) -> Severity {
    match std::fs::read(path) {
        Ok(bytes) => {
            let severity = read_level(&bytes, catalog, level, solution, sink);
            info!("[Level] Read {} ({})", path.display(), severity);
            severity
        }
        Err(e) => {
            let mut log = SanityLog::new(sink);
            log.error(&format!("failed to read file: {}", e));
            log.end()
        }
    }
}

pub fn write_level(level: &Level, solution: &Solution) -> Vec<u8> {
    let mut out = Vec::new();
    encode_line(HEADER, &mut out);
    for row in level.rows() {
        out.extend_from_slice(row);
        out.extend_from_slice(b"\r\n");
    }
    encode_line(&level.author, &mut out);
    encode_line(&level.bg_border, &mut out);
    encode_line(&level.bg_untouched, &mut out);
    encode_line(&level.bg_touched, &mut out);

    encode_line(&solution.coordinates().len().to_string(), &mut out);
    for &(x, y) in solution.coordinates() {
        encode_line(&(x + OFFSET_X).to_string(), &mut out);
        encode_line(&(y + OFFSET_Y).to_string(), &mut out);
    }
    if solution.is_initialized() {
        for step in solution.steps() {
            encode_line(&format!("{}{}", STEP_PREFIX, step), &mut out);
        }
    }

    if let Some(notes) = &level.notes {
        encode_line(SENTINEL_NOTES, &mut out);
        for line in notes.split('\n') {
            encode_line(line, &mut out);
        }
    }
    out
}

pub fn write_level_file(path: &Path, level: &Level, solution: &Solution) -> Result<(), String> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
    }
    std::fs::write(path, write_level(level, solution))
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    info!("[Level] Wrote {}", path.display());
    Ok(())
}
