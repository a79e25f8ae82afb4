//! Plain-text result output.

use std::io::{self, Write};

use epgrec_finder_db::ProgramRecord;
use epgrec_finder_db::query::DATETIME_FORMAT;

/// Line written when no program matches.
pub const NOT_FOUND_MESSAGE: &str = "Not found  programs.";

/// Formats one record as `YYYY-MM-DD HH:MM:SS NNch TITLE`.
#[must_use]
pub fn format_program(program: &ProgramRecord) -> String {
    format!(
        "{} {:02}ch {}",
        program.start_time.format(DATETIME_FORMAT),
        program.channel,
        program.title
    )
}

/// Writes one line per record, or [`NOT_FOUND_MESSAGE`] when empty.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_programs<W: Write>(out: &mut W, programs: &[ProgramRecord]) -> io::Result<()> {
    if programs.is_empty() {
        writeln!(out, "{NOT_FOUND_MESSAGE}")?;
    }
    for program in programs {
        writeln!(out, "{}", format_program(program))?;
    }
    out.flush()
}
