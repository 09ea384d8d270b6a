//! Alert report formatting and output.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::range::RangeViolation;
use crate::variability::VariabilityFiring;

pub fn format_range_line(violation: &RangeViolation) -> String {
    format!(
        "{:<6} {:>10.3} {}",
        violation.symbol, violation.price, violation.name
    )
}

pub fn format_variability_line(firing: &VariabilityFiring) -> String {
    format!(
        "{:<10}{:<20}{:<14}{:>6.2}%",
        firing.symbol,
        firing.start_date.to_string(),
        firing.end_date.to_string(),
        firing.percent_change
    )
}

/// Report lines, range section first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertReport {
    pub range_lines: Vec<String>,
    pub variability_lines: Vec<String>,
}

impl AlertReport {
    pub fn build(violations: &[RangeViolation], firings: &[VariabilityFiring]) -> Self {
        Self {
            range_lines: violations.iter().map(format_range_line).collect(),
            variability_lines: firings.iter().map(format_variability_line).collect(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.range_lines.len() + self.variability_lines.len()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.range_lines
            .iter()
            .chain(&self.variability_lines)
            .map(String::as_str)
    }
}

/// Overwrite `path` with the range section, then append the variability section.
pub fn write_report(path: &Path, report: &AlertReport) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut range_out = BufWriter::new(File::create(path)?);
    write_lines(&mut range_out, &report.range_lines)?;
    range_out.flush()?;
    drop(range_out);

    let mut variability_out = BufWriter::new(OpenOptions::new().append(true).open(path)?);
    write_lines(&mut variability_out, &report.variability_lines)?;
    variability_out.flush()
}

fn write_lines(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
