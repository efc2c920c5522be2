use crate::cli::commands::{ArchiveReport, PoolReport};
use std::io::{self, Write};

/// Write the full pool report in human-readable format
pub fn write_pool_report(out: &mut impl Write, report: &PoolReport) -> io::Result<()> {
    writeln!(out, "-- POOL --")?;
    for archive in &report.pool {
        writeln!(out, "{archive}")?;
    }
    writeln!(out)?;
    writeln!(out)?;

    for archive in &report.archives {
        write_archive_report(out, archive)?;
        writeln!(out)?;
    }

    write_unresolved_index(out, report)
}

/// Write the findings of one archive
pub fn write_archive_report(out: &mut impl Write, report: &ArchiveReport) -> io::Result<()> {
    writeln!(out, "- {} -", report.archive)?;

    if report.is_empty() {
        writeln!(out, " nothing to report")?;
        return Ok(());
    }

    if !report.one_to_one.is_empty() {
        writeln!(out, "one-to-one:")?;
        for (provider, packages) in &report.one_to_one {
            writeln!(out, " jar: {provider}")?;
            for package in packages {
                writeln!(out, "  pck: {package}")?;
            }
        }
    }

    if !report.one_to_many.is_empty() {
        writeln!(out, "one-to-many (bad):")?;
        for (package, providers) in &report.one_to_many {
            writeln!(out, " pck: {package}")?;
            for provider in providers {
                writeln!(out, "  jar: {provider}")?;
            }
        }
    }

    if !report.unresolved.is_empty() {
        writeln!(out, "unresolved (bad):")?;
        for package in &report.unresolved {
            writeln!(out, " pck: {package}")?;
        }
    }

    Ok(())
}

fn write_unresolved_index(out: &mut impl Write, report: &PoolReport) -> io::Result<()> {
    writeln!(out, "-- ALL UNRESOLVED PACKAGES --")?;
    if report.unresolved_index.is_empty() {
        writeln!(out, "nothing")?;
        return Ok(());
    }

    for (package, archives) in &report.unresolved_index {
        writeln!(out, " {package}")?;
        for archive in archives {
            writeln!(out, "  {archive}")?;
        }
    }
    Ok(())
}
