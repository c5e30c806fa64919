//! Output formatting for extraction results.
//!
//! Supports three output formats:
//! - JSON: the per-file fact records, for programmatic consumption
//! - Tables: the relational form built by [`Tables::from_facts`]
//! - Pretty: colored per-file summary for the terminal

use colored::*;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::facts::{FileFacts, Tables};

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Tables,
    Pretty,
}

impl Format {
    pub const NAMES: &'static [&'static str] = &["json", "tables", "pretty"];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "json" => Some(Format::Json),
            "tables" => Some(Format::Tables),
            "pretty" => Some(Format::Pretty),
            _ => None,
        }
    }
}

/// A file that could not be extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failure {
    pub file: String,
    pub error: String,
}

/// Everything one `extract` run produced.
#[derive(Debug, Default)]
pub struct Report {
    pub path: String,
    pub facts: Vec<FileFacts>,
    pub failures: Vec<Failure>,
}

impl Report {
    pub fn files_scanned(&self) -> usize {
        self.facts.len() + self.failures.len()
    }
}

fn no_failures(failures: &&[Failure]) -> bool {
    failures.is_empty()
}

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    path: &'a str,
    files_scanned: usize,
    files: &'a [FileFacts],
    #[serde(skip_serializing_if = "no_failures")]
    failures: &'a [Failure],
}

/// Write the fact records as one JSON document.
pub fn write_json<W: Write>(out: &mut W, report: &Report) -> anyhow::Result<()> {
    let doc = JsonReport {
        version: env!("CARGO_PKG_VERSION"),
        path: &report.path,
        files_scanned: report.files_scanned(),
        files: &report.facts,
        failures: &report.failures,
    };
    serde_json::to_writer_pretty(&mut *out, &doc)?;
    writeln!(out)?;
    Ok(())
}

// =============================================================================
// Tables Format
// =============================================================================

#[derive(Serialize)]
struct TablesReport<'a> {
    version: &'static str,
    path: &'a str,
    #[serde(flatten)]
    tables: Tables,
    #[serde(skip_serializing_if = "no_failures")]
    failures: &'a [Failure],
}

/// Write the relational tables as one JSON document.
pub fn write_tables<W: Write>(out: &mut W, report: &Report) -> anyhow::Result<()> {
    let doc = TablesReport {
        version: env!("CARGO_PKG_VERSION"),
        path: &report.path,
        tables: Tables::from_facts(&report.facts),
        failures: &report.failures,
    };
    serde_json::to_writer_pretty(&mut *out, &doc)?;
    writeln!(out)?;
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write a human-readable summary.
pub fn write_pretty<W: Write>(out: &mut W, report: &Report) -> anyhow::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}",
        "vhdl-facts".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out)?;
    writeln!(out, "  {}{}", "Scanning: ".dimmed(), report.path)?;
    writeln!(
        out,
        "  {}{} ({} failed)",
        "Files:    ".dimmed(),
        report.files_scanned(),
        report.failures.len()
    )?;
    writeln!(out)?;

    for facts in &report.facts {
        write_file_summary(out, facts)?;
    }

    if !report.failures.is_empty() {
        writeln!(out, "  {} ({}):", "Failures".bold(), report.failures.len())?;
        for f in &report.failures {
            writeln!(out, "    {} {}", "ERROR".red(), f.file.blue())?;
            writeln!(out, "            {}", f.error)?;
        }
        writeln!(out)?;
    }

    let total: usize = report.facts.iter().map(FileFacts::fact_count).sum();
    let status = if report.failures.is_empty() {
        "OK".green()
    } else {
        "INCOMPLETE".red()
    };
    writeln!(out, "  {}  {}", format!("Facts: {}", total).dimmed(), status)?;
    writeln!(out)?;
    Ok(())
}

fn write_file_summary<W: Write>(out: &mut W, facts: &FileFacts) -> anyhow::Result<()> {
    writeln!(
        out,
        "  {} {}",
        facts.file.blue(),
        format!("({} facts)", facts.fact_count()).dimmed()
    )?;

    let units: Vec<String> = facts
        .entities
        .iter()
        .map(|e| format!("entity {}", e.name))
        .chain(
            facts
                .architectures
                .iter()
                .map(|a| format!("architecture {} of {}", a.name, a.entity_name)),
        )
        .chain(facts.packages.iter().map(|p| format!("package {}", p.name)))
        .collect();
    if !units.is_empty() {
        writeln!(out, "    {:<14}{}", "units".dimmed(), units.join(", "))?;
    }

    let sequential = facts.processes.iter().filter(|p| p.is_sequential).count();
    if !facts.processes.is_empty() {
        writeln!(
            out,
            "    {:<14}{} ({} sequential, {} combinational)",
            "processes".dimmed(),
            facts.processes.len(),
            sequential,
            facts.processes.len() - sequential
        )?;
    }
    write_count(out, "signals", facts.signals.len())?;
    write_count(out, "instances", facts.instances.len())?;
    write_count(out, "assignments", facts.concurrent_assignments.len())?;
    write_count(out, "generates", facts.generates.len())?;

    for domain in &facts.clock_domains {
        writeln!(
            out,
            "    {:<14}{} {} in {} ({} registers)",
            "clock".dimmed(),
            domain.clock.yellow(),
            domain.edge.as_str(),
            domain.process,
            domain.registers.len()
        )?;
    }

    for c in &facts.cdc_crossings {
        let tag = if c.is_synchronized {
            format!("synchronized, {} stages", c.sync_stages).green()
        } else {
            "unsynchronized".red()
        };
        let width = if c.is_multi_bit { " multi-bit" } else { "" };
        writeln!(
            out,
            "    {:<14}{} {} -> {}{} ({})",
            "crossing".dimmed(),
            c.signal,
            c.source_clock,
            c.dest_clock,
            width,
            tag
        )?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_count<W: Write>(out: &mut W, label: &str, count: usize) -> anyhow::Result<()> {
    if count > 0 {
        writeln!(out, "    {:<14}{}", label.dimmed(), count)?;
    }
    Ok(())
}

/// Write `report` in `format`.
pub fn write<W: Write>(out: &mut W, format: Format, report: &Report) -> anyhow::Result<()> {
    match format {
        Format::Json => write_json(out, report),
        Format::Tables => write_tables(out, report),
        Format::Pretty => write_pretty(out, report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{CdcCrossing, Entity};

    fn sample() -> Report {
        let mut facts = FileFacts::empty("rtl/top.sexp");
        facts.entities.push(Entity {
            name: "top".to_string(),
            line: 1,
            ..Entity::default()
        });
        facts.cdc_crossings.push(CdcCrossing {
            signal: "flag".to_string(),
            source_clock: "clk_a".to_string(),
            dest_clock: "clk_b".to_string(),
            ..CdcCrossing::default()
        });
        Report {
            path: "rtl".to_string(),
            facts: vec![facts],
            failures: vec![Failure {
                file: "rtl/bad.sexp".to_string(),
                error: "unbalanced parentheses".to_string(),
            }],
        }
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(Format::parse("tables"), Some(Format::Tables));
        assert_eq!(Format::parse("sarif"), None);
    }

    #[test]
    fn test_json_report_shape() {
        let mut buf = Vec::new();
        write_json(&mut buf, &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["files_scanned"], 2);
        assert_eq!(value["files"][0]["file"], "rtl/top.sexp");
        assert_eq!(value["files"][0]["entities"][0]["name"], "top");
        assert_eq!(value["failures"][0]["file"], "rtl/bad.sexp");
    }

    #[test]
    fn test_tables_report_shape() {
        let mut buf = Vec::new();
        write_tables(&mut buf, &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["files"][0]["path"], "rtl/top.sexp");
        assert_eq!(value["entities"][0]["file"], "rtl/top.sexp");
    }

    #[test]
    fn test_pretty_mentions_crossing_and_failure() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        write_pretty(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("entity top"));
        assert!(text.contains("flag clk_a -> clk_b (unsynchronized)"));
        assert!(text.contains("rtl/bad.sexp"));
        assert!(text.contains("INCOMPLETE"));
    }
}
