use std::io::{self, Write};

use clap::ValueEnum;

use crate::release::Release;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Csv,
}

const HEADER: [&str; 7] = [
    "NAME",
    "NAMESPACE",
    "REVISION",
    "UPDATED",
    "STATUS",
    "CHART",
    "APP VERSION",
];

const COLUMN_GAP: &str = "  ";

type Row<'a> = [&'a str; 7];

fn row(release: &Release) -> Row<'_> {
    [
        release.name.as_str(),
        release.namespace.as_str(),
        release.revision.as_str(),
        release.updated.as_str(),
        release.status.as_str(),
        release.chart.as_str(),
        release.app_version.as_str(),
    ]
}

/// Writes `releases` sorted by name, then namespace.
pub fn render<W: Write>(format: OutputFormat, releases: &[&Release], out: &mut W) -> io::Result<()> {
    let mut rows: Vec<Row> = releases.iter().map(|release| row(release)).collect();
    rows.sort_by(|a, b| (a[0], a[1]).cmp(&(b[0], b[1])));

    match format {
        OutputFormat::Table => write_table(&rows, out),
        OutputFormat::Csv => write_csv(&rows, out),
    }
}

fn write_table<W: Write>(rows: &[Row], out: &mut W) -> io::Result<()> {
    let mut widths = HEADER.map(|title| title.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    for row in std::iter::once(&HEADER).chain(rows) {
        let line = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP);
        writeln!(out, "{}", line.trim_end())?;
    }
    Ok(())
}

fn write_csv<W: Write>(rows: &[Row], out: &mut W) -> io::Result<()> {
    for row in std::iter::once(&HEADER).chain(rows) {
        let line = row.iter().map(|cell| csv_field(cell)).collect::<Vec<_>>().join(",");
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn csv_field(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
