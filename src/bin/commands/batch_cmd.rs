use anyhow::{bail, Context, Result};
use ipdb_field::{file_reader, GeoDatabase, LookupEngine};
use rayon::prelude::*;
use serde_json::json;
use std::io::{self, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::cli_utils::{format_number, is_not_found, open_database, DatabaseArgs, FieldSelector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Found,
    NotFound,
    Invalid,
    Failed,
}

/// Outcome for one input line
struct Row {
    ip: String,
    outcome: Outcome,
    values: Option<Vec<String>>,
}

impl Row {
    fn empty(ip: String, outcome: Outcome) -> Self {
        Row {
            ip,
            outcome,
            values: None,
        }
    }
}

#[derive(Default)]
struct BatchStats {
    found: usize,
    not_found: usize,
    invalid: usize,
    failed: usize,
}

pub fn cmd_batch(
    config: Option<&Path>,
    args: DatabaseArgs,
    inputs: Vec<PathBuf>,
    field: Option<FieldSelector>,
    format: String,
    threads: Option<String>,
) -> Result<()> {
    let output_format = match format.as_str() {
        "csv" => OutputFormat::Csv,
        "json" => OutputFormat::Json,
        other => bail!("Invalid format '{}', expected csv or json", other),
    };

    let num_threads = match threads.as_deref() {
        None => 1,
        Some("auto") | Some("0") => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
        Some(s) => s.parse::<usize>().with_context(|| {
            format!("Invalid thread count '{}', expected a number or 'auto'", s)
        })?,
    };

    let (_, db) = open_database(config, &args)?;

    let mut lines = Vec::new();
    for input in &inputs {
        let entries = file_reader::addresses(input)
            .with_context(|| format!("Failed to open input: {}", input.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("Failed to read input: {}", input.display()))?;
            lines.push(entry.text);
        }
    }

    let start_time = Instant::now();
    let rows: Vec<Row> = if num_threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .context("Failed to start worker threads")?;
        pool.install(|| {
            lines
                .par_iter()
                .map(|line| lookup_row(&db, line, field))
                .collect::<Vec<_>>()
        })
    } else {
        lines.iter().map(|line| lookup_row(&db, line, field)).collect()
    };

    let columns = match field {
        Some(selector) => vec![selector.label(&db)],
        None => db.reader().metadata().field_names.clone(),
    };

    let mut stats = BatchStats::default();
    for row in &rows {
        match row.outcome {
            Outcome::Found => stats.found += 1,
            Outcome::NotFound => stats.not_found += 1,
            Outcome::Invalid => stats.invalid += 1,
            Outcome::Failed => stats.failed += 1,
        }
    }

    let stdout = io::stdout();
    match output_format {
        OutputFormat::Csv => write_csv(stdout.lock(), &columns, &rows)?,
        OutputFormat::Json => write_json(stdout.lock(), &columns, &rows)?,
    }

    tracing::info!(
        lookups = %format_number(rows.len()),
        found = stats.found,
        not_found = stats.not_found,
        invalid = stats.invalid,
        failed = stats.failed,
        threads = num_threads,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "batch complete"
    );

    Ok(())
}

/// Look up one line; failures leave the row empty instead of aborting the batch
fn lookup_row(db: &GeoDatabase, line: &str, field: Option<FieldSelector>) -> Row {
    let ip = line.to_string();
    let addr: IpAddr = match line.parse() {
        Ok(addr) => addr,
        Err(_) => {
            tracing::warn!(input = line, "skipping invalid address");
            return Row::empty(ip, Outcome::Invalid);
        }
    };

    let result = match field {
        Some(selector) => db
            .field_at(addr, selector.index())
            .map(|value| vec![value.to_string_lossy()]),
        None => db.fields(addr).map(|fields| {
            fields
                .into_iter()
                .map(|(_, value)| value.to_string_lossy())
                .collect()
        }),
    };

    match result {
        Ok(values) => Row {
            ip,
            outcome: Outcome::Found,
            values: Some(values),
        },
        Err(err) if is_not_found(&err) => Row::empty(ip, Outcome::NotFound),
        Err(err) => {
            tracing::warn!(input = line, error = %err, "lookup failed");
            Row::empty(ip, Outcome::Failed)
        }
    }
}

fn write_csv<W: Write>(out: W, columns: &[String], rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["ip"];
    header.extend(columns.iter().map(String::as_str));
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.ip.as_str()];
        match &row.values {
            Some(values) => record.extend(values.iter().map(String::as_str)),
            None => record.extend(std::iter::repeat("").take(columns.len())),
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_json<W: Write>(out: W, columns: &[String], rows: &[Row]) -> Result<()> {
    let mut writer = io::BufWriter::new(out);

    for row in rows {
        let mut output = json!({ "ip": row.ip, "found": row.values.is_some() });
        if let Some(values) = &row.values {
            for (name, value) in columns.iter().zip(values) {
                output[name.as_str()] = json!(value);
            }
        }
        writeln!(writer, "{}", output)?;
    }

    writer.flush()?;
    Ok(())
}
