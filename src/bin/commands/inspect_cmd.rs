use anyhow::Result;
use ipdb_field::LookupEngine;
use serde_json::json;
use std::path::Path;

use crate::cli_utils::{format_bytes, format_number, format_unix_timestamp, open_database, DatabaseArgs};

pub fn cmd_inspect(config: Option<&Path>, args: DatabaseArgs, json_output: bool) -> Result<()> {
    let (config, db) = open_database(config, &args)?;
    let reader = db.reader();
    let metadata = reader.metadata();

    if json_output {
        let output = json!({
            "file": config.database.display().to_string(),
            "size": reader.size(),
            "node_count": reader.node_count(),
            "ipv4": reader.is_ipv4_support(),
            "ipv6": reader.is_ipv6_support(),
            "metadata": metadata,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let mut families = Vec::new();
    if reader.is_ipv4_support() {
        families.push("IPv4");
    }
    if reader.is_ipv6_support() {
        families.push("IPv6");
    }

    println!("Database:   {}", config.database.display());
    println!("Size:       {}", format_bytes(reader.size()));
    println!("Build:      {}", format_unix_timestamp(metadata.build));
    println!(
        "Families:   {}",
        if families.is_empty() {
            "none".to_string()
        } else {
            families.join(", ")
        }
    );
    println!("Nodes:      {}", format_number(reader.node_count() as usize));
    println!();
    println!("Languages:");
    for block in &metadata.languages {
        let marker = if block.name == config.language.as_str() {
            " (selected)"
        } else {
            ""
        };
        println!(
            "  {:<4} fields {}..{}{}",
            block.name,
            block.field_offset,
            block.field_offset + metadata.fields_per_language_block,
            marker
        );
    }
    println!();
    println!("Fields:");
    for (i, name) in metadata.field_names.iter().enumerate() {
        println!("  {:>2}  {}", i, name);
    }

    Ok(())
}
