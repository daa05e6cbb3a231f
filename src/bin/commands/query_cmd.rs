use anyhow::{Context, Result};
use serde_json::json;
use std::net::IpAddr;
use std::path::Path;

use crate::cli_utils::{is_not_found, open_database, DatabaseArgs, FieldSelector};

pub fn cmd_query(
    config: Option<&Path>,
    args: DatabaseArgs,
    ip: String,
    field: Option<FieldSelector>,
    json_output: bool,
    quiet: bool,
) -> Result<()> {
    let (config, db) = open_database(config, &args)?;
    let addr: IpAddr = ip
        .parse()
        .with_context(|| format!("Invalid IP address: {}", ip))?;

    let result = match field {
        Some(selector) => db
            .field_at(addr, selector.index())
            .map(|value| vec![(selector.label(&db), value)]),
        None => db.fields(addr),
    };

    let fields = match result {
        Ok(fields) => fields,
        Err(err) if is_not_found(&err) => {
            if !quiet {
                if json_output {
                    println!("{}", json!({ "ip": ip, "found": false }));
                } else {
                    eprintln!("{}: not found", ip);
                }
            }
            std::process::exit(1);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Lookup failed for: {}", ip));
        }
    };

    if quiet {
        std::process::exit(0);
    }

    if json_output {
        let mut values = serde_json::Map::new();
        for (name, value) in &fields {
            values.insert(name.clone(), json!(value.to_string_lossy()));
        }
        let output = json!({
            "ip": ip,
            "language": config.language.as_str(),
            "found": true,
            "fields": values,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if field.is_some() {
        for (_, value) in &fields {
            println!("{}", value);
        }
    } else {
        for (name, value) in &fields {
            println!("{}: {}", name, value);
        }
    }

    Ok(())
}
