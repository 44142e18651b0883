//! Decode command implementation

use anyhow::{bail, Context, Result};
use procmon::prelude::*;
use std::path::PathBuf;

fn payload_json(record: &Record) -> Result<String> {
    let json = match record.payload()? {
        RecordPayload::Deployment(v) => serde_json::to_string_pretty(&v)?,
        RecordPayload::Process(v) => serde_json::to_string_pretty(&v)?,
        RecordPayload::ProcessInstance(v) => serde_json::to_string_pretty(&v)?,
        RecordPayload::Variable(v) => serde_json::to_string_pretty(&v)?,
        RecordPayload::Incident(v) => serde_json::to_string_pretty(&v)?,
        RecordPayload::Job(v) => serde_json::to_string_pretty(&v)?,
        // Not modelled; show the raw payload
        RecordPayload::Unknown(_) => record.value.get().to_string(),
    };
    Ok(json)
}

pub fn execute(file: PathBuf) -> Result<()> {
    let content =
        std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;

    let mut decoded = 0usize;
    let mut failed = 0usize;

    for (index, line) in content.split(|b| *b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let line_no = index + 1;

        let record = match Record::decode(line) {
            Ok(record) => record,
            Err(e) => {
                failed += 1;
                println!("line {}: ✗ {}", line_no, e);
                continue;
            }
        };

        println!(
            "line {}: {} {} ({:?}) key={} partition={} position={} time={}",
            line_no,
            record.value_type,
            record.intent,
            record.record_type,
            record.key,
            record.partition_id,
            record.position,
            record
                .time()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|_| record.timestamp.to_string()),
        );
        if !record.rejection_reason.is_empty() {
            println!(
                "  rejected ({:?}): {}",
                record.rejection_type, record.rejection_reason
            );
        }

        match payload_json(&record) {
            Ok(json) => {
                decoded += 1;
                println!("{}", json);
            }
            Err(e) => {
                failed += 1;
                println!("  ✗ {}", e);
            }
        }
    }

    println!("\n{} decoded, {} failed", decoded, failed);
    if failed > 0 {
        bail!("{} record(s) in {} failed to decode", failed, file.display());
    }
    Ok(())
}
