//! ACH file inspector CLI
//!
//! Reads an ACH file, checks its control totals, and prints one CSV row per
//! entry.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- payments.ach > entries.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use nacha::{AchFile, Amount, NachaError, Reader, Result};
use serde::Serialize;
use std::env;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process;

/// One output row per entry detail.
#[derive(Debug, Serialize)]
struct EntryRow<'a> {
    batch_number: u64,
    transaction_code: u8,
    routing_number: String,
    account_number: &'a str,
    amount: Amount,
    individual_id: &'a str,
    individual_name: &'a str,
    trace_number: u64,
    addenda: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(NachaError::MissingArgument);
    }

    let input_path = &args[1];
    let file = File::open(input_path)?;
    let mut reader = Reader::new(input_path.as_str(), BufReader::new(file));

    let ach = reader.read_file()?;
    ach.verify()?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    write_entries(&ach, handle)
}

fn write_entries<W: Write>(ach: &AchFile, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for batch in &ach.batches {
        for entry in &batch.entries {
            let detail = &entry.detail;
            csv_writer.serialize(EntryRow {
                batch_number: batch.header.batch_number,
                transaction_code: detail.transaction_code.0,
                routing_number: detail.routing_number(),
                account_number: &detail.receiving_dfi_account_number,
                amount: detail.amount,
                individual_id: &detail.individual_id,
                individual_name: &detail.individual_name,
                trace_number: detail.trace_number,
                addenda: entry.addenda.len(),
            })?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}
