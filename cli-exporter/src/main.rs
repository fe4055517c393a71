use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use parser::{KbData, ParseError, Statement};

#[derive(Parser, Debug)]
#[command(
    name = "cli_exporter",
    version,
    about = "Exports transactions from an extracted KB statement text file to CSV.",
    long_about = None,
)]
struct Args {
    /// Extracted statement text file
    #[arg(long)]
    input: PathBuf,

    /// Output CSV file
    #[arg(long, default_value = "transakce.csv")]
    output: PathBuf,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), ParseError> {
    let args = Args::parse();

    if !args.input.exists() {
        eprintln!("input file does not exist: {}", args.input.display());
        process::exit(1)
    }

    let file = File::open(&args.input).unwrap_or_else(|err| {
        eprintln!("failed to open input file {}: {err}", args.input.display());
        process::exit(1);
    });

    let reader = io::BufReader::new(file);
    let data = KbData::parse(reader)?;
    let statement = Statement::from(data);

    if statement.transactions.is_empty() {
        println!("No transactions recognized - possibly an unsupported statement format.");
        return Ok(());
    }

    let mut output = File::create(&args.output)?;
    // BOM so spreadsheet tools pick up UTF-8
    output.write_all(b"\xef\xbb\xbf")?;
    statement.write_csv(&mut output)?;

    println!(
        "Exported {} transactions to {}",
        statement.transactions.len(),
        args.output.display()
    );
    if let Some((from, until)) = statement.period() {
        println!(
            "Statement period: {} - {}",
            from.format("%d.%m.%Y"),
            until.format("%d.%m.%Y")
        );
    }

    Ok(())
}
