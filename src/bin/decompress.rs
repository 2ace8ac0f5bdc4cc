//! Print the JSON document inside a save file.
//!
//! Without a mapping file the decompressed text is written to stdout as is.
//! With one, the keys are renamed and the document is pretty printed. Set
//! `RUST_LOG=debug` to see what happened along the way.

use std::error;
use std::fs;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;
use waypoint::{keys::KeyMapping, SaveDecoder};

fn main() -> Result<(), Box<dyn error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 && args.len() != 3 {
        eprintln!("Usage: {} <save> [mapping.json]", args[0]);
        std::process::exit(1);
    }

    let data = fs::read(&args[1])?;
    let mut stdout = io::stdout().lock();

    match args.get(2) {
        None => {
            let text = waypoint::decompress(&data)?;
            stdout.write_all(text.as_bytes())?;
        }
        Some(mapping_path) => {
            let file = fs::File::open(mapping_path)?;
            let mapping = KeyMapping::from_reader(io::BufReader::new(file))?;
            let overlapping = mapping.overlapping_keys();
            if !overlapping.is_empty() {
                tracing::warn!(keys = ?overlapping, "mapping has keys that are also canonical names");
            }

            let decoded = SaveDecoder::new(&mapping).decode(&data)?;
            serde_json::to_writer_pretty(&mut stdout, decoded.document())?;
            if let Some(incomplete) = decoded.mapping_incomplete() {
                eprintln!("{}", incomplete);
            }
        }
    }

    stdout.write_all(b"\n")?;
    Ok(())
}
