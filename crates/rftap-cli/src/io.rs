//! Input and output endpoints, where `-` means stdin or stdout.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};

/// Open a buffered reader
pub fn open_input(path: &str) -> anyhow::Result<Box<dyn BufRead>> {
    if path == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path, e))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Open a buffered writer, creating or truncating files
pub fn open_output(path: &str) -> anyhow::Result<Box<dyn Write>> {
    if path == "-" {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    let file =
        File::create(path).map_err(|e| anyhow::anyhow!("Failed to create {}: {}", path, e))?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Read an input to the end
pub fn read_all(path: &str) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    open_input(path)?.read_to_end(&mut buf)?;
    Ok(buf)
}
