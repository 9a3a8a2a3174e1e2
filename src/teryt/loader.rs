use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

use super::parse_hierarchy;
use crate::models::AdminHierarchy;

/// Load the TERYT table from disk (plain or `.gz`) and parse it
pub fn load_hierarchy(path: &Path) -> Result<AdminHierarchy> {
    info!("Loading administrative table from {}", path.display());

    let file = File::open(path)
        .with_context(|| format!("Failed to open administrative table {}", path.display()))?;
    let mut reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let mut data = String::new();
    reader
        .read_to_string(&mut data)
        .context("Administrative table is not valid UTF-8 text")?;

    Ok(parse_hierarchy(&data))
}
