//! CSV export.
//!
//! Output is UTF-8, comma-separated, with the header row
//! `URL,Thumbnail,Views,Likes,Comments,Description`. Fields containing commas,
//! quotes or newlines are quoted by the `csv` writer.

use crate::models::VideoRecord;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Default export location, relative to the working directory.
pub const DEFAULT_OUTPUT_PATH: &str = "output/tiktok_videos.csv";

/// Serialize records to CSV bytes, header row included.
///
/// An empty record list still produces the header row.
pub fn to_csv_bytes(records: &[VideoRecord]) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(VideoRecord::HEADERS)?;
    for record in records {
        writer.serialize(record)?;
    }
    Ok(writer.into_inner().map_err(|e| e.to_string())?)
}

/// Write CSV bytes to `path`, creating parent directories as needed.
#[instrument(level = "info", skip_all, fields(path = %path.display(), bytes = bytes.len()))]
pub async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }
    fs::write(path, bytes).await?;
    info!("Wrote CSV file");
    Ok(())
}

/// Serialize `records` and write them to `path`. Returns the bytes written.
pub async fn write_records(path: &Path, records: &[VideoRecord]) -> Result<Vec<u8>, Box<dyn Error>> {
    let bytes = to_csv_bytes(records)?;
    write_bytes(path, &bytes).await?;
    Ok(bytes)
}
