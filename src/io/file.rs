use std::path::Path;

use log::info;

use crate::error::Result;
use crate::model::Record;

/// Write task records as a pretty-printed JSON array.
pub fn save_records(records: &[Record], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    info!("saved {} task(s) to {}", records.len(), path.display());
    Ok(())
}

/// Load a JSON array of task records, nested via `children`.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let json = std::fs::read_to_string(path)?;
    let records: Vec<Record> = serde_json::from_str(&json)?;
    info!("loaded {} root task(s) from {}", records.len(), path.display());
    Ok(records)
}
