use anyhow::{Context, Result};
use csv::StringRecord;
use log::info;
use std::path::Path;

use crate::types::Recipient;

/// Reads `address,token_amount,native_amount` rows. The header row is
/// required; missing amount columns read as blank (zero).
pub fn load_recipients(path: impl AsRef<Path>) -> Result<Vec<Recipient>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("cannot open recipients file {}", path.display()))?;

    let mut recipients = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("{}: malformed row {}", path.display(), line + 2))?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        recipients.push(Recipient::from(row));
    }

    info!("Loaded {} recipients from {}", recipients.len(), path.display());
    Ok(recipients)
}

impl From<StringRecord> for Recipient {
    fn from(row: StringRecord) -> Self {
        let column = |i: usize| row.get(i).unwrap_or_default().to_string();
        Self {
            address: column(0),
            token_amount: column(1),
            native_amount: column(2),
        }
    }
}
