//! CSV plan loading.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::debug;
use zvm::BuildGroupRow;

use crate::error::{CliError, Result};

/// Reads every row of the plan at `path`, in file order.
pub fn load_rows(path: &Path) -> Result<Vec<BuildGroupRow>> {
	let file = std::fs::File::open(path).map_err(|e| CliError::Input(format!("cannot open {}: {e}", path.display())))?;
	let rows = read_rows(file).map_err(|e| match e {
		CliError::Input(msg) => CliError::Input(format!("{}: {msg}", path.display())),
		other => other,
	})?;
	debug!(target = "zvm.cli", path = %path.display(), rows = rows.len(), "loaded plan");
	Ok(rows)
}

/// Parses a plan with a header row. Missing `BuildGroup` or `Delay` values
/// default to 0; a missing `VpgName` or a non-numeric number is an error.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<BuildGroupRow>> {
	let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).trim(Trim::All).from_reader(reader);

	let headers = reader.headers()?.clone();
	if !headers.iter().any(|h| h == "VpgName") {
		return Err(CliError::Input("missing VpgName column".to_string()));
	}

	let mut rows = Vec::new();
	for (index, record) in reader.deserialize::<BuildGroupRow>().enumerate() {
		let row = record?;
		if row.vpg_name.is_empty() {
			return Err(CliError::Input(format!("row {} has an empty VpgName", index + 1)));
		}
		rows.push(row);
	}
	Ok(rows)
}
