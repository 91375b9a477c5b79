//! Small helpers shared by the pipeline stages.
//!
//! - String truncation for logging response bodies
//! - Read-only validation of the dataset's output location

use std::error::Error;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters with an ellipsis and a count
/// of the dropped bytes appended. Cuts always land on a character boundary.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Check that the dataset at `file` could be written, without touching the
/// file system.
///
/// Walks up from the target's parent to the nearest existing ancestor, which
/// must be a directory that is not read-only. Missing directories below it
/// are created later by the save itself. Run before any network traffic so a
/// bad output path fails fast instead of after every query has been issued.
#[instrument(level = "info", skip_all, fields(path = %file.display()))]
pub async fn check_output_location(file: &Path) -> Result<(), Box<dyn Error>> {
    let mut dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let meta = loop {
        match fs::metadata(dir).await {
            Ok(meta) => break meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => match dir.parent() {
                Some(p) if !p.as_os_str().is_empty() => dir = p,
                _ if dir != Path::new(".") => dir = Path::new("."),
                _ => return Err(Box::new(e)),
            },
            Err(e) => return Err(Box::new(e)),
        }
    };

    if !meta.is_dir() {
        return Err(format!("{} is not a directory", dir.display()).into());
    }
    if meta.permissions().readonly() {
        return Err(format!("{} is read-only", dir.display()).into());
    }
    info!(dir = %dir.display(), "Output location looks writable");
    Ok(())
}
