use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};

/// Names of entries in `dir` that contain `date` and end with `.{extension}`,
/// sorted so reports come out in a stable order.
pub fn list_recordings(dir: &Path, date: &str, extension: &str) -> Result<Vec<String>> {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("reading directory: {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("reading entry in {}", dir.display()))?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!("skipping non-UTF-8 entry in {}", dir.display());
            continue;
        };
        if name.contains(date) && name.ends_with(&suffix) {
            names.push(name);
        }
    }
    names.sort();

    debug!("found {} recordings for {date} in {}", names.len(), dir.display());
    Ok(names)
}
