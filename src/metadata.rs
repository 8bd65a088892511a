use crate::error::BumpError;
use std::fs;
use std::path::Path;

pub const DEFAULT_METADATA_FILE: &str = "metadata.rb";
pub const JSON_METADATA_FILE: &str = "metadata.json";

/// Replaces every literal occurrence of `old_version` in `content`.
///
/// This is a textual substitution: a dependency pinned to the same version
/// string is rewritten too.
pub fn replace_version(content: &str, old_version: &str, new_version: &str) -> String {
    content.replace(old_version, new_version)
}

pub fn rewrite_version(path: &Path, old_version: &str, new_version: &str) -> Result<(), BumpError> {
    let content = fs::read_to_string(path).map_err(|err| BumpError::read(path, err))?;
    let updated = replace_version(&content, old_version, new_version);
    write_metadata(path, &updated)?;
    tracing::debug!(path = %path.display(), old_version, new_version, "rewrote metadata file");
    Ok(())
}

fn write_metadata(path: &Path, content: &str) -> Result<(), BumpError> {
    fs::write(path, content).map_err(|err| BumpError::write(path, err))
}
