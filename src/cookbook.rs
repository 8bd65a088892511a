use crate::error::BumpError;
use crate::metadata::JSON_METADATA_FILE;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

static VERSION_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*version\s*\(?\s*['"]([^'"]*)['"]"#)
        .expect("version declaration pattern is valid")
});

/// A cookbook resolved on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookbook {
    pub name: String,
    /// Declared version, exactly as written in the metadata file.
    pub version: String,
    /// Canonical cookbook directory.
    pub root_dir: PathBuf,
    /// The metadata file the version was read from.
    pub metadata_file: PathBuf,
}

pub trait CookbookLoader {
    fn load(&self, cookbook_path: &Path, name: &str) -> Result<Cookbook, BumpError>;
}

/// Resolves `<cookbook_path>/<name>` and reads the version from its
/// metadata file, falling back to `metadata.json`.
#[derive(Debug, Clone)]
pub struct MetadataLoader {
    metadata_file: String,
}

#[derive(Debug, Deserialize)]
struct JsonMetadata {
    version: Option<String>,
}

impl MetadataLoader {
    pub fn new(metadata_file: impl Into<String>) -> Self {
        Self {
            metadata_file: metadata_file.into(),
        }
    }
}

impl CookbookLoader for MetadataLoader {
    fn load(&self, cookbook_path: &Path, name: &str) -> Result<Cookbook, BumpError> {
        let not_found = |reason: String| BumpError::CookbookNotFound {
            name: name.to_string(),
            cookbook_path: cookbook_path.to_path_buf(),
            reason,
        };

        if !is_plain_name(name) {
            return Err(not_found("not a valid cookbook name".to_string()));
        }

        let cookbook_dir = cookbook_path.join(name);
        if !cookbook_dir.is_dir() {
            return Err(not_found("no such cookbook directory".to_string()));
        }
        let root_dir =
            fs::canonicalize(&cookbook_dir).map_err(|err| BumpError::read(&cookbook_dir, err))?;

        let rb_path = cookbook_dir.join(&self.metadata_file);
        let json_path = cookbook_dir.join(JSON_METADATA_FILE);
        let (metadata_file, version) = if rb_path.is_file() {
            let content =
                fs::read_to_string(&rb_path).map_err(|err| BumpError::read(&rb_path, err))?;
            let version = extract_version(&content).ok_or_else(|| {
                not_found(format!("`{}` does not declare a version", self.metadata_file))
            })?;
            (rb_path, version)
        } else if json_path.is_file() {
            let content =
                fs::read_to_string(&json_path).map_err(|err| BumpError::read(&json_path, err))?;
            let parsed: JsonMetadata = serde_json::from_str(&content).map_err(|err| {
                not_found(format!("`{JSON_METADATA_FILE}` is not valid JSON: {err}"))
            })?;
            let version = parsed.version.ok_or_else(|| {
                not_found(format!("`{JSON_METADATA_FILE}` does not declare a version"))
            })?;
            (json_path, version)
        } else {
            return Err(not_found(format!(
                "neither `{}` nor `{JSON_METADATA_FILE}` exists",
                self.metadata_file
            )));
        };

        tracing::debug!(
            cookbook = name,
            version = %version,
            metadata = %metadata_file.display(),
            "loaded cookbook"
        );

        Ok(Cookbook {
            name: name.to_string(),
            version,
            root_dir,
            metadata_file,
        })
    }
}

/// Returns the first `version '...'` declaration in a Ruby metadata file.
pub fn extract_version(content: &str) -> Option<String> {
    VERSION_DECLARATION
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().to_string())
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_cookbook(root: &Path, name: &str, file: &str, content: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn extracts_quoted_version_declarations() {
        assert_eq!(
            extract_version("name 'nginx'\nversion '1.2.3'\n"),
            Some("1.2.3".to_string())
        );
        assert_eq!(
            extract_version("version      \"0.4.0\"\n"),
            Some("0.4.0".to_string())
        );
        assert_eq!(
            extract_version("  version('2.0.1')\n"),
            Some("2.0.1".to_string())
        );
        assert_eq!(extract_version("name 'nginx'\n# version '9.9.9' in a comment"), None);
    }

    #[test]
    fn loads_version_from_metadata_rb() {
        let temp_dir = tempdir().unwrap();
        write_cookbook(
            temp_dir.path(),
            "nginx",
            "metadata.rb",
            "name 'nginx'\nversion '1.2.3'\ndepends 'apt'\n",
        );

        let cookbook = MetadataLoader::new("metadata.rb")
            .load(temp_dir.path(), "nginx")
            .unwrap();
        assert_eq!(cookbook.name, "nginx");
        assert_eq!(cookbook.version, "1.2.3");
        assert_eq!(
            cookbook.metadata_file,
            temp_dir.path().join("nginx").join("metadata.rb")
        );
        assert_eq!(
            cookbook.root_dir,
            fs::canonicalize(temp_dir.path().join("nginx")).unwrap()
        );
    }

    #[test]
    fn falls_back_to_metadata_json() {
        let temp_dir = tempdir().unwrap();
        write_cookbook(
            temp_dir.path(),
            "apt",
            "metadata.json",
            r#"{ "name": "apt", "version": "7.1.0" }"#,
        );

        let cookbook = MetadataLoader::new("metadata.rb")
            .load(temp_dir.path(), "apt")
            .unwrap();
        assert_eq!(cookbook.version, "7.1.0");
        assert!(cookbook.metadata_file.ends_with("metadata.json"));
    }

    #[test]
    fn missing_cookbook_is_not_found() {
        let temp_dir = tempdir().unwrap();
        let err = MetadataLoader::new("metadata.rb")
            .load(temp_dir.path(), "ghost")
            .unwrap_err();
        assert!(matches!(err, BumpError::CookbookNotFound { .. }));
        assert!(err.to_string().contains("Cookbook `ghost` was not found"));
    }

    #[test]
    fn cookbook_without_version_is_not_found() {
        let temp_dir = tempdir().unwrap();
        write_cookbook(temp_dir.path(), "bare", "metadata.rb", "name 'bare'\n");

        let err = MetadataLoader::new("metadata.rb")
            .load(temp_dir.path(), "bare")
            .unwrap_err();
        assert!(err.to_string().contains("does not declare a version"));
    }

    #[test]
    fn rejects_names_that_escape_the_cookbook_path() {
        let temp_dir = tempdir().unwrap();
        let loader = MetadataLoader::new("metadata.rb");
        for name in ["", "..", "a/b", "/etc"] {
            let err = loader.load(temp_dir.path(), name).unwrap_err();
            assert!(
                matches!(err, BumpError::CookbookNotFound { .. }),
                "expected `{name}` to be rejected"
            );
        }
    }
}
