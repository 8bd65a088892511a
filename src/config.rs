use crate::error::BumpError;
use crate::metadata::DEFAULT_METADATA_FILE;
use anyhow::{Context, Result, bail};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["cookbump.toml", ".cookbump.toml"];

#[derive(Debug, Clone)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Discovered(PathBuf),
    Defaulted,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::Discovered(path) => Some(path.as_path()),
            Self::Defaulted => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub cookbook_path: Vec<PathBuf>,
    pub metadata_file: String,
    pub source: ConfigSource,
    pub warnings: Vec<String>,
}

impl ResolvedConfig {
    /// The base directory cookbooks are resolved under. Only the first
    /// configured entry is searched.
    pub fn primary_cookbook_path(&self) -> Result<&Path, BumpError> {
        self.cookbook_path.first().map(PathBuf::as_path).ok_or_else(|| {
            BumpError::Configuration(
                "No default cookbook_path; Specify with -o or fix your cookbump.toml.".to_string(),
            )
        })
    }
}

#[derive(Debug, facet::Facet)]
struct RawConfig {
    cookbook_path: Option<Vec<String>>,
    metadata_file: Option<String>,
}

/// Loads configuration, letting `cookbook_path_override` (the `-o` flags)
/// replace whatever the file declares.
pub fn load(
    explicit_path: Option<&Path>,
    cwd: &Path,
    cookbook_path_override: &[PathBuf],
) -> Result<ResolvedConfig> {
    let mut config = load_file(explicit_path, cwd)?;
    if !cookbook_path_override.is_empty() {
        config.cookbook_path = cookbook_path_override
            .iter()
            .map(|path| resolve_against(cwd, path))
            .collect();
    }

    tracing::debug!(
        source = ?config.source,
        cookbook_path = ?config.cookbook_path,
        metadata_file = %config.metadata_file,
        "resolved configuration"
    );
    Ok(config)
}

fn load_file(explicit_path: Option<&Path>, cwd: &Path) -> Result<ResolvedConfig> {
    let (source, raw_contents) = match resolve_config_location(explicit_path, cwd)? {
        Some((path, explicit)) => {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file `{}`.", path.display()))?;
            let source = if explicit {
                ConfigSource::Explicit(path)
            } else {
                ConfigSource::Discovered(path)
            };
            (source, contents)
        }
        None => {
            return Ok(ResolvedConfig {
                cookbook_path: Vec::new(),
                metadata_file: DEFAULT_METADATA_FILE.to_string(),
                source: ConfigSource::Defaulted,
                warnings: Vec::new(),
            });
        }
    };

    let config_path = source.path().unwrap_or(cwd).to_path_buf();
    let parsed_toml = raw_contents.parse::<toml::Value>().with_context(|| {
        format!("Config file `{}` is not valid TOML.", config_path.display())
    })?;
    let warnings = collect_warnings(&parsed_toml);

    let raw: RawConfig = facet_toml::from_str(&raw_contents).with_context(|| {
        format!(
            "Config file `{}` has unsupported value types.",
            config_path.display()
        )
    })?;

    // Relative entries are taken relative to the directory holding the file.
    let base_dir = config_path.parent().unwrap_or(cwd);
    let mut cookbook_path = Vec::new();
    for entry in raw.cookbook_path.unwrap_or_default() {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            bail!("`cookbook_path` entries cannot be empty.");
        }
        cookbook_path.push(resolve_against(base_dir, Path::new(trimmed)));
    }

    let metadata_file = normalize_file_name(
        raw.metadata_file
            .as_deref()
            .unwrap_or(DEFAULT_METADATA_FILE),
    )?;

    Ok(ResolvedConfig {
        cookbook_path,
        metadata_file,
        source,
        warnings,
    })
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn normalize_file_name(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("`metadata_file` cannot be empty.");
    }

    let mut components = Path::new(trimmed).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(trimmed.to_string()),
        _ => bail!("`metadata_file` `{trimmed}` must be a file name, not a path."),
    }
}

fn collect_warnings(parsed: &toml::Value) -> Vec<String> {
    let Some(root) = parsed.as_table() else {
        return Vec::new();
    };

    let allowed_root: BTreeSet<&str> = BTreeSet::from(["cookbook_path", "metadata_file"]);
    root.keys()
        .filter(|key| !allowed_root.contains(key.as_str()))
        .map(|key| format!("Unknown config key `{key}` was ignored."))
        .collect()
}

fn resolve_config_location(
    explicit_path: Option<&Path>,
    cwd: &Path,
) -> Result<Option<(PathBuf, bool)>> {
    if let Some(explicit) = explicit_path {
        let explicit = resolve_against(cwd, explicit);
        if !explicit.exists() {
            bail!(
                "Config file `{}` was not found. Pass a valid path with `--config`.",
                explicit.display()
            );
        }
        return Ok(Some((explicit, true)));
    }

    for candidate in CONFIG_FILE_CANDIDATES {
        let path = cwd.join(candidate);
        if path.exists() {
            return Ok(Some((path, false)));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn discovers_cookbump_toml_before_dot_cookbump_toml() {
        let temp_dir = tempdir().unwrap();
        let cwd = temp_dir.path();

        fs::write(cwd.join(".cookbump.toml"), "cookbook_path = [\"hidden\"]").unwrap();
        fs::write(cwd.join("cookbump.toml"), "cookbook_path = [\"cookbooks\"]").unwrap();

        let config = load(None, cwd, &[]).unwrap();
        assert_eq!(config.cookbook_path, vec![cwd.join("cookbooks")]);
        assert!(matches!(config.source, ConfigSource::Discovered(_)));
    }

    #[test]
    fn explicit_config_path_wins_over_discovery() {
        let temp_dir = tempdir().unwrap();
        let cwd = temp_dir.path();
        let explicit_path = cwd.join("custom.toml");

        fs::write(cwd.join("cookbump.toml"), "cookbook_path = [\"cookbooks\"]").unwrap();
        fs::write(&explicit_path, "cookbook_path = [\"/srv/chef/cookbooks\"]").unwrap();

        let config = load(Some(explicit_path.as_path()), cwd, &[]).unwrap();
        assert_eq!(
            config.cookbook_path,
            vec![PathBuf::from("/srv/chef/cookbooks")]
        );
        assert!(matches!(config.source, ConfigSource::Explicit(_)));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("nope.toml");

        let err = load(Some(missing.as_path()), temp_dir.path(), &[]).unwrap_err();
        assert!(err.to_string().contains("was not found"));
    }

    #[test]
    fn returns_defaults_when_no_config_file_exists() {
        let temp_dir = tempdir().unwrap();
        let config = load(None, temp_dir.path(), &[]).unwrap();

        assert!(config.cookbook_path.is_empty());
        assert_eq!(config.metadata_file, DEFAULT_METADATA_FILE);
        assert!(matches!(config.source, ConfigSource::Defaulted));
    }

    #[test]
    fn missing_cookbook_path_is_a_configuration_error() {
        let temp_dir = tempdir().unwrap();
        let config = load(None, temp_dir.path(), &[]).unwrap();

        let err = config.primary_cookbook_path().unwrap_err();
        assert!(matches!(err, BumpError::Configuration(_)));
        assert!(err.to_string().contains("No default cookbook_path"));
    }

    #[test]
    fn flag_override_replaces_configured_paths() {
        let temp_dir = tempdir().unwrap();
        let cwd = temp_dir.path();
        fs::write(cwd.join("cookbump.toml"), "cookbook_path = [\"a\", \"b\"]").unwrap();

        let config = load(None, cwd, &[PathBuf::from("override")]).unwrap();
        assert_eq!(config.cookbook_path, vec![cwd.join("override")]);
        assert_eq!(config.primary_cookbook_path().unwrap(), cwd.join("override"));
    }

    #[test]
    fn first_configured_path_is_primary() {
        let temp_dir = tempdir().unwrap();
        let cwd = temp_dir.path();
        fs::write(
            cwd.join("cookbump.toml"),
            "cookbook_path = [\"site-cookbooks\", \"cookbooks\"]",
        )
        .unwrap();

        let config = load(None, cwd, &[]).unwrap();
        assert_eq!(
            config.primary_cookbook_path().unwrap(),
            cwd.join("site-cookbooks")
        );
    }

    #[test]
    fn fails_on_invalid_toml() {
        let temp_dir = tempdir().unwrap();
        let cwd = temp_dir.path();
        fs::write(cwd.join("cookbump.toml"), "cookbook_path = [").unwrap();

        let err = load(None, cwd, &[]).unwrap_err();
        assert!(err.to_string().contains("not valid TOML"));
    }

    #[test]
    fn rejects_empty_cookbook_path_entries() {
        let temp_dir = tempdir().unwrap();
        let cwd = temp_dir.path();
        fs::write(cwd.join("cookbump.toml"), "cookbook_path = [\" \"]").unwrap();

        let err = load(None, cwd, &[]).unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn metadata_file_must_be_a_bare_name() {
        let temp_dir = tempdir().unwrap();
        let cwd = temp_dir.path();
        fs::write(cwd.join("cookbump.toml"), "metadata_file = \"../metadata.rb\"").unwrap();

        let err = load(None, cwd, &[]).unwrap_err();
        assert!(err.to_string().contains("must be a file name"));
    }

    #[test]
    fn reads_custom_metadata_file_name() {
        let temp_dir = tempdir().unwrap();
        let cwd = temp_dir.path();
        fs::write(
            cwd.join("cookbump.toml"),
            "cookbook_path = [\"cookbooks\"]\nmetadata_file = \"metadata.json\"",
        )
        .unwrap();

        let config = load(None, cwd, &[]).unwrap();
        assert_eq!(config.metadata_file, "metadata.json");
    }

    #[test]
    fn warns_on_unknown_root_keys() {
        let temp_dir = tempdir().unwrap();
        let cwd = temp_dir.path();
        fs::write(
            cwd.join("cookbump.toml"),
            "cookbook_path = [\"cookbooks\"]\nnode_name = \"workstation\"",
        )
        .unwrap();

        let config = load(None, cwd, &[]).unwrap();
        assert_eq!(config.warnings.len(), 1);
        assert!(config.warnings[0].contains("node_name"));
    }
}
