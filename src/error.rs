use crate::version::BumpLevel;
use std::path::PathBuf;

/// Failures that end a cookbump invocation.
///
/// Command code returns these wrapped in `anyhow::Error`; callers that care
/// about the kind use `downcast_ref::<BumpError>()`.
#[derive(Debug, thiserror::Error)]
pub enum BumpError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Configuration(String),
    #[error("Cookbook `{name}` was not found under `{}`: {reason}", .cookbook_path.display())]
    CookbookNotFound {
        name: String,
        cookbook_path: PathBuf,
        reason: String,
    },
    #[error(
        "Version `{version}` is malformed. Expected three dot-separated numbers such as `1.2.3`."
    )]
    MalformedVersion { version: String },
    #[error(
        "Cannot bump the {level} level of `{version}`: the component is already at its maximum."
    )]
    VersionOverflow { version: String, level: BumpLevel },
    #[error("Failed to {action} `{}`.", .path.display())]
    FileAccess {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unable to find a git repo for this cookbook.")]
    RepoNotFound,
}

impl BumpError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            action: "read",
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            action: "write",
            path: path.into(),
            source,
        }
    }
}
