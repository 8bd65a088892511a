use crate::error::BumpError;
use semver::Version;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpLevel {
    Major,
    Minor,
    Patch,
}

impl BumpLevel {
    pub const ALL: [Self; 3] = [Self::Major, Self::Minor, Self::Patch];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
        }
    }

    /// Position of the component this level increments in `major.minor.patch`.
    pub fn index(self) -> usize {
        match self {
            Self::Major => 0,
            Self::Minor => 1,
            Self::Patch => 2,
        }
    }
}

impl fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for BumpLevel {
    type Err = BumpError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| {
                BumpError::Usage(format!(
                    "Sorry, '{value}' isn't a valid bump type.  Specify one of 'major', 'minor' or 'patch'"
                ))
            })
    }
}

/// Parses a plain `major.minor.patch` version. Pre-release and build
/// suffixes are rejected, as are leading zeros such as `1.02.3`.
pub fn parse_version(raw: &str) -> Result<Version, BumpError> {
    let malformed = || BumpError::MalformedVersion {
        version: raw.to_string(),
    };

    let version = Version::parse(raw.trim()).map_err(|_| malformed())?;
    if !version.pre.is_empty() || !version.build.is_empty() {
        return Err(malformed());
    }
    Ok(version)
}

/// Increments only the selected component. Lower components are left as
/// they are, so bumping `major` on `1.2.3` gives `2.2.3`.
pub fn bump_version(base: &Version, level: BumpLevel) -> Result<Version, BumpError> {
    let mut components = [base.major, base.minor, base.patch];
    let slot = &mut components[level.index()];
    *slot = slot.checked_add(1).ok_or_else(|| BumpError::VersionOverflow {
        version: base.to_string(),
        level,
    })?;

    let [major, minor, patch] = components;
    Ok(Version::new(major, minor, patch))
}
