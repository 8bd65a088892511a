use crate::cli::BumpArgs;
use crate::config::{self, ResolvedConfig};
use crate::cookbook::{Cookbook, CookbookLoader, MetadataLoader};
use crate::error::BumpError;
use crate::metadata;
use crate::version::{self, BumpLevel};
use anyhow::{Context, Result};
use similar::TextDiff;
use std::fs;
use std::path::{Path, PathBuf};

pub const BUMP_USAGE: &str = "USAGE: cookbump bump COOKBOOK [MAJOR|MINOR|PATCH]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpRequest {
    pub cookbook: String,
    pub level: BumpLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpOutcome {
    pub cookbook: String,
    pub level: BumpLevel,
    pub old_version: String,
    pub new_version: String,
    pub metadata_file: PathBuf,
}

pub fn run(args: BumpArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine current directory.")?;
    run_with_loader(&cwd, &args, |config| {
        MetadataLoader::new(config.metadata_file.clone())
    })
}

pub(crate) fn run_with_loader<L, F>(cwd: &Path, args: &BumpArgs, make_loader: F) -> Result<()>
where
    L: CookbookLoader,
    F: FnOnce(&ResolvedConfig) -> L,
{
    let config = config::load(args.config.config.as_deref(), cwd, &args.config.cookbook_path)?;
    for warning in &config.warnings {
        eprintln!("warning: {warning}");
    }
    if let Some(path) = config.source.path() {
        tracing::debug!(path = %path.display(), "loaded config");
    }

    let cookbook_path = config.primary_cookbook_path().inspect_err(|_| print_usage())?;
    if args.args.is_empty() {
        println!("{BUMP_USAGE}");
        return Ok(());
    }
    let request = parse_request(&args.args).inspect_err(|_| print_usage())?;

    let loader = make_loader(&config);
    if args.dry_run {
        let outcome = plan(&loader, cookbook_path, &request.cookbook, request.level)?;
        preview(&outcome)?;
        return Ok(());
    }

    let outcome = bump(&loader, cookbook_path, &request.cookbook, request.level)?;
    println!(
        "Bumping {} level of the {} cookbook from {} to {}",
        outcome.level, outcome.cookbook, outcome.old_version, outcome.new_version
    );
    Ok(())
}

/// Validates the raw `COOKBOOK LEVEL` arguments.
pub fn parse_request(args: &[String]) -> Result<BumpRequest, BumpError> {
    let [cookbook, level] = args else {
        return Err(BumpError::Usage(
            "Please specify the cookbook whose version you wish to bump, and the type of bump \
             you wish to apply."
                .to_string(),
        ));
    };

    Ok(BumpRequest {
        cookbook: cookbook.clone(),
        level: level.parse()?,
    })
}

/// Computes the bumped version and rewrites the cookbook's metadata file.
pub fn bump(
    loader: &dyn CookbookLoader,
    cookbook_path: &Path,
    cookbook: &str,
    level: BumpLevel,
) -> Result<BumpOutcome, BumpError> {
    let outcome = plan(loader, cookbook_path, cookbook, level)?;
    metadata::rewrite_version(
        &outcome.metadata_file,
        &outcome.old_version,
        &outcome.new_version,
    )?;
    Ok(outcome)
}

fn plan(
    loader: &dyn CookbookLoader,
    cookbook_path: &Path,
    cookbook: &str,
    level: BumpLevel,
) -> Result<BumpOutcome, BumpError> {
    let Cookbook {
        name,
        version: declared,
        metadata_file,
        ..
    } = loader.load(cookbook_path, cookbook)?;

    let current = version::parse_version(&declared)?;
    let bumped = version::bump_version(&current, level)?;
    tracing::debug!(cookbook = %name, %current, %bumped, %level, "computed bump");

    Ok(BumpOutcome {
        cookbook: name,
        level,
        old_version: current.to_string(),
        new_version: bumped.to_string(),
        metadata_file,
    })
}

fn preview(outcome: &BumpOutcome) -> Result<()> {
    let before = fs::read_to_string(&outcome.metadata_file)
        .map_err(|err| BumpError::read(&outcome.metadata_file, err))?;
    let after = metadata::replace_version(&before, &outcome.old_version, &outcome.new_version);

    println!(
        "Dry run: would bump {} level of the {} cookbook from {} to {} in `{}`",
        outcome.level,
        outcome.cookbook,
        outcome.old_version,
        outcome.new_version,
        outcome.metadata_file.display()
    );
    print_diff(&before, &after);
    Ok(())
}

fn print_usage() {
    eprintln!("{BUMP_USAGE}");
}

fn print_diff(before: &str, after: &str) {
    let diff = TextDiff::from_lines(before, after);
    let unified = diff
        .unified_diff()
        .context_radius(3)
        .header("current", "proposed")
        .to_string();

    if unified.trim().is_empty() {
        println!("No textual diff.");
    } else {
        println!("{unified}");
    }
}
