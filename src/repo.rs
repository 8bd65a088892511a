use crate::cli::{ConfigArgs, RepoArgs, TagsArgs};
use crate::config;
use crate::cookbook::{CookbookLoader, MetadataLoader};
use crate::error::BumpError;
use crate::git::{self, CommandRunner, ProcessRunner};
use anyhow::{Context, Result};
use dialoguer::Confirm;
use std::path::{Path, PathBuf};

const GIT_DIR: &str = ".git";
const GIT_CONFIG: &str = "config";

pub trait Interactor {
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

struct CliInteractor;

impl Interactor for CliInteractor {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("Failed to read confirmation.")
    }
}

pub fn run_repo(args: RepoArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine current directory.")?;
    let repo_root = resolve_repo_root(&args.config, &cwd, &args.cookbook)?;
    println!("{}", repo_root.display());
    Ok(())
}

pub fn run_tags(args: TagsArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine current directory.")?;
    let repo_root = resolve_repo_root(&args.config, &cwd, &args.cookbook)?;

    let mut runner = ProcessRunner;
    let mut interactor = CliInteractor;
    match list_tags_with(
        &repo_root,
        &args.cookbook,
        args.yes,
        &mut runner,
        &mut interactor,
    )? {
        Some(tags) => {
            for tag in tags {
                println!("{tag}");
            }
        }
        None => println!("Aborted."),
    }
    Ok(())
}

fn resolve_repo_root(args: &ConfigArgs, cwd: &Path, cookbook: &str) -> Result<PathBuf> {
    let config = config::load(args.config.as_deref(), cwd, &args.cookbook_path)?;
    for warning in &config.warnings {
        eprintln!("warning: {warning}");
    }

    let cookbook_path = config.primary_cookbook_path()?;
    let loader = MetadataLoader::new(config.metadata_file.clone());
    let repo_root =
        find_repo_root(&loader, cookbook_path, cookbook)?.ok_or(BumpError::RepoNotFound)?;
    Ok(repo_root)
}

/// Finds the git working copy enclosing a cookbook.
pub fn find_repo_root(
    loader: &dyn CookbookLoader,
    cookbook_path: &Path,
    cookbook: &str,
) -> Result<Option<PathBuf>, BumpError> {
    let cookbook = loader.load(cookbook_path, cookbook)?;
    Ok(locate_repo_root(&cookbook.root_dir))
}

/// Walks from `start` towards the filesystem root and returns the first
/// directory holding `.git/config`. Nearer repositories win.
pub fn locate_repo_root(start: &Path) -> Option<PathBuf> {
    for candidate in start.ancestors() {
        tracing::debug!(dir = %candidate.display(), "checking for git repo");
        if candidate.join(GIT_DIR).join(GIT_CONFIG).is_file() {
            return Some(candidate.to_path_buf());
        }
    }
    None
}

/// Confirms with the user, then lists the repository's tags. Returns `None`
/// when the user declines.
pub(crate) fn list_tags_with(
    repo_root: &Path,
    cookbook: &str,
    yes: bool,
    runner: &mut dyn CommandRunner,
    interactor: &mut dyn Interactor,
) -> Result<Option<Vec<String>>> {
    let origin = git::origin_url(runner, repo_root)?;
    if !yes {
        let prompt = tag_prompt(repo_root, cookbook, origin.as_deref());
        if !interactor.confirm(&prompt)? {
            return Ok(None);
        }
    }

    git::list_tags(runner, repo_root).map(Some)
}

fn tag_prompt(repo_root: &Path, cookbook: &str, origin: Option<&str>) -> String {
    if origin.is_some_and(|url| remote_names_cookbook(url, cookbook)) {
        format!(
            "I found a repo at {} - do you want to tag it?",
            repo_root.display()
        )
    } else {
        format!(
            "I didn't find a repo with a name like {cookbook}.  I did find {} - are you sure \
             you want to tag it?",
            repo_root.display()
        )
    }
}

fn remote_names_cookbook(url: &str, cookbook: &str) -> bool {
    url.rsplit('/')
        .next()
        .is_some_and(|segment| segment.contains(cookbook))
}
