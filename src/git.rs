use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

pub trait CommandRunner {
    fn run(&mut self, cwd: &Path, program: &str, args: &[String]) -> Result<CommandOutput>;
}

pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, cwd: &Path, program: &str, args: &[String]) -> Result<CommandOutput> {
        tracing::debug!(cwd = %cwd.display(), command = %format_command(program, args), "running");
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .with_context(|| format!("Failed to execute `{program}`. Is it installed?"))?;

        Ok(CommandOutput {
            status: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Reads `remote.origin.url`. A repository without an origin remote yields
/// `None`; `git config --get` exits 1 for a missing key.
pub fn origin_url(runner: &mut dyn CommandRunner, repo_root: &Path) -> Result<Option<String>> {
    let args = vec![
        "config".to_string(),
        "--get".to_string(),
        "remote.origin.url".to_string(),
    ];
    let output = runner.run(repo_root, "git", &args)?;
    if output.status == 1 {
        return Ok(None);
    }
    check_status(&output, "git", &args, "Failed to read the origin remote.")?;

    let url = output.stdout.trim();
    if url.is_empty() {
        return Ok(None);
    }
    Ok(Some(url.to_string()))
}

pub fn list_tags(runner: &mut dyn CommandRunner, repo_root: &Path) -> Result<Vec<String>> {
    let args = vec!["tag".to_string(), "--list".to_string()];
    let output = runner.run(repo_root, "git", &args)?;
    check_status(&output, "git", &args, "Failed to list git tags.")?;

    Ok(output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn check_status(output: &CommandOutput, program: &str, args: &[String], context: &str) -> Result<()> {
    if output.status != 0 {
        let stderr = output.stderr.trim();
        let details = if stderr.is_empty() {
            "no stderr output"
        } else {
            stderr
        };
        bail!(
            "{context} Command `{}` failed (exit {}): {details}",
            format_command(program, args),
            output.status
        );
    }
    Ok(())
}

fn format_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        return program.to_string();
    }
    format!("{program} {}", args.join(" "))
}
