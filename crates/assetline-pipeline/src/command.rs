//! External collaborator invocation (style compiler, bundler, minifier)

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use assetline_core::config::CommandSpec;
use assetline_core::TaskError;

/// Placeholder values and working directory for one collaborator call
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Entry point substituted for `{entry}`
    pub entry: Option<&'a Path>,
    /// Input file substituted for `{file}`
    pub file: Option<&'a Path>,
    /// Category source directory substituted for `{source_dir}`
    pub source_dir: &'a Path,
    /// Working directory of the child process
    pub cwd: &'a Path,
}

impl<'a> Invocation<'a> {
    /// Invocation for a source directory with no path placeholders
    pub fn new(source_dir: &'a Path, cwd: &'a Path) -> Self {
        Self {
            entry: None,
            file: None,
            source_dir,
            cwd,
        }
    }

    pub fn entry(mut self, entry: &'a Path) -> Self {
        self.entry = Some(entry);
        self
    }

    pub fn file(mut self, file: &'a Path) -> Self {
        self.file = Some(file);
        self
    }

    fn substitute(&self, arg: &str) -> String {
        let mut out = arg.replace("{source_dir}", &self.source_dir.to_string_lossy());
        if let Some(entry) = self.entry {
            out = out.replace("{entry}", &entry.to_string_lossy());
        }
        if let Some(file) = self.file {
            out = out.replace("{file}", &file.to_string_lossy());
        }
        out
    }
}

/// Run a collaborator and return what it wrote to stdout.
///
/// `input` is fed on stdin unless the command names its input through an
/// `{entry}` or `{file}` placeholder. `subject` is the source file errors are
/// attributed to.
#[instrument(skip(spec, input), fields(tool = %spec.program))]
pub async fn run_command(
    spec: &CommandSpec,
    invocation: &Invocation<'_>,
    input: Option<&[u8]>,
    subject: &Path,
) -> Result<Vec<u8>, TaskError> {
    let args: Vec<String> = spec.args.iter().map(|a| invocation.substitute(a)).collect();
    let feed_stdin = !spec.takes_path_argument();

    debug!(args = ?args, feed_stdin, "running collaborator");

    let mut cmd = Command::new(&spec.program);
    cmd.args(&args)
        .current_dir(invocation.cwd)
        .stdin(if feed_stdin {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| TaskError::Collaborator {
        tool: spec.program.clone(),
        message: e.to_string(),
    })?;

    // Write stdin concurrently so a chatty child cannot block on a full pipe
    let writer = match (feed_stdin, child.stdin.take()) {
        (true, Some(mut stdin)) => {
            let data = input.map(<[u8]>::to_vec).unwrap_or_default();
            Some(tokio::spawn(async move {
                let result = stdin.write_all(&data).await;
                drop(stdin);
                result
            }))
        }
        _ => None,
    };

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| TaskError::Collaborator {
            tool: spec.program.clone(),
            message: e.to_string(),
        })?;

    if let Some(writer) = writer {
        // A child that exits without reading stdin closes the pipe early; its
        // exit status below is what matters
        if let Ok(Err(e)) = writer.await {
            debug!(error = %e, "collaborator closed stdin early");
        }
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("{} exited with {}", spec.program, output.status)
        } else {
            stderr
        };
        return Err(TaskError::syntax(subject, message));
    }

    Ok(output.stdout)
}
