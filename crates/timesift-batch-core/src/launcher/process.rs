//! Launcher backed by real child processes.

use crate::launcher::Launcher;
use crate::models::{Invocation, JobStatus};
use async_trait::async_trait;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Spawns the pipeline with `tokio::process` and waits for it to exit.
///
/// Standard streams are inherited unless a log directory is set, in which
/// case stdout and stderr of each job go to `<log_dir>/<NN>-<site>.log`.
/// With `stdout_to_stderr` and no log directory, the child's stdout is
/// forwarded to our stderr so our own stdout carries only the report.
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
    timeout: Option<Duration>,
    log_dir: Option<PathBuf>,
    stdout_to_stderr: bool,
}

impl ProcessLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill a job that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_log_dir(mut self, log_dir: Option<PathBuf>) -> Self {
        self.log_dir = log_dir;
        self
    }

    /// Forward the pipeline's stdout to stderr. Ignored when a log directory is set.
    pub fn with_stdout_to_stderr(mut self, enabled: bool) -> Self {
        self.stdout_to_stderr = enabled;
        self
    }

    /// Log file used for a job when a log directory is configured.
    ///
    /// The one-based job position prefixes the sanitized site name, so two
    /// jobs never share a file even when their names sanitize alike.
    pub fn log_path(log_dir: &Path, index: usize, site: &str) -> PathBuf {
        let file_name: String = site
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        log_dir.join(format!("{:02}-{}.log", index + 1, file_name))
    }

    fn forwards_stdout(&self) -> bool {
        self.stdout_to_stderr && self.log_dir.is_none()
    }

    fn redirect_output(&self, cmd: &mut Command, invocation: &Invocation) -> std::io::Result<()> {
        if let Some(log_dir) = &self.log_dir {
            fs::create_dir_all(log_dir)?;
            let stdout = File::create(Self::log_path(log_dir, invocation.index, &invocation.site))?;
            let stderr = stdout.try_clone()?;
            cmd.stdout(Stdio::from(stdout)).stderr(Stdio::from(stderr));
        } else if self.forwards_stdout() {
            cmd.stdout(Stdio::piped());
        }
        Ok(())
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&self, invocation: &Invocation) -> JobStatus {
        let mut cmd = Command::new(&invocation.program.command);
        // The child is killed if this future is dropped before it exits.
        cmd.args(invocation.argv())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Err(e) = self.redirect_output(&mut cmd, invocation) {
            return JobStatus::LogFailed {
                reason: e.to_string(),
            };
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return JobStatus::SpawnFailed {
                    reason: format!("{}: {}", invocation.program.command, e),
                }
            }
        };

        let forward = child.stdout.take().map(|mut stdout| {
            tokio::spawn(async move {
                let mut stderr = tokio::io::stderr();
                tokio::io::copy(&mut stdout, &mut stderr).await
            })
        });

        let waited = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait()).await {
                Ok(waited) => waited,
                Err(_elapsed) => {
                    if let Err(e) = child.kill().await {
                        tracing::warn!(site = %invocation.site, "Failed to kill timed out job: {}", e);
                    }
                    if let Some(forward) = forward {
                        forward.abort();
                    }
                    return JobStatus::TimedOut {
                        after_secs: timeout.as_secs(),
                    };
                }
            },
            None => child.wait().await,
        };

        if let Some(forward) = forward {
            if let Ok(Err(e)) = forward.await {
                tracing::debug!(site = %invocation.site, "Stopped forwarding job output: {}", e);
            }
        }

        match waited {
            Ok(status) if status.success() => JobStatus::Succeeded,
            Ok(status) => JobStatus::Failed {
                exit_code: status.code(),
            },
            Err(e) => JobStatus::SpawnFailed {
                reason: format!("failed waiting for {}: {}", invocation.program.command, e),
            },
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::models::job::fixtures::site_job;
    use crate::models::Program;

    fn invocation(program: Program) -> Invocation {
        Invocation::build(0, &program, &site_job("baker"))
    }

    fn echo_args() -> Program {
        Program::new("sh").with_args(["-c", "echo \"$@\"", "timesift"])
    }

    #[tokio::test]
    async fn test_zero_exit_succeeds() {
        let status = ProcessLauncher::new().launch(&invocation(Program::new("true"))).await;
        assert_eq!(status, JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_non_zero_exit_reported() {
        let program = Program::new("sh").with_args(["-c", "exit 3", "timesift"]);
        let status = ProcessLauncher::new().launch(&invocation(program)).await;
        assert_eq!(status, JobStatus::Failed { exit_code: Some(3) });
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_failure() {
        let status = ProcessLauncher::new()
            .launch(&invocation(Program::new("/nonexistent/timesift")))
            .await;
        assert!(matches!(status, JobStatus::SpawnFailed { .. }));
    }

    #[tokio::test]
    async fn test_timeout_kills_job() {
        let program = Program::new("sh").with_args(["-c", "sleep 5", "timesift"]);
        let status = ProcessLauncher::new()
            .with_timeout(Some(Duration::from_secs(1)))
            .launch(&invocation(program))
            .await;
        assert_eq!(status, JobStatus::TimedOut { after_secs: 1 });
    }

    #[tokio::test]
    async fn test_dropped_launch_kills_job() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let program = Program::new("sh").with_args([
            "-c".to_string(),
            "sleep 1 && touch \"$0\"".to_string(),
            marker.display().to_string(),
        ]);
        let sleeper = invocation(program);
        let launcher = ProcessLauncher::new();

        let abandoned =
            tokio::time::timeout(Duration::from_millis(200), launcher.launch(&sleeper)).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "child kept running after its launch was dropped");
    }

    #[tokio::test]
    async fn test_output_written_to_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let status = ProcessLauncher::new()
            .with_log_dir(Some(dir.path().to_path_buf()))
            .launch(&invocation(echo_args()))
            .await;
        assert_eq!(status, JobStatus::Succeeded);

        let log = fs::read_to_string(ProcessLauncher::log_path(dir.path(), 0, "baker")).unwrap();
        assert!(log.contains("--output-path output/baker"));
        assert!(log.contains("--bounds -121.94 48.84 -121.7 48.7"));
    }

    #[tokio::test]
    async fn test_alike_site_names_keep_separate_logs() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = ProcessLauncher::new().with_log_dir(Some(dir.path().to_path_buf()));
        let program = echo_args();

        let first = Invocation::build(0, &program, &site_job("mt baker"));
        let second = Invocation::build(1, &program, &site_job("mt_baker"));
        assert_eq!(launcher.launch(&first).await, JobStatus::Succeeded);
        assert_eq!(launcher.launch(&second).await, JobStatus::Succeeded);

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["01-mt_baker.log", "02-mt_baker.log"]);

        let first_log = fs::read_to_string(dir.path().join("01-mt_baker.log")).unwrap();
        let second_log = fs::read_to_string(dir.path().join("02-mt_baker.log")).unwrap();
        assert!(first_log.contains("output/mt baker"));
        assert!(second_log.contains("output/mt_baker"));
    }

    #[tokio::test]
    async fn test_unusable_log_dir_is_log_failure() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("logs");
        fs::write(&not_a_dir, "").unwrap();

        let status = ProcessLauncher::new()
            .with_log_dir(Some(not_a_dir))
            .launch(&invocation(Program::new("true")))
            .await;

        assert!(matches!(status, JobStatus::LogFailed { .. }));
    }

    #[tokio::test]
    async fn test_forwarded_stdout_still_completes() {
        let status = ProcessLauncher::new()
            .with_stdout_to_stderr(true)
            .launch(&invocation(echo_args()))
            .await;
        assert_eq!(status, JobStatus::Succeeded);

        let program = Program::new("sh").with_args(["-c", "echo partial; exit 5", "timesift"]);
        let status = ProcessLauncher::new()
            .with_stdout_to_stderr(true)
            .launch(&invocation(program))
            .await;
        assert_eq!(status, JobStatus::Failed { exit_code: Some(5) });
    }

    #[test]
    fn test_log_path_numbers_and_sanitizes() {
        let path = ProcessLauncher::log_path(Path::new("logs"), 1, "mt baker/2");
        assert_eq!(path, PathBuf::from("logs/02-mt_baker_2.log"));
    }
}
