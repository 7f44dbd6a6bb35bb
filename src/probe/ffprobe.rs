use super::{parse_duration_output, DurationProbe, ProbeDiag};
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub struct Ffprobe {
    exe: PathBuf,
    timeout: Option<Duration>,
}

impl Ffprobe {
    pub fn new(cfg: &Config) -> Self {
        let timeout = if cfg.probe.timeout_seconds > 0 {
            Some(Duration::from_secs(cfg.probe.timeout_seconds))
        } else {
            None
        };
        Self {
            exe: PathBuf::from(cfg.probe.ffprobe_exe.trim()),
            timeout,
        }
    }

    pub fn doctor(&self) -> ProbeDiag {
        let exe = self.exe.display().to_string();
        match self.run(&[OsStr::new("-version")]) {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                ProbeDiag {
                    ffprobe_exe: exe,
                    version: stdout.lines().next().map(|l| l.trim().to_string()),
                    ok: true,
                    error: None,
                }
            }
            Ok(output) => ProbeDiag {
                ffprobe_exe: exe,
                version: None,
                ok: false,
                error: Some(String::from_utf8_lossy(&output.stderr).trim().to_string()),
            },
            Err(err) => ProbeDiag {
                ffprobe_exe: exe,
                version: None,
                ok: false,
                error: Some(format!("{err:#}")),
            },
        }
    }

    fn run(&self, args: &[&OsStr]) -> Result<Output> {
        debug!("ffprobe run {:?} timeout={:?}", args, self.timeout);
        let mut cmd = Command::new(&self.exe);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning {}", self.exe.display()))?;

        match self.timeout {
            Some(timeout) => wait_with_timeout(&mut child, timeout),
            None => child.wait_with_output().with_context(|| "waiting for ffprobe"),
        }
    }
}

impl DurationProbe for Ffprobe {
    fn duration_seconds(&self, path: &Path) -> Result<i64> {
        let output = self.run(&[
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-show_entries"),
            OsStr::new("format=duration"),
            OsStr::new("-of"),
            OsStr::new("default=noprint_wrappers=1:nokey=1"),
            path.as_os_str(),
        ])?;

        if !output.status.success() {
            return Err(anyhow!(
                "ffprobe failed on {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        // ffprobe's diagnostics share the parse with its answer.
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        parse_duration_output(&combined).with_context(|| format!("probing {}", path.display()))
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Output> {
    // Drain pipes while waiting so the child can't block on a full buffer.
    let stdout_reader = child.stdout.take();
    let stderr_reader = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_reader {
            out.read_to_end(&mut buf).with_context(|| "read stdout")?;
        }
        Ok(buf)
    });

    let stderr_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            err.read_to_end(&mut buf).with_context(|| "read stderr")?;
        }
        Ok(buf)
    });

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().with_context(|| "try_wait")? {
            let stdout = stdout_thread
                .join()
                .map_err(|_| anyhow!("stdout reader thread panicked"))??;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            return Ok(Output {
                status,
                stdout,
                stderr,
            });
        }

        if start.elapsed() > timeout {
            warn!("ffprobe timed out after {:?}", timeout);
            if let Err(err) = child.kill() {
                warn!("failed to kill ffprobe after timeout: {err}");
            }
            child.wait().with_context(|| "wait after kill")?;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            match stdout_thread.join() {
                Ok(Err(err)) => warn!("discarding ffprobe stdout after timeout: {err:#}"),
                Err(_) => warn!("stdout reader thread panicked"),
                Ok(Ok(_)) => {}
            }
            return Err(anyhow!(
                "ffprobe exceeded timeout ({:?}); stderr: {}",
                timeout,
                String::from_utf8_lossy(&stderr)
            ));
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}
