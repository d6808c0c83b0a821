use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use log::{debug, warn};

use crate::EngineError;

const QUIT_GRACE: Duration = Duration::from_millis(100);

/// The streams a session talks over, plus the child process when there is one.
pub struct Transport {
    pub(crate) input: Box<dyn Write + Send>,
    pub(crate) output: Box<dyn BufRead + Send>,
    pub(crate) process: Option<EngineProcess>,
}

impl Transport {
    pub fn spawn(path: &Path, args: &[String]) -> Result<Self, EngineError> {
        let mut child = Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: path.to_path_buf(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(EngineError::MissingPipe("stdin"));
        let stdout = child.stdout.take().ok_or(EngineError::MissingPipe("stdout"));
        let mut process = EngineProcess { child };
        let (stdin, stdout) = match (stdin, stdout) {
            (Ok(stdin), Ok(stdout)) => (stdin, stdout),
            (Err(e), _) | (_, Err(e)) => {
                process.terminate();
                return Err(e);
            }
        };

        debug!("Spawned engine {:?} (pid {})", path, process.id());

        Ok(Self {
            input: Box::new(BufWriter::new(stdin)),
            output: Box::new(BufReader::new(stdout)),
            process: Some(process),
        })
    }

    /// In-process streams, for engines that are not child processes.
    pub fn from_streams<W, R>(input: W, output: R) -> Self
    where
        W: Write + Send + 'static,
        R: BufRead + Send + 'static,
    {
        Self {
            input: Box::new(input),
            output: Box::new(output),
            process: None,
        }
    }
}

pub struct EngineProcess {
    child: Child,
}

impl EngineProcess {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Waits briefly for the process to exit on its own, then kills it.
    pub fn terminate(&mut self) {
        // Give the engine a moment to act on `quit`
        thread::sleep(QUIT_GRACE);

        match self.child.try_wait() {
            Ok(Some(status)) => debug!("Engine exited with {}", status),
            Ok(None) => {
                warn!("Engine did not quit, killing it");
                let _ = self.child.kill();
                let _ = self.child.wait();
            }
            Err(_) => {
                let _ = self.child.kill();
            }
        }
    }
}
