use std::{
    io::{self, Read as _},
    os::fd::{AsFd as _, AsRawFd},
    path::PathBuf,
    process::{Child, ChildStdout, Command, Stdio},
    time::Duration,
};

use log::{debug, info, warn};
use nix::{
    errno::Errno,
    fcntl::{FcntlArg, OFlag, fcntl},
    poll::{PollFd, PollFlags, poll},
};
use uuid::Uuid;

use crate::{
    error::SourceError,
    source::{Readiness, SessionId, StreamSource, poll_timeout},
};

/// Runs the producer as a child process and reads its stdout.
///
/// Termination is always `SIGKILL`; the producer gets no chance to shut
/// down on its own.
#[derive(Debug)]
pub struct ProcessSource {
    program: PathBuf,
    args: Vec<String>,
    running: Option<RunningSource>,
}

#[derive(Debug)]
struct RunningSource {
    session: SessionId,
    child: Child,
    stdout: ChildStdout,
}

impl ProcessSource {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            running: None,
        }
    }

    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Child process id of the running session.
    pub fn pid(&self) -> Option<u32> {
        self.running.as_ref().map(|running| running.child.id())
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn set_nonblocking(fd: &impl AsRawFd) -> nix::Result<()> {
    let flags = OFlag::from_bits_truncate(fcntl(fd.as_raw_fd(), FcntlArg::F_GETFL)?);
    fcntl(fd.as_raw_fd(), FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
    Ok(())
}

/// Maps returned poll events to a readiness, hang-up taking precedence
/// over error, and error over data.
pub(crate) fn classify(revents: PollFlags) -> Readiness {
    if revents.contains(PollFlags::POLLHUP) {
        Readiness::HangUp
    } else if revents.contains(PollFlags::POLLERR) {
        Readiness::Error
    } else if revents.contains(PollFlags::POLLIN) {
        Readiness::Readable
    } else {
        Readiness::Unknown(format!("{revents:?}"))
    }
}

impl StreamSource for ProcessSource {
    fn start(&mut self) -> Result<SessionId, SourceError> {
        if let Some(running) = &self.running {
            debug!("source already running as session {}", running.session);
            return Ok(running.session.clone());
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| SourceError::Spawn {
                command: self.command_line(),
                source,
            })?;

        let Some(stdout) = child.stdout.take() else {
            kill_and_reap(&mut child);
            return Err(SourceError::Spawn {
                command: self.command_line(),
                source: io::Error::new(io::ErrorKind::BrokenPipe, "stdout was not captured"),
            });
        };

        if let Err(e) = set_nonblocking(&stdout) {
            kill_and_reap(&mut child);
            return Err(SourceError::StreamConfig(e));
        }

        let session = SessionId::from(Uuid::new_v4());
        info!(
            "spawned \"{}\" as pid {} (session {session})",
            self.command_line(),
            child.id()
        );
        self.running = Some(RunningSource {
            session: session.clone(),
            child,
            stdout,
        });
        Ok(session)
    }

    fn stop(&mut self) {
        if let Some(mut running) = self.running.take() {
            debug!("killing source pid {}", running.child.id());
            kill_and_reap(&mut running.child);
        }
    }

    fn wait(&mut self, timeout: Duration) -> Readiness {
        let Some(running) = &self.running else {
            self.idle_wait(timeout);
            return Readiness::Timeout;
        };

        let interest = PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR;
        let mut fds = [PollFd::new(running.stdout.as_fd(), interest)];
        match poll(&mut fds, poll_timeout(timeout)) {
            Ok(0) | Err(Errno::EINTR) => Readiness::Timeout,
            Ok(_) => classify(fds[0].revents().unwrap_or_else(PollFlags::empty)),
            Err(e) => {
                warn!("poll on source output failed: {e}");
                Readiness::Timeout
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.running {
            Some(running) => running.stdout.read(buf),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "source is not running",
            )),
        }
    }
}

impl Drop for ProcessSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn kill_and_reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!("failed to kill source pid {}: {e}", child.id());
    }
    match child.wait() {
        Ok(status) => debug!("source pid {} exited with {status}", child.id()),
        Err(e) => warn!("failed to reap source pid {}: {e}", child.id()),
    }
}
