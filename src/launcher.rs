//! Detached process launching for key-bound applications

use anyhow::{Context, Result};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::{ForkResult, Pid, dup2_stdin, execvp, fork, setsid};
use std::ffi::CString;
use std::fs::File;
use tracing::{error, info};

/// Exit status of a child whose exec failed
const EXEC_FAILED: i32 = 127;

/// Starts external programs on behalf of the window manager
pub trait Launch {
    /// Start `program` detached. Failures are logged, never returned.
    fn spawn(&self, program: &str);
}

/// Launches programs as their own session leader
#[derive(Debug, Default)]
pub struct ProcessLauncher;

impl Launch for ProcessLauncher {
    fn spawn(&self, program: &str) {
        match spawn_detached(program) {
            Ok(pid) => info!("Launched {} (pid {})", program, pid),
            Err(e) => error!("Failed to launch {}: {:#}", program, e),
        }
    }
}

/// Fork and exec `program` with no arguments in a new session.
///
/// The child is never waited on. If exec fails only the child exits, with
/// status 127.
pub fn spawn_detached(program: &str) -> Result<Pid> {
    let path = CString::new(program).context("Program name contains a NUL byte")?;
    let argv = [path.as_c_str()];
    let null = File::open("/dev/null").context("Failed to open /dev/null")?;

    // Safety: the child only makes async-signal-safe calls before exec or
    // _exit
    match unsafe { fork() }.context("fork failed")? {
        ForkResult::Parent { child } => Ok(child),
        ForkResult::Child => {
            let _ = setsid();
            let _ = unsafe { signal::signal(Signal::SIGCHLD, SigHandler::SigDfl) };
            let _ = dup2_stdin(&null);
            let _ = execvp(&path, &argv);
            unsafe { libc::_exit(EXEC_FAILED) }
        }
    }
}

/// Let the kernel reap exited children instead of leaving zombies
pub fn reap_children_automatically() -> Result<()> {
    let action = SigAction::new(SigHandler::SigIgn, SaFlags::SA_NOCLDWAIT, SigSet::empty());
    // Safety: SIG_IGN installs no handler code
    unsafe { signal::sigaction(Signal::SIGCHLD, &action) }
        .context("Failed to ignore SIGCHLD")?;
    Ok(())
}
