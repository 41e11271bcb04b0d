//! A thin subprocess-backed [`Debugger`]. It spawns (or attaches to) a real
//! OS process and drives it with plain signals; it does not implement real
//! debugging (no breakpoints, no register/frame introspection), which
//! stays out of scope. `frame()` therefore always reports `NoFrame`. This
//! mirrors how the reference debugger crate's own backend is, at bottom,
//! a subprocess wrapper used mostly from its own test suite.

use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::error::DebuggerError;
use crate::session::types::{Event, Frame};

use super::Debugger;

enum Target {
    /// A child we spawned; reapable with `waitpid`.
    Owned(Child),
    /// A pid we attached to but did not spawn; not our child, so we can
    /// only poll for its continued existence.
    Foreign(i32),
}

pub struct ProcessDebugger {
    target: Mutex<Option<Target>>,
}

impl ProcessDebugger {
    pub fn new() -> Self {
        Self {
            target: Mutex::new(None),
        }
    }

    fn send_signal(pid: i32, signal: Signal) -> Result<(), DebuggerError> {
        signal::kill(Pid::from_raw(pid), signal)
            .map_err(|e| DebuggerError::BackendError(format!("kill({}, {:?}): {}", pid, signal, e)))
    }
}

impl Default for ProcessDebugger {
    fn default() -> Self {
        Self::new()
    }
}

impl Debugger for ProcessDebugger {
    fn launch(&self, exec: &str, args: &[String], cwd: Option<&str>) -> Result<(), DebuggerError> {
        let mut guard = self.target.lock().unwrap();
        if guard.is_some() {
            return Err(DebuggerError::BackendError("a debuggee is already active".to_string()));
        }
        let mut command = Command::new(exec);
        command.args(args).stdin(Stdio::null());
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        let child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DebuggerError::NotFound(exec.to_string())
            } else if e.kind() == std::io::ErrorKind::PermissionDenied {
                DebuggerError::PermissionDenied(exec.to_string())
            } else {
                DebuggerError::BackendError(e.to_string())
            }
        })?;
        *guard = Some(Target::Owned(child));
        Ok(())
    }

    fn attach(&self, pid: i32) -> Result<(), DebuggerError> {
        let mut guard = self.target.lock().unwrap();
        if guard.is_some() {
            return Err(DebuggerError::BackendError("a debuggee is already active".to_string()));
        }
        Self::send_signal(pid, Signal::SIGCONT).map_err(|_| {
            DebuggerError::NoSuchProcess(pid.to_string())
        })?;
        *guard = Some(Target::Foreign(pid));
        Ok(())
    }

    fn continue_thread(&self, _tid: u32) -> Result<(), DebuggerError> {
        let guard = self.target.lock().unwrap();
        match guard.as_ref() {
            Some(Target::Owned(child)) => Self::send_signal(child.id() as i32, Signal::SIGCONT),
            Some(Target::Foreign(pid)) => Self::send_signal(*pid, Signal::SIGCONT),
            None => Err(DebuggerError::NotActive),
        }
    }

    fn terminate(&self) -> Result<(), DebuggerError> {
        let mut guard = self.target.lock().unwrap();
        match guard.take() {
            Some(Target::Owned(mut child)) => {
                let _ = child.kill();
                let _ = child.wait();
                Ok(())
            }
            Some(Target::Foreign(pid)) => Self::send_signal(pid, Signal::SIGKILL),
            None => Err(DebuggerError::NotActive),
        }
    }

    fn detach(&self) -> Result<(), DebuggerError> {
        let mut guard = self.target.lock().unwrap();
        match guard.take() {
            Some(_) => Ok(()),
            None => Err(DebuggerError::NotActive),
        }
    }

    fn wait(&self) -> Result<Event, DebuggerError> {
        let pid = {
            let guard = self.target.lock().unwrap();
            match guard.as_ref() {
                Some(Target::Owned(child)) => child.id() as i32,
                Some(Target::Foreign(pid)) => *pid,
                None => return Ok(Event::Exited { exit_code: 0 }),
            }
        };

        loop {
            match waitpid(Pid::from_raw(pid), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(_, code)) => return Ok(Event::Exited { exit_code: code }),
                Ok(WaitStatus::Signaled(_, sig, _)) => {
                    return Ok(Event::Exited {
                        exit_code: 128 + sig as i32,
                    })
                }
                Ok(WaitStatus::StillAlive) => {
                    if signal::kill(Pid::from_raw(pid), None).is_err() {
                        return Ok(Event::Exited { exit_code: 0 });
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                // Not our child (attached foreign pid): fall back to
                // polling for its continued existence.
                Err(nix::errno::Errno::ECHILD) => {
                    if signal::kill(Pid::from_raw(pid), None).is_err() {
                        return Ok(Event::Exited { exit_code: 0 });
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Ok(other) => {
                    return Err(DebuggerError::BackendError(format!(
                        "unexpected wait status: {:?}",
                        other
                    )))
                }
                Err(e) => return Err(DebuggerError::BackendError(e.to_string())),
            }
        }
    }

    fn threads(&self) -> Vec<u32> {
        let guard = self.target.lock().unwrap();
        match guard.as_ref() {
            Some(Target::Owned(child)) => vec![child.id()],
            Some(Target::Foreign(pid)) => vec![*pid as u32],
            None => Vec::new(),
        }
    }

    fn frame(&self, _tid: u32) -> Result<Frame, DebuggerError> {
        // No ptrace-based register/frame introspection; callers must
        // tolerate this per the debugger abstraction's contract.
        Err(DebuggerError::NoFrame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_rejects_nonexistent_executable() {
        let dbg = ProcessDebugger::new();
        let result = dbg.launch("/no/such/executable-aliceserver-test", &[], None);
        assert!(matches!(result, Err(DebuggerError::NotFound(_))));
    }

    #[test]
    fn launch_then_wait_reports_exit_code() {
        let dbg = ProcessDebugger::new();
        dbg.launch("/bin/sh", &["-c".to_string(), "exit 3".to_string()], None)
            .unwrap();
        let event = dbg.wait().unwrap();
        assert_eq!(event, Event::Exited { exit_code: 3 });
    }

    #[test]
    fn continue_without_an_active_process_is_not_active() {
        let dbg = ProcessDebugger::new();
        assert!(matches!(
            dbg.continue_thread(0),
            Err(DebuggerError::NotActive)
        ));
    }

    #[test]
    fn terminate_kills_a_long_running_child() {
        let dbg = ProcessDebugger::new();
        dbg.launch("/bin/sleep", &["30".to_string()], None).unwrap();
        dbg.terminate().unwrap();
        let event = dbg.wait().unwrap();
        assert_eq!(event, Event::Exited { exit_code: 0 });
    }

    #[test]
    fn frame_is_never_available() {
        let dbg = ProcessDebugger::new();
        dbg.launch("/bin/sleep", &["5".to_string()], None).unwrap();
        assert!(matches!(dbg.frame(0), Err(DebuggerError::NoFrame)));
        dbg.terminate().unwrap();
    }
}
