//! An in-memory, deterministic [`Debugger`] used by the session engine's
//! own tests and by the adapters' black-box tests. It never spawns a real
//! process; `launch`/`attach` just validate their arguments and flip an
//! internal flag, and `wait()` blocks (via a condition variable) until
//! either a scripted event is queued or the debuggee is stopped/detached,
//! at which point it reports `Exited{0}` — mirroring how a real blocking
//! `wait()` behaves without needing an actual subprocess.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::error::DebuggerError;
use crate::session::types::{Architecture, Event, Frame};

use super::Debugger;

struct State {
    active: bool,
    events: VecDeque<Event>,
}

pub struct MockDebugger {
    state: Mutex<State>,
    cv: Condvar,
}

impl MockDebugger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                active: false,
                events: VecDeque::new(),
            }),
            cv: Condvar::new(),
        }
    }

    /// Build a mock whose `wait()` replays exactly this sequence before
    /// falling back to `Exited{0}` once inactive.
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            state: Mutex::new(State {
                active: false,
                events: events.into(),
            }),
            cv: Condvar::new(),
        }
    }
}

impl Default for MockDebugger {
    fn default() -> Self {
        Self::new()
    }
}

impl Debugger for MockDebugger {
    fn launch(&self, exec: &str, _args: &[String], _cwd: Option<&str>) -> Result<(), DebuggerError> {
        if exec.is_empty() {
            return Err(DebuggerError::NotFound(exec.to_string()));
        }
        self.state.lock().unwrap().active = true;
        Ok(())
    }

    fn attach(&self, pid: i32) -> Result<(), DebuggerError> {
        if pid <= 0 {
            return Err(DebuggerError::NoSuchProcess(pid.to_string()));
        }
        self.state.lock().unwrap().active = true;
        Ok(())
    }

    fn continue_thread(&self, _tid: u32) -> Result<(), DebuggerError> {
        if !self.state.lock().unwrap().active {
            return Err(DebuggerError::NotActive);
        }
        Ok(())
    }

    fn terminate(&self) -> Result<(), DebuggerError> {
        let mut state = self.state.lock().unwrap();
        if !state.active {
            return Err(DebuggerError::NotActive);
        }
        state.active = false;
        self.cv.notify_all();
        Ok(())
    }

    fn detach(&self) -> Result<(), DebuggerError> {
        let mut state = self.state.lock().unwrap();
        if !state.active {
            return Err(DebuggerError::NotActive);
        }
        state.active = false;
        self.cv.notify_all();
        Ok(())
    }

    fn wait(&self) -> Result<Event, DebuggerError> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(event) = state.events.pop_front() {
                return Ok(event);
            }
            if !state.active {
                return Ok(Event::Exited { exit_code: 0 });
            }
            state = self.cv.wait(state).unwrap();
        }
    }

    fn threads(&self) -> Vec<u32> {
        vec![1]
    }

    fn frame(&self, tid: u32) -> Result<Frame, DebuggerError> {
        if tid == 1 && self.state.lock().unwrap().active {
            Ok(Frame {
                address: 0,
                function_name: Some("main".to_string()),
                arguments: Vec::new(),
                architecture: Architecture::host(),
            })
        } else {
            Err(DebuggerError::NoFrame)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_rejects_empty_path() {
        let dbg = MockDebugger::new();
        assert!(matches!(
            dbg.launch("", &[], None),
            Err(DebuggerError::NotFound(_))
        ));
    }

    #[test]
    fn continue_requires_active_process() {
        let dbg = MockDebugger::new();
        assert!(matches!(
            dbg.continue_thread(1),
            Err(DebuggerError::NotActive)
        ));
    }

    #[test]
    fn wait_falls_back_to_exited_when_inactive() {
        let dbg = MockDebugger::new();
        assert_eq!(dbg.wait().unwrap(), Event::Exited { exit_code: 0 });
    }

    #[test]
    fn wait_replays_scripted_events_before_falling_back() {
        let dbg = MockDebugger::with_events(vec![Event::Continued { thread_id: 1 }]);
        assert_eq!(dbg.wait().unwrap(), Event::Continued { thread_id: 1 });
        assert_eq!(dbg.wait().unwrap(), Event::Exited { exit_code: 0 });
    }

    #[test]
    fn wait_blocks_while_active_then_unblocks_on_terminate() {
        use std::sync::Arc;
        use std::thread;
        use std::time::Duration;

        let dbg = Arc::new(MockDebugger::new());
        dbg.launch("/bin/true", &[], None).unwrap();

        let waiter = {
            let dbg = Arc::clone(&dbg);
            thread::spawn(move || dbg.wait().unwrap())
        };

        thread::sleep(Duration::from_millis(20));
        dbg.terminate().unwrap();
        assert_eq!(waiter.join().unwrap(), Event::Exited { exit_code: 0 });
    }
}
