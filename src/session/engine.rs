//! [`SessionEngine`]: protocol-independent request dispatch plus the
//! debuggee lifecycle state machine and event-delivery thread.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use log::{debug, warn};

use crate::debugger::Debugger;
use crate::session::types::{
    Capabilities, CapabilityFlag, Event, PathFormat, Reply, ReplyBody, Request, RequestKind,
    SessionState, TargetConfig,
};

/// Receives events from the event thread and formats/writes them through
/// whichever adapter is in charge of the wire protocol. Implemented by
/// each adapter; kept separate from [`crate::debugger::Debugger`] so the
/// engine never depends on protocol framing.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &Event);
}

/// Coordinates one adapter, one transport (indirectly, through the
/// adapter and the [`EventSink`]) and one debugger across the two-thread
/// model: the calling thread drives `dispatch`, a spawned thread drives
/// `wait()` and event delivery.
pub struct SessionEngine {
    debugger: Arc<dyn Debugger>,
    state: Mutex<SessionState>,
    target: Mutex<TargetConfig>,
    initialized: Mutex<bool>,
    requires_initialize: bool,
    known_commands: &'static [&'static str],
    server_capabilities: Vec<crate::session::types::CapabilityFlag>,
}

impl SessionEngine {
    pub fn new(
        debugger: Arc<dyn Debugger>,
        requires_initialize: bool,
        known_commands: &'static [&'static str],
        server_capabilities: Vec<crate::session::types::CapabilityFlag>,
    ) -> Self {
        Self {
            debugger,
            state: Mutex::new(SessionState::Idle),
            target: Mutex::new(TargetConfig::default()),
            initialized: Mutex::new(false),
            requires_initialize,
            known_commands,
            server_capabilities,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, new: SessionState) {
        *self.state.lock().unwrap() = new;
    }

    /// Resolve one request to a reply. The single entry point through
    /// which every `RequestKind` is handled, regardless of which adapter
    /// produced it.
    pub fn dispatch(&self, request: &Request) -> Reply {
        // Gate every debuggee-lifecycle request kind DAP can produce over
        // the wire behind `initialize`. The MI-only bookkeeping kinds
        // (`CwdSet`/`SetArgs`/`SetTarget`/`ListFeatures`/`Show`/
        // `InfoGdbMiCommand`) are never reachable from the DAP adapter and
        // are also how the CLI seeds a target before the DAP handshake, so
        // they stay ungated; MI itself never requires initialization at
        // all (`requires_initialize` is `false` for it).
        if matches!(
            request.kind,
            RequestKind::ConfigurationDone
                | RequestKind::Launch { .. }
                | RequestKind::Run
                | RequestKind::Attach { .. }
                | RequestKind::Continue { .. }
                | RequestKind::Detach
                | RequestKind::Terminate
                | RequestKind::Close { .. }
                | RequestKind::Unknown(_)
        ) {
            if let Some(err) = self.require_initialized() {
                return err;
            }
        }

        match &request.kind {
            RequestKind::NoOp => Reply::Success(ReplyBody::Empty),
            RequestKind::Silent => Reply::Success(ReplyBody::Empty),

            RequestKind::Initialize {
                client_id,
                client_name,
                path_format,
                client_capabilities,
                ..
            } => self.handle_initialize(client_id, client_name, *path_format, client_capabilities),

            RequestKind::ConfigurationDone => Reply::Success(ReplyBody::Empty),

            RequestKind::Launch { path, args, cwd } => self.handle_launch(path, args, cwd.as_deref()),

            RequestKind::Run => self.handle_run(),

            RequestKind::Attach { pid } => self.handle_attach(*pid),

            RequestKind::Continue { thread_id } => self.handle_continue(*thread_id),

            RequestKind::Detach => self.handle_detach(),

            RequestKind::Terminate => self.handle_terminate(),

            RequestKind::Close { terminate_debuggee } => self.handle_close(*terminate_debuggee),

            RequestKind::CwdSet(dir) => {
                self.target.lock().unwrap().working_directory = Some(dir.clone());
                Reply::Success(ReplyBody::Empty)
            }

            RequestKind::SetArgs(args) => {
                self.target.lock().unwrap().arguments = args.clone();
                Reply::Success(ReplyBody::Empty)
            }

            RequestKind::SetTarget(path) => {
                self.target.lock().unwrap().executable_path = Some(path.clone());
                Reply::Success(ReplyBody::Empty)
            }

            RequestKind::ListFeatures => Reply::Success(ReplyBody::Features(Vec::new())),

            RequestKind::Show(arg) => match arg.as_deref() {
                Some("version") => Reply::Success(ReplyBody::Version(crate::config::version_line())),
                _ => Reply::Success(ReplyBody::Empty),
            },

            RequestKind::InfoGdbMiCommand(name) => {
                let exists = self
                    .known_commands
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(name));
                Reply::Success(ReplyBody::CommandExists(exists))
            }

            RequestKind::Unknown(name) => Reply::Error(format!("Unknown request: \"{}\"", name)),
        }
    }

    fn handle_initialize(
        &self,
        _client_id: &Option<String>,
        _client_name: &Option<String>,
        path_format: PathFormat,
        client_capabilities: &[CapabilityFlag],
    ) -> Reply {
        if self.requires_initialize {
            let mut initialized = self.initialized.lock().unwrap();
            if *initialized {
                return Reply::Error("initialize received more than once".to_string());
            }
            *initialized = true;
        }
        if matches!(path_format, PathFormat::Uri) {
            // `uri` path format is accepted syntactically but not acted
            // on further; only the default `path` form is meaningfully
            // supported by the out-of-scope native backend.
            debug!("client requested pathFormat=uri; proceeding with literal paths");
        }
        Reply::Success(ReplyBody::Capabilities(Capabilities {
            client: client_capabilities.to_vec(),
            server: self.server_capabilities.clone(),
        }))
    }

    fn require_initialized(&self) -> Option<Reply> {
        if self.requires_initialize && !*self.initialized.lock().unwrap() {
            return Some(Reply::Error(
                "initialize must be received before any other request".to_string(),
            ));
        }
        None
    }

    fn handle_launch(&self, path: &str, args: &[String], cwd: Option<&str>) -> Reply {
        if self.state() != SessionState::Idle {
            return Reply::Error("a debuggee is already active".to_string());
        }
        {
            let mut target = self.target.lock().unwrap();
            target.executable_path = Some(path.to_string());
            target.arguments = args.to_vec();
            target.working_directory = cwd.map(str::to_string);
        }
        match self.debugger.launch(path, args, cwd) {
            Ok(()) => {
                self.set_state(SessionState::Launched);
                Reply::Success(ReplyBody::Empty)
            }
            Err(e) => Reply::Error(e.to_string()),
        }
    }

    fn handle_run(&self) -> Reply {
        if self.state() != SessionState::Idle {
            return Reply::Error("a debuggee is already active".to_string());
        }
        let target = self.target.lock().unwrap().clone();
        let path = match &target.executable_path {
            Some(p) => p.clone(),
            None => return Reply::Error("no target configured".to_string()),
        };
        match self
            .debugger
            .launch(&path, &target.arguments, target.working_directory.as_deref())
        {
            Ok(()) => {
                self.set_state(SessionState::Launched);
                Reply::Success(ReplyBody::Running)
            }
            Err(e) => Reply::Error(e.to_string()),
        }
    }

    fn handle_attach(&self, pid: i32) -> Reply {
        if self.state() != SessionState::Idle {
            return Reply::Error("a debuggee is already active".to_string());
        }
        match self.debugger.attach(pid) {
            Ok(()) => {
                self.set_state(SessionState::Attached);
                Reply::Success(ReplyBody::Running)
            }
            Err(e) => Reply::Error(e.to_string()),
        }
    }

    fn handle_continue(&self, thread_id: Option<u32>) -> Reply {
        let state = self.state();
        if !matches!(
            state,
            SessionState::Launched | SessionState::Attached | SessionState::Stopped | SessionState::Running
        ) {
            return Reply::Error("continue while no active debuggee".to_string());
        }
        let tid = thread_id.unwrap_or(0);
        match self.debugger.continue_thread(tid) {
            Ok(()) => {
                self.set_state(SessionState::Running);
                Reply::Success(ReplyBody::Running)
            }
            Err(e) => Reply::Error(e.to_string()),
        }
    }

    fn handle_detach(&self) -> Reply {
        if self.state() == SessionState::Idle {
            return Reply::Error("detach while no active debuggee".to_string());
        }
        match self.debugger.detach() {
            Ok(()) => {
                self.set_state(SessionState::Idle);
                Reply::Success(ReplyBody::Empty)
            }
            Err(e) => Reply::Error(e.to_string()),
        }
    }

    fn handle_terminate(&self) -> Reply {
        if self.state() == SessionState::Idle {
            return Reply::Error("terminate while no active debuggee".to_string());
        }
        match self.debugger.terminate() {
            Ok(()) => {
                self.set_state(SessionState::Idle);
                Reply::Success(ReplyBody::Empty)
            }
            Err(e) => Reply::Error(e.to_string()),
        }
    }

    fn handle_close(&self, terminate_debuggee: Option<bool>) -> Reply {
        let state = self.state();
        let result = match state {
            SessionState::Launched | SessionState::Running | SessionState::Stopped => {
                self.debugger.terminate()
            }
            SessionState::Attached => {
                if terminate_debuggee == Some(true) {
                    self.debugger.terminate()
                } else {
                    self.debugger.detach()
                }
            }
            SessionState::Idle | SessionState::Closed => Ok(()),
        };
        self.set_state(SessionState::Closed);
        match result {
            Ok(()) => Reply::Success(ReplyBody::Empty),
            Err(e) => Reply::Error(e.to_string()),
        }
    }

    /// Silently stop any active debuggee and move to `Closed`, without
    /// producing a reply. Used by the MI adapter's `gdb-exit`/`quit`/`q`
    /// handling, which per the command table ends the session "without
    /// further reply" — but still has to unblock the event thread so it
    /// can be joined before the process exits.
    pub fn force_stop(&self) {
        let state = self.state();
        let _ = match state {
            SessionState::Launched | SessionState::Running | SessionState::Stopped => {
                self.debugger.terminate()
            }
            SessionState::Attached => self.debugger.detach(),
            SessionState::Idle | SessionState::Closed => Ok(()),
        };
        self.set_state(SessionState::Closed);
    }

    /// Spawn the background event thread. Terminates cleanly once an
    /// `Exited` event has been observed and forwarded.
    pub fn spawn_event_thread(self: &Arc<Self>, sink: Arc<dyn EventSink>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        std::thread::spawn(move || loop {
            match engine.debugger.wait() {
                Ok(event) => {
                    engine.apply_event_state(&event);
                    let exited = matches!(event, Event::Exited { .. });
                    sink.emit(&event);
                    if exited {
                        engine.set_state(SessionState::Idle);
                        break;
                    }
                }
                Err(e) => {
                    warn!("event thread observed backend error, stopping: {}", e);
                    break;
                }
            }
        })
    }

    fn apply_event_state(&self, event: &Event) {
        match event {
            Event::Stopped { .. } => self.set_state(SessionState::Stopped),
            Event::Continued { .. } => self.set_state(SessionState::Running),
            Event::Exited { .. } => self.set_state(SessionState::Idle),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::mock::MockDebugger;
    use crate::session::types::RequestKind;

    fn engine(requires_initialize: bool) -> Arc<SessionEngine> {
        Arc::new(SessionEngine::new(
            Arc::new(MockDebugger::new()),
            requires_initialize,
            &["exec-run", "exec-continue"],
            Vec::new(),
        ))
    }

    fn req(kind: RequestKind) -> Request {
        Request { id: Some(1), kind }
    }

    #[test]
    fn launch_transitions_idle_to_launched() {
        let e = engine(false);
        let reply = e.dispatch(&req(RequestKind::Launch {
            path: "/bin/true".into(),
            args: vec![],
            cwd: None,
        }));
        assert_eq!(reply, Reply::Success(ReplyBody::Empty));
        assert_eq!(e.state(), SessionState::Launched);
    }

    #[test]
    fn continue_while_idle_is_a_state_violation() {
        let e = engine(false);
        let reply = e.dispatch(&req(RequestKind::Continue { thread_id: None }));
        assert!(matches!(reply, Reply::Error(_)));
    }

    #[test]
    fn close_from_launched_terminates() {
        let e = engine(false);
        e.dispatch(&req(RequestKind::Launch {
            path: "/bin/true".into(),
            args: vec![],
            cwd: None,
        }));
        let reply = e.dispatch(&req(RequestKind::Close {
            terminate_debuggee: None,
        }));
        assert_eq!(reply, Reply::Success(ReplyBody::Empty));
        assert_eq!(e.state(), SessionState::Closed);
    }

    #[test]
    fn close_from_attached_detaches_unless_terminate_requested() {
        let e = engine(false);
        e.dispatch(&req(RequestKind::Attach { pid: 1234 }));
        assert_eq!(e.state(), SessionState::Attached);
        let reply = e.dispatch(&req(RequestKind::Close {
            terminate_debuggee: Some(false),
        }));
        assert_eq!(reply, Reply::Success(ReplyBody::Empty));
    }

    #[test]
    fn dap_requires_initialize_before_launch() {
        let e = engine(true);
        let reply = e.dispatch(&req(RequestKind::Launch {
            path: "/bin/true".into(),
            args: vec![],
            cwd: None,
        }));
        assert!(matches!(reply, Reply::Error(_)));
    }

    #[test]
    fn info_gdb_mi_command_checks_known_commands() {
        let e = engine(false);
        let reply = e.dispatch(&req(RequestKind::InfoGdbMiCommand("exec-run".into())));
        assert_eq!(reply, Reply::Success(ReplyBody::CommandExists(true)));
        let reply = e.dispatch(&req(RequestKind::InfoGdbMiCommand("bogus".into())));
        assert_eq!(reply, Reply::Success(ReplyBody::CommandExists(false)));
    }

    #[test]
    fn unknown_command_reports_its_name() {
        let e = engine(false);
        let reply = e.dispatch(&req(RequestKind::Unknown("foo".into())));
        assert_eq!(reply, Reply::Error("Unknown request: \"foo\"".to_string()));
    }
}
