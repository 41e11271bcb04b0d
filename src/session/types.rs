//! Protocol-independent data model: [`Request`]/[`Reply`]/[`Event`]/
//! [`Frame`]/[`Capabilities`]/[`TargetConfig`]/[`SessionState`].

/// One inbound request, already normalized by an adapter out of either
/// DAP JSON or an MI command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Correlation id; `None` when the client supplied none (MI commands
    /// without a leading numeric id).
    pub id: Option<u64>,
    pub kind: RequestKind,
}

/// The sixteen request kinds named by the protocol-independent contract,
/// plus `NoOp`/`Silent`, which exist only to give the degenerate MI input
/// shapes (blank line, bare id, `gdb-set`) somewhere to go without being
/// treated as unknown commands.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestKind {
    Initialize {
        client_id: Option<String>,
        client_name: Option<String>,
        adapter_id: Option<String>,
        locale: Option<String>,
        path_format: PathFormat,
        client_capabilities: Vec<CapabilityFlag>,
    },
    Launch {
        path: String,
        args: Vec<String>,
        cwd: Option<String>,
    },
    Attach {
        pid: i32,
    },
    Run,
    Continue {
        thread_id: Option<u32>,
    },
    Detach,
    Terminate,
    Close {
        terminate_debuggee: Option<bool>,
    },
    CwdSet(String),
    ConfigurationDone,
    SetArgs(Vec<String>),
    SetTarget(String),
    ListFeatures,
    Show(Option<String>),
    InfoGdbMiCommand(String),
    Unknown(String),
    /// Empty line / bare `-` / bare numeric id: no-op, still replies
    /// success.
    NoOp,
    /// `gdb-set`/`inferior-tty-set`: no-op, no reply and no prompt at all.
    Silent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathFormat {
    #[default]
    Path,
    Uri,
}

/// Outcome of dispatching a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Success(ReplyBody),
    Error(String),
}

/// Structured details a successful reply may carry. `Running` marks the
/// handful of commands whose MI rendering is `^running` rather than
/// `^done`; every other adapter treats it exactly like `Empty`.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Empty,
    Running,
    Capabilities(Capabilities),
    CommandExists(bool),
    Features(Vec<String>),
    Version(String),
}

/// An asynchronous notification delivered by the event thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Stopped {
        thread_id: u32,
        reason: StopReason,
        exception_kind: Option<String>,
        description: Option<String>,
        text: Option<String>,
        frame: Option<Frame>,
    },
    Continued {
        thread_id: u32,
    },
    Exited {
        exit_code: i32,
    },
    Output {
        category: OutputCategory,
        text: String,
    },
    Terminated,
    /// Every other named event kind (`Breakpoint`, `Module`, `Thread`,
    /// `Process`, `Memory`, `LoadedSource`, `Initialized`, `Capabilities`,
    /// `Invalidated`, `ProgressStart`/`Update`/`End`): the backend that
    /// would produce these is out of scope, so they carry only their name
    /// and a free-form body for forward compatibility.
    Other {
        kind: String,
        body: serde_json::Value,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Step,
    Breakpoint,
    Exception,
    Pause,
    Entry,
    Goto,
    FunctionBreakpoint,
    DataBreakpoint,
    InstructionBreakpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCategory {
    Console,
    Important,
    Stdout,
    Stderr,
    Telemetry,
}

/// Top stack frame snapshot delivered with a `Stopped` event.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub address: u64,
    pub function_name: Option<String>,
    pub arguments: Vec<(String, String)>,
    pub architecture: Architecture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    I386,
    X86_64,
    AArch32,
    AArch64,
}

impl Architecture {
    /// Host architecture, used as the safe default when a backend cannot
    /// supply frame info.
    pub fn host() -> Self {
        if cfg!(target_arch = "aarch64") {
            Architecture::AArch64
        } else if cfg!(target_arch = "arm") {
            Architecture::AArch32
        } else if cfg!(target_arch = "x86_64") {
            Architecture::X86_64
        } else {
            Architecture::I386
        }
    }
}

/// A named boolean flag negotiated at `initialize` time.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityFlag {
    pub name: String,
    pub supported: bool,
}

/// Two ordered sequences of capability flags; iteration order is
/// deterministic (declaration order).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Capabilities {
    pub client: Vec<CapabilityFlag>,
    pub server: Vec<CapabilityFlag>,
}

/// Process-wide mutable record of what to launch, written by
/// `SetTarget`/`SetArgs`/`CwdSet`/`Launch`, read by `Launch`/`Run`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetConfig {
    pub executable_path: Option<String>,
    pub arguments: Vec<String>,
    pub working_directory: Option<String>,
}

/// The debuggee lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Launched,
    Attached,
    Running,
    Stopped,
    Closed,
}
