//! The GDB/MI adapter: command table, record formatting, and the
//! request/event loop.

use std::io;
use std::sync::Arc;

use log::warn;

use crate::adapter::Adapter;
use crate::error::{AliceError, Result};
use crate::session::engine::EventSink;
use crate::session::types::{
    Architecture, Event, OutputCategory, Reply, ReplyBody, Request, RequestKind, SessionState,
    StopReason,
};
use crate::session::SessionEngine;
use crate::transport::Transport;
use crate::util::escape_c_string;

use super::parser::{self, ParsedLine};
use super::value::MIValue;

/// Command names this adapter knows, used to answer `info-gdb-mi-command`
/// and to drive the normalized lookup in [`classify`].
pub const KNOWN_COMMANDS: &[&str] = &[
    "exec-run",
    "exec",
    "exec-continue",
    "continue",
    "exec-abort",
    "target-attach",
    "attach",
    "target-detach",
    "gdb-detach",
    "detach",
    "target-disconnect",
    "target-exec",
    "file-exec-and-symbols",
    "exec-arguments",
    "environment-cd",
    "show",
    "info-gdb-mi-command",
    "list-features",
    "gdb-exit",
    "quit",
    "q",
    "gdb-set",
    "inferior-tty-set",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MIVersion {
    Mi2,
    Mi3,
    Mi4,
}

impl MIVersion {
    /// Accepts `mi`, `mi2`, `mi3`, `mi4`; version 1 (bare `mi`) folds to
    /// the latest.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mi" => Some(MIVersion::Mi4),
            "mi2" => Some(MIVersion::Mi2),
            "mi3" => Some(MIVersion::Mi3),
            "mi4" => Some(MIVersion::Mi4),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MIVersion::Mi2 => "mi2",
            MIVersion::Mi3 => "mi3",
            MIVersion::Mi4 => "mi4",
        }
    }
}

/// Fold a `target <verb> …` CLI form onto the same dash-joined key as its
/// MI alias, and lowercase the lookup key. Returns the key plus whatever
/// tokens remain as arguments.
fn normalize_key(tokens: &[String]) -> (String, Vec<String>) {
    if tokens.is_empty() {
        return (String::new(), Vec::new());
    }
    let first = tokens[0].to_ascii_lowercase();
    if first == "target" && tokens.len() >= 2 {
        let second = tokens[1].to_ascii_lowercase();
        (format!("target-{}", second), tokens[2..].to_vec())
    } else {
        (first, tokens[1..].to_vec())
    }
}

/// Resolve a parsed, non-no-op line to a request kind, or an error
/// message when the command's own arguments are malformed (a schema
/// problem local to this adapter, answered without consulting the
/// session engine).
fn classify(parsed: &ParsedLine) -> std::result::Result<RequestKind, String> {
    let (key, args) = normalize_key(&parsed.tokens);
    let kind = match key.as_str() {
        "exec-run" | "exec" => RequestKind::Run,
        "exec-continue" | "continue" => RequestKind::Continue { thread_id: None },
        "exec-abort" => RequestKind::Terminate,
        "target-attach" | "attach" => {
            let raw = args.first().ok_or("target-attach requires a pid")?;
            let pid: i32 = raw
                .parse()
                .map_err(|_| format!("invalid pid: \"{}\"", raw))?;
            RequestKind::Attach { pid }
        }
        "target-detach" | "gdb-detach" | "detach" | "target-disconnect" => RequestKind::Detach,
        "target-exec" | "file-exec-and-symbols" => {
            let path = args.first().ok_or("missing executable path")?;
            RequestKind::SetTarget(path.clone())
        }
        "exec-arguments" => RequestKind::SetArgs(args),
        "environment-cd" => {
            let dir = args.first().ok_or("missing directory")?;
            RequestKind::CwdSet(dir.clone())
        }
        "show" => match args.first().map(String::as_str) {
            Some("version") => RequestKind::Show(Some("version".to_string())),
            _ => RequestKind::Show(None),
        },
        "info-gdb-mi-command" => {
            let name = args.first().ok_or("missing command name")?;
            RequestKind::InfoGdbMiCommand(name.clone())
        }
        "list-features" => RequestKind::ListFeatures,
        "gdb-set" | "inferior-tty-set" => RequestKind::Silent,
        _ => RequestKind::Unknown(parsed.tokens[0].clone()),
    };
    Ok(kind)
}

fn is_end_session(tokens: &[String]) -> bool {
    let (key, _) = normalize_key(tokens);
    matches!(key.as_str(), "gdb-exit" | "quit" | "q")
}

/// `reason` mapping from the protocol-independent [`StopReason`] to the
/// MI vocabulary.
fn mi_reason(reason: StopReason) -> &'static str {
    match reason {
        StopReason::Step => "step",
        StopReason::Breakpoint => "breakpoint-hit",
        StopReason::Exception => "signal-received",
        _ => "unknown",
    }
}

fn mi_arch(arch: Architecture) -> &'static str {
    match arch {
        Architecture::I386 => "i386",
        Architecture::X86_64 => "i386:x86_64",
        Architecture::AArch32 => "arm",
        Architecture::AArch64 => "aarch64",
    }
}

fn format_success(id: Option<u64>, body: &ReplyBody) -> String {
    let verb = if matches!(body, ReplyBody::Running) {
        "^running"
    } else {
        "^done"
    };
    let prefix = match id {
        Some(n) => format!("{}{}", n, verb),
        None => verb.to_string(),
    };

    let mut preamble = String::new();
    let details = match body {
        ReplyBody::Empty | ReplyBody::Running | ReplyBody::Capabilities(_) => MIValue::object(),
        ReplyBody::CommandExists(exists) => {
            let mut details = MIValue::object();
            let mut command = MIValue::object();
            command.set("exists", if *exists { "true" } else { "false" });
            details.set("command", command);
            details
        }
        ReplyBody::Features(features) => {
            let mut details = MIValue::object();
            details.set(
                "features",
                MIValue::Array(features.iter().map(|f| MIValue::from(f.as_str())).collect()),
            );
            details
        }
        ReplyBody::Version(text) => {
            preamble = format!("~\"{}\\n\"\n", escape_c_string(text));
            MIValue::object()
        }
    };
    format!("{}{}", preamble, details.to_message(&prefix))
}

fn format_error(id: Option<u64>, msg: &str) -> String {
    let prefix = match id {
        Some(n) => format!("{}^error", n),
        None => "^error".to_string(),
    };
    let mut body = MIValue::object();
    body.set("msg", msg);
    body.to_message(&prefix)
}

/// GDB/MI protocol adapter, bound to one transport and one version.
pub struct MIAdapter {
    transport: Arc<dyn Transport>,
    version: MIVersion,
}

impl MIAdapter {
    pub fn new(transport: Arc<dyn Transport>, version: MIVersion) -> Self {
        Self { transport, version }
    }

    fn prompt(&self) -> io::Result<()> {
        self.transport.send(b"(gdb)\n")
    }

    fn write_reply(&self, id: Option<u64>, reply: &Reply) -> io::Result<()> {
        let text = match reply {
            Reply::Success(body) => format_success(id, body),
            Reply::Error(msg) => format_error(id, msg),
        };
        self.transport.send(text.as_bytes())?;
        self.prompt()
    }

    fn echo(&self, parsed: &ParsedLine) -> io::Result<()> {
        if !parsed.is_mi_form {
            let escaped = escape_c_string(&parsed.echo_text);
            self.transport
                .send(format!("&\"{}\"\n", escaped).as_bytes())?;
        }
        Ok(())
    }

    fn handle_line(&self, line: &str, engine: &Arc<SessionEngine>) -> Result<bool> {
        let parsed = parser::parse_line(line);

        if parsed.overflow {
            self.write_reply(None, &Reply::Error("numeric id overflow".to_string()))?;
            return Ok(true);
        }

        if parsed.is_noop() {
            self.write_reply(parsed.id, &Reply::Success(ReplyBody::Empty))?;
            return Ok(true);
        }

        if is_end_session(&parsed.tokens) {
            return Ok(false);
        }

        self.echo(&parsed)?;

        match classify(&parsed) {
            Err(msg) => {
                self.write_reply(parsed.id, &Reply::Error(msg))?;
            }
            Ok(RequestKind::Silent) => {
                // No reply, no prompt.
            }
            Ok(kind) => {
                let request = Request { id: parsed.id, kind };
                let reply = engine.dispatch(&request);
                self.write_reply(parsed.id, &reply)?;
            }
        }
        Ok(true)
    }
}

impl Adapter for MIAdapter {
    fn name(&self) -> &'static str {
        self.version.name()
    }

    fn run(self: Arc<Self>, engine: Arc<SessionEngine>) -> Result<()> {
        self.prompt()?;
        let mut event_handle = None;

        loop {
            let line = match self.transport.read_line() {
                Ok(line) => line,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(AliceError::from(e)),
            };

            let keep_going = self.handle_line(&line, &engine)?;
            if !keep_going {
                engine.force_stop();
                break;
            }

            if event_handle.is_none()
                && matches!(
                    engine.state(),
                    SessionState::Launched | SessionState::Attached
                )
            {
                let sink: Arc<dyn EventSink> = Arc::clone(&self) as Arc<dyn EventSink>;
                event_handle = Some(engine.spawn_event_thread(sink));
            }
        }

        if let Some(handle) = event_handle {
            let _ = handle.join();
        }
        Ok(())
    }
}

impl EventSink for MIAdapter {
    fn emit(&self, event: &Event) {
        let text = match event {
            Event::Continued { .. } => "*running,thread-id=\"all\"\n".to_string(),
            Event::Exited { exit_code: 0 } => "*stopped,reason=\"exited-normally\"\n".to_string(),
            Event::Exited { exit_code } => {
                let mut v = MIValue::object();
                v.set("reason", "exited");
                v.set("exit-code", exit_code.to_string());
                v.to_message("*stopped")
            }
            Event::Stopped {
                thread_id,
                reason,
                exception_kind,
                description,
                frame,
                ..
            } => {
                let mut v = MIValue::object();
                v.set("reason", mi_reason(*reason));
                v.set(
                    "signal-name",
                    exception_kind.clone().unwrap_or_default(),
                );
                v.set(
                    "signal-meaning",
                    description.clone().unwrap_or_default(),
                );
                let mut frame_value = MIValue::object();
                match frame {
                    Some(f) => {
                        frame_value.set("addr", format!("0x{:x}", f.address));
                        frame_value.set(
                            "func",
                            f.function_name.clone().unwrap_or_else(|| "??".to_string()),
                        );
                        frame_value.set(
                            "args",
                            MIValue::Array(
                                f.arguments
                                    .iter()
                                    .map(|(name, value)| {
                                        let mut arg = MIValue::object();
                                        arg.set("name", name.as_str());
                                        arg.set("value", value.as_str());
                                        arg
                                    })
                                    .collect(),
                            ),
                        );
                        frame_value.set("arch", mi_arch(f.architecture));
                    }
                    None => {
                        frame_value.set("addr", "0x0");
                        frame_value.set("func", "??");
                        frame_value.set("args", MIValue::Array(Vec::new()));
                        frame_value.set("arch", mi_arch(Architecture::host()));
                    }
                }
                v.set("frame", frame_value);
                v.set("thread-id", thread_id.to_string());
                v.set("stopped-threads", "all");
                v.to_message("*stopped")
            }
            Event::Output { category, text } => {
                let escaped = escape_c_string(text);
                match category {
                    OutputCategory::Stderr => format!("&\"{}\"\n", escaped),
                    OutputCategory::Important | OutputCategory::Telemetry => {
                        let mut v = MIValue::object();
                        v.set("text", text.as_str());
                        v.to_message("=message")
                    }
                    OutputCategory::Console | OutputCategory::Stdout => {
                        format!("@\"{}\"\n", escaped)
                    }
                }
            }
            Event::Terminated | Event::Other { .. } => return,
        };
        if let Err(e) = self.transport.send(text.as_bytes()) {
            warn!("failed to deliver MI event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::mock::MockDebugger;
    use crate::transport::line::LineTransport;
    use std::io::Cursor;
    use std::sync::Mutex as StdMutex;

    #[derive(Clone)]
    struct SharedBuf(Arc<StdMutex<Vec<u8>>>);
    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn run_session(input: &str) -> String {
        let out = Arc::new(StdMutex::new(Vec::new()));
        let transport: Arc<dyn Transport> = Arc::new(LineTransport::new(
            Cursor::new(input.as_bytes().to_vec()),
            SharedBuf(out.clone()),
        ));
        let adapter = Arc::new(MIAdapter::new(transport, MIVersion::Mi2));
        let engine = Arc::new(SessionEngine::new(
            Arc::new(MockDebugger::new()),
            false,
            KNOWN_COMMANDS,
            Vec::new(),
        ));
        adapter.run(engine).unwrap();
        String::from_utf8(out.lock().unwrap().clone()).unwrap()
    }

    #[test]
    fn s3_prompt_emitted_before_any_input() {
        let out = Arc::new(StdMutex::new(Vec::new()));
        let transport: Arc<dyn Transport> =
            Arc::new(LineTransport::new(Cursor::new(Vec::new()), SharedBuf(out.clone())));
        let adapter = Arc::new(MIAdapter::new(transport, MIVersion::Mi2));
        let engine = Arc::new(SessionEngine::new(
            Arc::new(MockDebugger::new()),
            false,
            KNOWN_COMMANDS,
            Vec::new(),
        ));
        adapter.run(engine).unwrap();
        assert_eq!(String::from_utf8(out.lock().unwrap().clone()).unwrap(), "(gdb)\n");
    }

    #[test]
    fn s4_mi_attach_is_not_echoed() {
        let output = run_session("2-target-attach 12345\nq\n");
        assert_eq!(
            output,
            "(gdb)\n2^running\n(gdb)\n*stopped,reason=\"exited-normally\"\n"
        );
    }

    #[test]
    fn s5_unknown_command_with_numeric_id() {
        let output = run_session("7foo\nq\n");
        assert_eq!(
            output,
            "(gdb)\n&\"foo\"\n7^error,msg=\"Unknown request: \\\"foo\\\"\"\n(gdb)\n"
        );
    }

    #[test]
    fn list_features_replies_empty_array() {
        let output = run_session("-list-features\nq\n");
        assert_eq!(output, "(gdb)\n^done,features=[]\n(gdb)\n");
    }

    #[test]
    fn gdb_set_is_silent() {
        let output = run_session("-gdb-set confirm off\nq\n");
        assert_eq!(output, "(gdb)\n");
    }

    #[test]
    fn s6_exit_event_translation() {
        assert_eq!(
            format_success(None, &ReplyBody::Empty),
            "^done\n".to_string()
        );
        let out = Arc::new(StdMutex::new(Vec::new()));
        let transport: Arc<dyn Transport> =
            Arc::new(LineTransport::new(Cursor::new(Vec::new()), SharedBuf(out.clone())));
        let adapter = MIAdapter::new(transport, MIVersion::Mi2);
        adapter.emit(&Event::Exited { exit_code: 0 });
        adapter.emit(&Event::Exited { exit_code: 7 });
        assert_eq!(
            String::from_utf8(out.lock().unwrap().clone()).unwrap(),
            "*stopped,reason=\"exited-normally\"\n*stopped,reason=\"exited\",exit-code=\"7\"\n"
        );
    }

    #[test]
    fn version_folds_v1_to_latest() {
        assert_eq!(MIVersion::parse("mi").unwrap().name(), "mi4");
        assert_eq!(MIVersion::parse("mi3").unwrap().name(), "mi3");
        assert!(MIVersion::parse("mi5").is_none());
    }
}
