//! The Debug Adapter Protocol adapter: JSON request/response/event
//! handling over the HTTP-over-stdio transport.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use serde_json::{json, Value};

use crate::adapter::Adapter;
use crate::error::{AliceError, Result};
use crate::session::engine::EventSink;
use crate::session::types::{
    CapabilityFlag, Event, OutputCategory, PathFormat, Reply, ReplyBody, Request, RequestKind,
    SessionState, StopReason,
};
use crate::session::SessionEngine;
use crate::transport::FramedTransport;

use super::types::{RawEvent, RawResponse};

pub struct DapAdapter {
    transport: Arc<dyn FramedTransport>,
    next_seq: AtomicU32,
}

impl DapAdapter {
    pub fn new(transport: Arc<dyn FramedTransport>) -> Self {
        Self {
            transport,
            next_seq: AtomicU32::new(1),
        }
    }

    fn seq(&self) -> u32 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    fn send_response(&self, request_seq: i64, command: &str, success: bool, body: Option<Value>) -> Result<()> {
        let response = RawResponse {
            seq: self.seq(),
            request_seq,
            kind: "response",
            success,
            command: command.to_string(),
            body,
        };
        let bytes = serde_json::to_vec(&response)?;
        self.transport.send_message(&bytes).map_err(AliceError::from)
    }

    fn send_error(&self, request_seq: i64, command: &str, message: &str) -> Result<()> {
        self.send_response(
            request_seq,
            command,
            false,
            Some(json!({ "error": message })),
        )
    }

    fn send_event(&self, event: &str, body: Option<Value>) -> Result<()> {
        let raw = RawEvent {
            seq: self.seq(),
            kind: "event",
            event: event.to_string(),
            body,
        };
        let bytes = serde_json::to_vec(&raw)?;
        self.transport.send_message(&bytes).map_err(AliceError::from)
    }

    fn handle_request(
        &self,
        engine: &Arc<SessionEngine>,
        raw: &super::types::RawRequest,
    ) -> Result<bool> {
        let args = &raw.arguments;
        let kind = match raw.command.as_str() {
            "initialize" => {
                let path_format = match args.get("pathFormat").and_then(Value::as_str) {
                    None => PathFormat::Path,
                    Some("path") => PathFormat::Path,
                    Some("uri") => PathFormat::Uri,
                    Some(other) => {
                        self.send_error(
                            raw.seq,
                            &raw.command,
                            &format!("unsupported pathFormat: {}", other),
                        )?;
                        return Ok(true);
                    }
                };
                let client_capabilities = args
                    .as_object()
                    .map(|obj| {
                        obj.iter()
                            .filter(|(name, _)| name.starts_with("supports"))
                            .filter_map(|(name, value)| {
                                value.as_bool().map(|supported| CapabilityFlag {
                                    name: name.clone(),
                                    supported,
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                RequestKind::Initialize {
                    client_id: args.get("clientID").and_then(Value::as_str).map(str::to_string),
                    client_name: args
                        .get("clientName")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    adapter_id: args
                        .get("adapterID")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    locale: args.get("locale").and_then(Value::as_str).map(str::to_string),
                    path_format,
                    client_capabilities,
                }
            }
            "configurationDone" => RequestKind::ConfigurationDone,
            "launch" => {
                let path = match args.get("path").and_then(Value::as_str) {
                    Some(p) => p.to_string(),
                    None => {
                        self.send_error(raw.seq, &raw.command, "missing required argument: path")?;
                        return Ok(true);
                    }
                };
                let cli_args = args
                    .get("args")
                    .and_then(Value::as_array)
                    .map(|a| {
                        a.iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                let cwd = args.get("cwd").and_then(Value::as_str).map(str::to_string);
                RequestKind::Launch {
                    path,
                    args: cli_args,
                    cwd,
                }
            }
            "attach" => {
                let pid = match args.get("pid").and_then(Value::as_i64) {
                    Some(pid) => pid as i32,
                    None => {
                        self.send_error(raw.seq, &raw.command, "missing required argument: pid")?;
                        return Ok(true);
                    }
                };
                RequestKind::Attach { pid }
            }
            "continue" => {
                let thread_id = match args.get("threadId").and_then(Value::as_u64) {
                    Some(t) => t as u32,
                    None => {
                        self.send_error(raw.seq, &raw.command, "missing required argument: threadId")?;
                        return Ok(true);
                    }
                };
                RequestKind::Continue {
                    thread_id: Some(thread_id),
                }
            }
            "disconnect" => RequestKind::Close {
                terminate_debuggee: args.get("terminateDebuggee").and_then(Value::as_bool),
            },
            other => RequestKind::Unknown(other.to_string()),
        };

        let is_disconnect = raw.command == "disconnect";
        let request = Request { id: None, kind };
        let reply = engine.dispatch(&request);

        match &reply {
            Reply::Success(body) => {
                let json_body = match body {
                    ReplyBody::Capabilities(caps) => {
                        let mut map = serde_json::Map::new();
                        for flag in &caps.server {
                            if flag.supported {
                                map.insert(flag.name.clone(), Value::Bool(true));
                            }
                        }
                        debug!(
                            "client capabilities negotiated: {:?}",
                            caps.client.iter().map(|f| &f.name).collect::<Vec<_>>()
                        );
                        Some(Value::Object(map))
                    }
                    _ => None,
                };
                self.send_response(raw.seq, &raw.command, true, json_body)?;
            }
            Reply::Error(msg) => {
                self.send_error(raw.seq, &raw.command, msg)?;
            }
        }

        Ok(!is_disconnect)
    }
}

impl Adapter for DapAdapter {
    fn name(&self) -> &'static str {
        "dap"
    }

    fn run(self: Arc<Self>, engine: Arc<SessionEngine>) -> Result<()> {
        let mut event_handle = None;

        loop {
            let bytes = match self.transport.recv_message() {
                Ok(bytes) => bytes,
                Err(AliceError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => {
                    warn!("dropping malformed request frame: {}", e);
                    continue;
                }
            };
            let raw: super::types::RawRequest = match serde_json::from_slice(&bytes) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("dropping request with unparseable body: {}", e);
                    continue;
                }
            };

            let keep_going = self.handle_request(&engine, &raw)?;
            if !keep_going {
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

fn dap_stop_reason(reason: StopReason) -> &'static str {
    match reason {
        StopReason::Step => "step",
        StopReason::Breakpoint => "breakpoint",
        StopReason::Exception => "exception",
        StopReason::Pause => "pause",
        StopReason::Entry => "entry",
        StopReason::Goto => "goto",
        StopReason::FunctionBreakpoint => "function breakpoint",
        StopReason::DataBreakpoint => "data breakpoint",
        StopReason::InstructionBreakpoint => "instruction breakpoint",
    }
}

fn dap_output_category(category: OutputCategory) -> &'static str {
    match category {
        OutputCategory::Console => "console",
        OutputCategory::Important => "important",
        OutputCategory::Stdout => "stdout",
        OutputCategory::Stderr => "stderr",
        OutputCategory::Telemetry => "telemetry",
    }
}

impl EventSink for DapAdapter {
    fn emit(&self, event: &Event) {
        let (name, body) = match event {
            Event::Stopped {
                thread_id,
                reason,
                description,
                ..
            } => (
                "stopped",
                Some(json!({
                    "reason": dap_stop_reason(*reason),
                    "description": description,
                    "threadId": thread_id,
                })),
            ),
            Event::Continued { thread_id } => (
                "continued",
                Some(json!({ "threadId": thread_id })),
            ),
            Event::Exited { exit_code } => (
                "exited",
                Some(json!({ "exitCode": exit_code })),
            ),
            Event::Output { category, text } => (
                "output",
                Some(json!({
                    "category": dap_output_category(*category),
                    "output": text,
                })),
            ),
            Event::Terminated => ("terminated", None),
            Event::Other { kind, body } => {
                let _ = self.send_event(kind, Some(body.clone()));
                return;
            }
        };
        let _ = self.send_event(name, body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::capabilities::server_capabilities;
    use crate::debugger::mock::MockDebugger;
    use crate::transport::http::HttpTransport;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Clone)]
    struct SharedBuf(Arc<StdMutex<Vec<u8>>>);
    impl std::io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn frame(body: &Value) -> Vec<u8> {
        let payload = serde_json::to_vec(body).unwrap();
        let mut out = format!("Content-Length: {}\r\n\r\n", payload.len()).into_bytes();
        out.extend_from_slice(&payload);
        out
    }

    fn engine() -> Arc<SessionEngine> {
        Arc::new(SessionEngine::new(
            Arc::new(MockDebugger::new()),
            true,
            &[],
            server_capabilities(),
        ))
    }

    #[test]
    fn initialize_then_disconnect_happy_path() {
        let mut input = Vec::new();
        input.extend(frame(&json!({
            "seq": 1, "type": "request", "command": "initialize",
            "arguments": { "clientID": "testclient", "pathFormat": "path" }
        })));
        input.extend(frame(&json!({
            "seq": 2, "type": "request", "command": "disconnect", "arguments": {}
        })));

        let out = Arc::new(StdMutex::new(Vec::new()));
        let transport: Arc<dyn FramedTransport> = Arc::new(HttpTransport::new(
            Cursor::new(input),
            SharedBuf(out.clone()),
        ));
        let adapter = Arc::new(DapAdapter::new(transport));
        let engine = engine();
        adapter.run(engine.clone()).unwrap();

        let written = out.lock().unwrap().clone();
        let text = String::from_utf8(written).unwrap();
        assert!(text.contains("\"command\":\"initialize\""));
        assert!(text.contains("\"success\":true"));
        assert!(text.contains("\"supportsConfigurationDoneRequest\":true"));
        assert!(!text.contains("supportsLogPoints"));
        assert_eq!(engine.state(), SessionState::Closed);
    }

    #[test]
    fn attach_missing_pid_is_an_error_response() {
        let mut input = Vec::new();
        input.extend(frame(&json!({
            "seq": 1, "type": "request", "command": "initialize", "arguments": {}
        })));
        input.extend(frame(&json!({
            "seq": 2, "type": "request", "command": "attach", "arguments": {}
        })));
        input.extend(frame(&json!({
            "seq": 3, "type": "request", "command": "disconnect", "arguments": {}
        })));

        let out = Arc::new(StdMutex::new(Vec::new()));
        let transport: Arc<dyn FramedTransport> = Arc::new(HttpTransport::new(
            Cursor::new(input),
            SharedBuf(out.clone()),
        ));
        let adapter = Arc::new(DapAdapter::new(transport));
        adapter.run(engine()).unwrap();

        let written = out.lock().unwrap().clone();
        let text = String::from_utf8(written).unwrap();
        assert!(text.contains("\"command\":\"attach\""));
        assert!(text.contains("\"success\":false"));
        assert!(text.contains("missing required argument: pid"));
    }

    #[test]
    fn continue_missing_thread_id_is_an_error_response() {
        let mut input = Vec::new();
        input.extend(frame(&json!({
            "seq": 1, "type": "request", "command": "initialize", "arguments": {}
        })));
        input.extend(frame(&json!({
            "seq": 2, "type": "request", "command": "continue", "arguments": {}
        })));
        input.extend(frame(&json!({
            "seq": 3, "type": "request", "command": "disconnect", "arguments": {}
        })));

        let out = Arc::new(StdMutex::new(Vec::new()));
        let transport: Arc<dyn FramedTransport> = Arc::new(HttpTransport::new(
            Cursor::new(input),
            SharedBuf(out.clone()),
        ));
        let adapter = Arc::new(DapAdapter::new(transport));
        adapter.run(engine()).unwrap();

        let written = out.lock().unwrap().clone();
        let text = String::from_utf8(written).unwrap();
        assert!(text.contains("\"command\":\"continue\""));
        assert!(text.contains("\"success\":false"));
        assert!(text.contains("missing required argument: threadId"));
    }

    #[test]
    fn client_capability_flags_are_threaded_into_the_reply() {
        let mut input = Vec::new();
        input.extend(frame(&json!({
            "seq": 1, "type": "request", "command": "initialize",
            "arguments": { "supportsRunInTerminalRequest": true, "supportsInvalidatedEvent": false }
        })));
        input.extend(frame(&json!({
            "seq": 2, "type": "request", "command": "disconnect", "arguments": {}
        })));

        let out = Arc::new(StdMutex::new(Vec::new()));
        let transport: Arc<dyn FramedTransport> = Arc::new(HttpTransport::new(
            Cursor::new(input),
            SharedBuf(out.clone()),
        ));
        let adapter = Arc::new(DapAdapter::new(transport));
        let engine = engine();
        adapter.run(engine.clone()).unwrap();

        let written = out.lock().unwrap().clone();
        let text = String::from_utf8(written).unwrap();
        assert!(text.contains("\"success\":true"));
    }

    #[test]
    fn malformed_frame_is_logged_and_the_session_continues() {
        let mut input = Vec::new();
        input.extend(b"Content-Type: application/json\r\nContent-Length: 2\r\n\r\nhi".to_vec());
        input.extend(frame(&json!({
            "seq": 1, "type": "request", "command": "initialize", "arguments": {}
        })));
        input.extend(frame(&json!({
            "seq": 2, "type": "request", "command": "disconnect", "arguments": {}
        })));

        let out = Arc::new(StdMutex::new(Vec::new()));
        let transport: Arc<dyn FramedTransport> = Arc::new(HttpTransport::new(
            Cursor::new(input),
            SharedBuf(out.clone()),
        ));
        let adapter = Arc::new(DapAdapter::new(transport));
        let engine = engine();
        adapter.run(engine.clone()).unwrap();

        let written = out.lock().unwrap().clone();
        let text = String::from_utf8(written).unwrap();
        assert!(text.contains("\"command\":\"initialize\""));
        assert!(text.contains("\"success\":true"));
        assert_eq!(engine.state(), SessionState::Closed);
    }

    #[test]
    fn unknown_command_before_initialize_is_rejected() {
        let mut input = Vec::new();
        input.extend(frame(&json!({
            "seq": 1, "type": "request", "command": "launch",
            "arguments": { "path": "/bin/true" }
        })));
        input.extend(frame(&json!({
            "seq": 2, "type": "request", "command": "disconnect", "arguments": {}
        })));

        let out = Arc::new(StdMutex::new(Vec::new()));
        let transport: Arc<dyn FramedTransport> = Arc::new(HttpTransport::new(
            Cursor::new(input),
            SharedBuf(out.clone()),
        ));
        let adapter = Arc::new(DapAdapter::new(transport));
        adapter.run(engine()).unwrap();

        let written = out.lock().unwrap().clone();
        let text = String::from_utf8(written).unwrap();
        assert!(text.contains("\"command\":\"launch\""));
        assert!(text.contains("\"success\":false"));
    }

    #[test]
    fn sequence_numbers_increase_monotonically() {
        let mut input = Vec::new();
        input.extend(frame(&json!({
            "seq": 1, "type": "request", "command": "initialize", "arguments": {}
        })));
        input.extend(frame(&json!({
            "seq": 2, "type": "request", "command": "disconnect", "arguments": {}
        })));

        let out = Arc::new(StdMutex::new(Vec::new()));
        let transport: Arc<dyn FramedTransport> = Arc::new(HttpTransport::new(
            Cursor::new(input),
            SharedBuf(out.clone()),
        ));
        let adapter = DapAdapter::new(transport);
        assert_eq!(adapter.seq(), 1);
        assert_eq!(adapter.seq(), 2);
    }
}
