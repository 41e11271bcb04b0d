use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::error;

use aliceserver::config::{self, Cli};
use aliceserver::dap::DapAdapter;
use aliceserver::debugger::process::ProcessDebugger;
use aliceserver::mi::adapter::{MIAdapter, MIVersion, KNOWN_COMMANDS};
use aliceserver::session::{Request, RequestKind, SessionEngine};
use aliceserver::transport::http::HttpTransport;
use aliceserver::transport::line::LineTransport;
use aliceserver::transport::{FramedTransport, Transport};
use aliceserver::Adapter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.ver {
        println!("{}", config::version_line());
        config::flush_stdout();
        return ExitCode::SUCCESS;
    }

    if cli.version {
        print!("{}", config::version_block());
        config::flush_stdout();
        return ExitCode::SUCCESS;
    }

    if cli.list_adapters {
        for name in config::LISTED_ADAPTER_NAMES {
            println!("{}", name);
        }
        config::flush_stdout();
        return ExitCode::SUCCESS;
    }

    if let Err(e) = config::init_logging(&cli) {
        eprintln!("failed to initialize logging: {}", e);
        return ExitCode::from(1);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Usage(msg)) => {
            eprintln!("aliceserver: {}", msg);
            ExitCode::from(1)
        }
        Err(CliError::Fatal(e)) => {
            error!("fatal error: {}", e);
            ExitCode::from(2)
        }
    }
}

enum CliError {
    Usage(String),
    Fatal(aliceserver::AliceError),
}

impl From<aliceserver::AliceError> for CliError {
    fn from(e: aliceserver::AliceError) -> Self {
        CliError::Fatal(e)
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let debugger = Arc::new(ProcessDebugger::new());
    let stdin = io::stdin();
    let stdout = io::stdout();

    match cli.adapter.as_str() {
        "dap" => {
            let transport: Arc<dyn FramedTransport> =
                Arc::new(HttpTransport::new(stdin.lock(), stdout.lock()));
            let engine = Arc::new(SessionEngine::new(
                debugger,
                true,
                &[],
                aliceserver::dap::capabilities::server_capabilities(),
            ));
            configure_target(&engine, cli);
            let adapter = Arc::new(DapAdapter::new(transport));
            adapter.run(engine)?;
        }
        "mi" | "mi2" | "mi3" | "mi4" => {
            let version = MIVersion::parse(&cli.adapter)
                .ok_or_else(|| CliError::Usage(format!("unknown MI version: {}", cli.adapter)))?;
            let transport: Arc<dyn Transport> =
                Arc::new(LineTransport::new(stdin.lock(), stdout.lock()));
            let engine = Arc::new(SessionEngine::new(debugger, false, KNOWN_COMMANDS, Vec::new()));
            configure_target(&engine, cli);
            let adapter = Arc::new(MIAdapter::new(transport, version));
            adapter.run(engine)?;
        }
        other => {
            return Err(CliError::Usage(format!(
                "unknown adapter {:?}; expected one of {:?}",
                other,
                config::ADAPTER_NAMES
            )))
        }
    }

    Ok(())
}

/// Assign a CLI-supplied positional target and its trailing arguments into
/// the session's target configuration, the same way `SetTarget`/`SetArgs`
/// requests do over the wire.
fn configure_target(engine: &Arc<SessionEngine>, cli: &Cli) {
    let Some(path) = &cli.target else {
        return;
    };
    engine.dispatch(&Request {
        id: None,
        kind: RequestKind::SetTarget(path.clone()),
    });
    if !cli.target_args.is_empty() {
        engine.dispatch(&Request {
            id: None,
            kind: RequestKind::SetArgs(cli.target_args.clone()),
        });
    }
}
