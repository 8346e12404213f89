use labcheckd::config::DaemonConfig;
use labcheckd::{ipc, logging};
use std::io::{self, BufRead, Write};
use tracing::{debug, error, info, warn};

fn main() {
    let config = DaemonConfig::from_env();
    if let Err(e) = logging::init_logging(&config.log_filter) {
        let _ = writeln!(io::stderr(), "{e:#}");
    }
    info!(version = env!("CARGO_PKG_VERSION"), "labcheckd starting");

    let startup_workspace = config.workspace.clone();
    let mut state = ipc::AppState::new(config);
    if let Some(path) = startup_workspace {
        if let Err(e) = ipc::open_workspace(&mut state, &path) {
            // The shell can still pick another workspace over IPC.
            error!(workspace = %path.display(), error = %e, "startup workspace failed to open");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let resp = ipc::err("", "bad_json", e.to_string(), None);
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        debug!(id = %req.id, method = %req.method, "request");
        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    info!("labcheckd exiting");
}
