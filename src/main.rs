use tokio::io::{AsyncBufReadExt, BufReader};

use desklink::{load_config, CommandRequest, ConnectionStatus, Session};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .init();

    let cfg = load_config();
    tracing::info!("Connecting to {}", cfg.ws_url);

    let default_window = cfg.default_cooldown_secs;
    let session = match Session::connect(cfg).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Cannot reach control endpoint: {e}");
            std::process::exit(1);
        }
    };

    // Print status transitions, logs and feedback as they arrive
    let mut updates = session.subscribe();
    tokio::spawn(async move {
        let mut last_status = ConnectionStatus::Unknown;
        let mut log_count = 0usize;
        while updates.changed().await.is_ok() {
            let snap = updates.borrow_and_update().clone();
            if snap.status != last_status {
                tracing::info!("Host status: {:?}", snap.status);
                last_status = snap.status;
            }
            if snap.logs.len() != log_count {
                if let Some(entry) = snap.logs.first() {
                    tracing::info!("[{:?}] {}", entry.level, entry.message);
                }
                log_count = snap.logs.len();
            }
            if let Some(fb) = &snap.feedback {
                tracing::info!("Feedback ({:?}): {}", fb.status, fb.message);
            }
        }
    });

    println!("Commands: shutdown cancel reboot suspend ping shutdown_with_time <min>");
    println!("          pkill_discord kill_chrome kill_vscode");
    println!("          info logs clear reconnect quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else { continue };

        let cmd = match word {
            "quit" | "exit" => break,
            "info" => {
                let snap = session.snapshot();
                match &snap.host {
                    Some(h) => println!(
                        "{} ({}) user={} ip={} cpu={:.0}% ram={:.0}% uptime={:.0}s",
                        h.node_name,
                        h.system,
                        h.user,
                        h.ip_local,
                        h.cpu_percent,
                        h.ram_percent(),
                        h.uptime
                    ),
                    None => println!("No host report yet"),
                }
                continue;
            }
            "logs" => {
                for entry in session.snapshot().logs {
                    println!("[{:?}] {}", entry.level, entry.message);
                }
                continue;
            }
            "clear" => {
                session.clear_logs();
                continue;
            }
            "reconnect" => {
                match session.reconnect().await {
                    Ok(()) => println!("Reconnected"),
                    Err(e) => println!("Reconnect failed: {e}"),
                }
                continue;
            }
            "shutdown_with_time" => {
                let Some(minutes) = parts.next().and_then(|m| m.parse::<u32>().ok()) else {
                    println!("Usage: shutdown_with_time <minutes>");
                    continue;
                };
                // The timed-shutdown path is not throttled
                CommandRequest::new("shutdown_with_time")
                    .with("minutes", minutes)
                    .ungated()
            }
            action => CommandRequest::new(action).window(default_window),
        };

        match session.dispatch(cmd).await {
            Ok(()) => {}
            Err(e) => println!("Rejected: {e}"),
        }
    }

    session.close().await;
    tracing::info!("Session closed");
}
