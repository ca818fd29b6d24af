//! Line-delimited stdio host channel.

use std::io::Write;

use {
    docbridge_viewer::HostChannel,
    tokio::{
        io::{AsyncBufReadExt, BufReader},
        sync::mpsc,
    },
    tracing::warn,
};

/// Inbound frames buffered between the stdin reader and the viewer.
const INBOUND_CAPACITY: usize = 16;

/// Writes each envelope as one line on stdout.
pub struct StdoutChannel;

impl HostChannel for StdoutChannel {
    fn post(&self, raw: &str) -> bool {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{raw}").and_then(|()| out.flush()).is_ok()
    }
}

/// Forward non-empty stdin lines until EOF.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => {},
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "failed to read from stdin");
                    break;
                },
            }
        }
    });
    rx
}
