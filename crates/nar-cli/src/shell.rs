//! Interactive session. A reader thread feeds stdin lines into the shared
//! reasoner while a ticker runs one cycle per interval. EOF or Ctrl-C ends
//! the session.

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use nar_core::Reasoner;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{apply_line, emit};

pub async fn run(reasoner: Reasoner, tick: Duration, json: bool) -> Result<()> {
    let state = Arc::new(Mutex::new(reasoner));
    let token = CancellationToken::new();

    // Blocking stdin reads stay on their own thread so an idle terminal
    // never holds up runtime shutdown.
    {
        let state = Arc::clone(&state);
        let token = token.clone();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                if token.is_cancelled() {
                    return;
                }
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!("stdin read failed: {e}");
                        break;
                    }
                };
                let mut reasoner = state.blocking_lock();
                if let Err(e) = apply_line(&mut reasoner, &line) {
                    eprintln!("error: {e}");
                }
            }
            tracing::debug!("stdin closed");
            token.cancel();
        });
    }

    let mut ticker = tokio::time::interval(tick.max(Duration::from_millis(1)));
    let stdout = std::io::stdout();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = &mut ctrl_c => {
                tracing::info!("interrupted");
                token.cancel();
                break;
            }
            _ = ticker.tick() => {
                let mut reasoner = state.lock().await;
                reasoner.run_cycle();
                let reports = reasoner.drain_reports();
                drop(reasoner);
                emit(&mut stdout.lock(), &reports, json)?;
            }
        }
    }

    // whatever the last input lines produced before the session ended
    let reports = state.lock().await.drain_reports();
    emit(&mut stdout.lock(), &reports, json)?;
    Ok(())
}
