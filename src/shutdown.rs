//! Process termination signals mapped onto a cancellation token.
//!
//! Cancellation is cooperative: the token is observed at each blocking
//! receive boundary, never enforced preemptively.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Returns a token cancelled on the first termination signal.
///
/// Covers interrupt, terminate, quit and abort requests on unix; elsewhere
/// only ctrl-c. If signal listeners cannot be registered the token stays
/// inert and the failure is logged.
pub fn termination_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match wait_for_termination().await {
            Ok(()) => {
                info!("termination signal received");
                trigger.cancel();
            }
            Err(err) => warn!(%err, "unable to listen for termination signals"),
        }
    });
    token
}

#[cfg(unix)]
async fn wait_for_termination() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;
    let mut abort = signal(SignalKind::from_raw(libc_sigabrt()))?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = terminate.recv() => {}
        _ = quit.recv() => {}
        _ = abort.recv() => {}
    }
    Ok(())
}

#[cfg(unix)]
const fn libc_sigabrt() -> std::os::raw::c_int {
    // SIGABRT is 6 on every unix target we build for.
    6
}

#[cfg(not(unix))]
async fn wait_for_termination() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
