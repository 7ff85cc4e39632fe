use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::assets::site::Site;
use crate::http::connection::Connection;

/// One worker: an accept loop over the shared listening socket.
///
/// Workers share nothing but the listener handle and the read-only site;
/// every connection runs in its own task, so one slow client never blocks
/// the accept loop. On shutdown the worker stops accepting and drains the
/// connections it already owns.
pub async fn worker_loop(
    id: usize,
    listener: Arc<TcpListener>,
    site: Arc<Site>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    if *shutdown.borrow() {
        return Ok(());
    }
    info!(worker = id, "serving");

    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer) = accepted?;
                debug!(worker = id, %peer, "accepted connection");

                let site = site.clone();
                connections.spawn(async move {
                    let mut conn = Connection::new(socket, site);
                    if let Err(e) = conn.run().await {
                        error!(%peer, error = %e, "connection error");
                    }
                });
            }

            changed = shutdown.changed() => {
                // A closed channel means the supervisor is gone; stop too.
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }

            // Reap finished connection tasks as we go
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    info!(worker = id, in_flight = connections.len(), "draining connections");
    while connections.join_next().await.is_some() {}

    Ok(())
}
