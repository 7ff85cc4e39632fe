use anyhow::Context;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::assets::site::Site;
use crate::config::ServerConfig;
use crate::server::listener;

/// Decides whether a crashed worker comes back, and after how long.
///
/// Consecutive crashes back off linearly; a worker that keeps dying hits
/// the ceiling and stays down so a broken deploy cannot turn into a crash
/// storm. Crashes spaced further apart than the window are treated as
/// fresh incidents.
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    max_crashes: u32,
    base_backoff: Duration,
    window: Duration,
    crashes: u32,
    last_crash: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartAction {
    Restart(Duration),
    GiveUp,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(500), Duration::from_secs(30))
    }
}

impl RestartPolicy {
    pub fn new(max_crashes: u32, base_backoff: Duration, window: Duration) -> Self {
        Self {
            max_crashes,
            base_backoff,
            window,
            crashes: 0,
            last_crash: None,
        }
    }

    pub fn on_crash(&mut self, now: Instant) -> RestartAction {
        if let Some(last) = self.last_crash {
            if now.duration_since(last) > self.window {
                self.crashes = 0;
            }
        }
        self.last_crash = Some(now);
        self.crashes += 1;

        if self.crashes >= self.max_crashes {
            RestartAction::GiveUp
        } else {
            RestartAction::Restart(self.base_backoff * self.crashes)
        }
    }
}

/// Owns the one bound socket and the pool of workers serving it.
///
/// Per worker the lifecycle is Starting → Serving → Exited; an exit while
/// the pool is running is unexpected and goes through the restart policy.
pub struct Supervisor {
    listener: Arc<TcpListener>,
    site: Arc<Site>,
    workers: usize,
    grace: Duration,
    shutdown_tx: watch::Sender<bool>,
}

impl Supervisor {
    /// Binds the listening socket. Serving does not start until
    /// [`Supervisor::run_until`].
    pub async fn bind(cfg: &ServerConfig, site: Arc<Site>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(&cfg.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", cfg.listen_addr))?;
        info!("Listening on {}", listener.local_addr()?);

        let (shutdown_tx, _) = watch::channel(false);
        Ok(Self {
            listener: Arc::new(listener),
            site,
            workers: cfg.workers,
            grace: Duration::from_secs(cfg.shutdown_grace_secs),
            shutdown_tx,
        })
    }

    /// The bound address, useful when the config asked for port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the pool until `shutdown` resolves, then drains workers within
    /// the grace period and aborts whatever is left.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
        let mut pool: JoinSet<(usize, anyhow::Result<()>)> = JoinSet::new();
        let mut task_owner: HashMap<tokio::task::Id, usize> = HashMap::new();
        let mut policies: Vec<RestartPolicy> =
            vec![RestartPolicy::default(); self.workers];
        let mut active = self.workers;

        for id in 0..self.workers {
            self.spawn_worker(&mut pool, &mut task_owner, id, None);
        }

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,

                Some(exited) = pool.join_next() => {
                    let (id, cause) = match exited {
                        Ok((id, Ok(()))) => (id, "exited".to_string()),
                        Ok((id, Err(e))) => (id, format!("failed: {e:#}")),
                        Err(join_err) => {
                            let id = task_owner
                                .get(&join_err.id())
                                .copied()
                                .unwrap_or(usize::MAX);
                            (id, format!("panicked: {join_err}"))
                        }
                    };
                    if id == usize::MAX {
                        continue;
                    }

                    // Any exit while we are still running is abnormal.
                    match policies[id].on_crash(Instant::now()) {
                        RestartAction::Restart(delay) => {
                            warn!(worker = id, %cause, ?delay, "worker down, restarting");
                            self.spawn_worker(&mut pool, &mut task_owner, id, Some(delay));
                        }
                        RestartAction::GiveUp => {
                            error!(worker = id, %cause, "worker crashed too often, not restarting");
                            active -= 1;
                            if active == 0 {
                                anyhow::bail!("all workers terminated");
                            }
                        }
                    }
                }
            }
        }

        info!("Shutting down workers ...");
        self.shutdown_tx.send_replace(true);

        let drain = async {
            while pool.join_next().await.is_some() {}
        };
        if timeout(self.grace, drain).await.is_err() {
            warn!("grace period elapsed, aborting remaining workers");
            pool.abort_all();
            while pool.join_next().await.is_some() {}
        }

        info!("Finished.");
        Ok(())
    }

    fn spawn_worker(
        &self,
        pool: &mut JoinSet<(usize, anyhow::Result<()>)>,
        task_owner: &mut HashMap<tokio::task::Id, usize>,
        id: usize,
        delay: Option<Duration>,
    ) {
        let listener = self.listener.clone();
        let site = self.site.clone();
        let shutdown = self.shutdown_tx.subscribe();

        let handle = pool.spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            (id, listener::worker_loop(id, listener, site, shutdown).await)
        });
        task_owner.insert(handle.id(), id);
    }
}
