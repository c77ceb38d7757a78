//! # Application Controller
//!
//! Builds the catalog stack from a profile and runs one command against it.
//! Everything is injected so tests can point it at a mock server and capture
//! the output stream.

use crate::catalog::{
    filter, CatalogCoordinator, CatalogList, CatalogSnapshot, CatalogStore, FileCatalogStore,
    HttpCatalogService, MemoryCatalogStore, ReachabilityMonitor, ReachabilityProbe,
    ReachabilityState,
};
use crate::cmd_args::Command;
use crate::config::CatalogProfile;
use crate::view::{offline_notice, CatalogRenderer, OutputFormat};
use anyhow::{anyhow, Result};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

type Coordinator = CatalogCoordinator<HttpCatalogService, Box<dyn CatalogStore>>;

/// Orchestrates one run of the program
pub struct AppController<W: Write> {
    coordinator: Coordinator,
    monitor: Arc<ReachabilityMonitor>,
    probe: Option<ReachabilityProbe>,
    renderer: CatalogRenderer<W>,
    offline: bool,
}

impl<W: Write> AppController<W> {
    /// Build the controller and take an initial reachability reading.
    ///
    /// With `offline` set the network is never probed or used.
    pub async fn new(
        profile: &CatalogProfile,
        offline: bool,
        format: OutputFormat,
        out: W,
    ) -> Result<Self> {
        let service = HttpCatalogService::new(profile)?;

        let store: Box<dyn CatalogStore> = if profile.cache_enabled() {
            tracing::debug!("Catalog cache at {}", profile.cache_path().display());
            Box::new(FileCatalogStore::new(profile.cache_path()))
        } else {
            tracing::debug!("Catalog cache disabled for profile '{}'", profile.name());
            Box::new(MemoryCatalogStore::new())
        };

        let probe = profile
            .probe_addr()
            .map(|addr| ReachabilityProbe::new(addr).with_timeout(profile.timeout()));

        let initial = match (&probe, offline) {
            (_, true) => ReachabilityState::Unsatisfied,
            (Some(probe), false) => probe.check().await,
            (None, false) => {
                tracing::warn!("Cannot derive a probe address from api_base; assuming online");
                ReachabilityState::Satisfied
            }
        };
        tracing::info!("Initial reachability: {initial}");

        let monitor = Arc::new(ReachabilityMonitor::new(initial));
        let coordinator = CatalogCoordinator::new(service, store, monitor.clone())
            .with_embedded_posters(profile.embed_posters());

        Ok(Self {
            coordinator,
            monitor,
            probe,
            renderer: CatalogRenderer::new(out, format, profile.image_base()),
            offline,
        })
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn into_output(self) -> W {
        self.renderer.into_inner()
    }

    pub async fn run(&mut self, command: &Command) -> Result<()> {
        tracing::debug!("Running command {:?}", command);
        match command {
            Command::List { query } => self.list(query).await,
            Command::Show { id } => self.show(*id).await,
            Command::Status => self.status(),
            Command::Watch {
                interval_secs,
                query,
            } => self.watch(Duration::from_secs(*interval_secs), query).await,
        }
    }

    async fn list(&mut self, query: &str) -> Result<()> {
        self.coordinator.refresh().await;
        let snapshot = self.coordinator.snapshot();
        self.render_snapshot(&snapshot, query)
    }

    fn render_snapshot(&mut self, snapshot: &CatalogSnapshot, query: &str) -> Result<()> {
        if let Some(notice) = offline_notice(self.monitor.current_status(), snapshot.source) {
            eprintln!("{notice}");
        }
        let filtered: CatalogList = filter::apply(&snapshot.list, query);
        self.renderer.render_list(&filtered)
    }

    async fn show(&mut self, id: u64) -> Result<()> {
        self.coordinator.refresh().await;
        let movie = self
            .coordinator
            .find(id)
            .ok_or_else(|| anyhow!("Movie {id} is not in the current catalog"))?;
        let source = self.coordinator.source();
        if let Some(notice) = offline_notice(self.monitor.current_status(), source) {
            eprintln!("{notice}");
        }
        self.renderer.render_movie(&movie)
    }

    fn status(&mut self) -> Result<()> {
        let addr = self
            .probe
            .as_ref()
            .map(|probe| probe.addr().to_string())
            .unwrap_or_else(|| "catalog".to_string());
        self.renderer.render_status(self.monitor.current_status(), &addr)
    }

    /// Re-render whenever the current list changes; refresh on every
    /// reachability transition. Runs until Ctrl-C.
    async fn watch(&mut self, interval: Duration, query: &str) -> Result<()> {
        let probe = match (&self.probe, self.offline) {
            (Some(probe), false) => probe.clone().with_interval(interval),
            _ => {
                tracing::info!("Not probing the network; listing once");
                return self.list(query).await;
            }
        };

        let (transition_sender, mut transitions) = mpsc::unbounded_channel();
        let subscription = self.monitor.subscribe(move |status| {
            let _ = transition_sender.send(status);
        });
        let probe_task = probe.spawn(self.monitor.clone());

        let mut lists = self.coordinator.subscribe();
        self.coordinator.refresh().await;

        let result = loop {
            tokio::select! {
                changed = lists.changed() => {
                    if changed.is_err() {
                        break Ok(());
                    }
                    let snapshot = lists.borrow_and_update().clone();
                    if let Err(e) = self.render_snapshot(&snapshot, query) {
                        break Err(e);
                    }
                }
                Some(status) = transitions.recv() => {
                    tracing::info!("Connectivity changed to {status}, refreshing");
                    self.coordinator.refresh().await;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::debug!("Interrupted, stopping watch");
                    break Ok(());
                }
            }
        };

        probe_task.abort();
        self.monitor.unsubscribe(subscription);
        result
    }
}
