//! Radar product view.
//!
//! Every selection change bumps a request generation and spawns a compute
//! task. The generation is bumped and checked under the same lock that
//! publishes, so a task that finishes after a newer request discards its
//! result. Published sweeps are swapped in through a `watch` channel;
//! consumers holding the previous `Arc<SweepBuffer>` keep it.

use chrono::{DateTime, Utc};
use radar_common::{RadarError, RadarResult, Rgba8};
use radar_manager::{ManagerEvent, RadarProductManager};
use renderer::{ColorTable, SweepBuffer, SweepMetadata};
use std::sync::{Arc, Weak};
use std::time::Instant;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::task;
use tracing::{debug, info, warn};
use wsr88d::DataBlockType;

use crate::compute::{build_geometry, ComputedGeometry};
use crate::types::{ColorTableSource, Selection, ViewEvent, ViewProduct, ViewState};

const EVENT_CAPACITY: usize = 16;

/// State guarded by the publication lock.
struct Publication {
    generation: u64,
    selection: Selection,
    computed: Option<ComputedGeometry>,
}

struct ViewInner {
    manager: Arc<RadarProductManager>,
    publication: Mutex<Publication>,
    color_table: RwLock<Option<Arc<ColorTable>>>,
    state: watch::Sender<ViewState>,
    sweep: watch::Sender<Arc<SweepBuffer>>,
    events: broadcast::Sender<ViewEvent>,
    /// Never sent; receivers see it close when the view is dropped.
    closed: watch::Sender<()>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    /// Query the manager and rebuild geometry.
    Compute,
    /// Recolor the published geometry with the current table, rebuilding it
    /// if it no longer matches the selection.
    Recolor,
}

/// Sweep computation for one product selection on one site.
#[derive(Clone)]
pub struct RadarProductView {
    inner: Arc<ViewInner>,
}

impl RadarProductView {
    pub fn new(manager: Arc<RadarProductManager>, product: ViewProduct) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (state, _) = watch::channel(ViewState::Uninitialized);
        let (sweep, _) = watch::channel(Arc::new(SweepBuffer::default()));
        let (closed, _) = watch::channel(());
        Self {
            inner: Arc::new(ViewInner {
                manager,
                publication: Mutex::new(Publication {
                    generation: 0,
                    selection: Selection::new(product),
                    computed: None,
                }),
                color_table: RwLock::new(None),
                state,
                sweep,
                events,
                closed,
            }),
        }
    }

    /// Load the color table, start following the manager's loads and compute
    /// the first sweep.
    ///
    /// A palette that fails to load leaves the view uninitialized.
    pub async fn initialize(&self, source: ColorTableSource) -> RadarResult<()> {
        self.inner.state.send_replace(ViewState::Initializing);

        let table = match source {
            ColorTableSource::None => None,
            ColorTableSource::Table(table) => Some(table),
            ColorTableSource::File(path) => {
                let loaded = task::spawn_blocking(move || ColorTable::from_file(path))
                    .await
                    .map_err(|e| RadarError::Task(e.to_string()))
                    .and_then(|result| result);
                match loaded {
                    Ok(table) => Some(Arc::new(table)),
                    Err(e) => {
                        self.inner.state.send_replace(ViewState::Uninitialized);
                        return Err(e);
                    }
                }
            }
        };
        *self.inner.color_table.write().await = table;

        spawn_manager_listener(
            Arc::downgrade(&self.inner),
            self.inner.manager.subscribe(),
            self.inner.closed.subscribe(),
        );

        self.inner.state.send_replace(ViewState::Idle);
        self.request(Request::Compute).await;
        Ok(())
    }

    pub async fn select_elevation(&self, elevation: f32) {
        self.update_selection(|s| s.elevation = elevation).await;
    }

    pub async fn select_time(&self, time: Option<DateTime<Utc>>) {
        self.update_selection(|s| s.time = time).await;
    }

    pub async fn select_moment(&self, moment: DataBlockType) {
        self.update_selection(|s| s.product = ViewProduct::Level2(moment)).await;
    }

    pub async fn select_product(&self, product: ViewProduct) {
        self.update_selection(|s| s.product = product).await;
    }

    async fn update_selection(&self, update: impl FnOnce(&mut Selection)) {
        update(&mut self.inner.publication.lock().await.selection);
        if self.state() != ViewState::Uninitialized {
            self.request(Request::Compute).await;
        }
    }

    /// Replace the color table and recolor the current sweep. Geometry is
    /// reused when it still matches the selection at the time of the request.
    pub async fn load_color_table(&self, table: ColorTable) {
        *self.inner.color_table.write().await = Some(Arc::new(table));
        let _ = self.inner.events.send(ViewEvent::ColorTableUpdated);

        if self.state() != ViewState::Uninitialized {
            self.request(Request::Recolor).await;
        }
    }

    /// Recompute the sweep for the current selection.
    pub async fn refresh(&self) {
        self.request(Request::Compute).await;
    }

    async fn request(&self, request: Request) {
        self.inner.request(request).await;
    }

    /// Latest published sweep.
    pub fn sweep(&self) -> Arc<SweepBuffer> {
        Arc::clone(&self.inner.sweep.borrow())
    }

    /// Receiver that observes every published sweep.
    pub fn watch_sweep(&self) -> watch::Receiver<Arc<SweepBuffer>> {
        self.inner.sweep.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.inner.events.subscribe()
    }

    pub fn state(&self) -> ViewState {
        *self.inner.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ViewState> {
        self.inner.state.subscribe()
    }

    pub async fn selection(&self) -> Selection {
        self.inner.publication.lock().await.selection
    }

    /// Elevation of the published sweep (degrees).
    pub fn elevation(&self) -> f32 {
        self.inner.sweep.borrow().metadata.elevation
    }

    /// Elevations available for the selected product.
    pub async fn elevation_angles(&self) -> Vec<f32> {
        match self.selection().await.product {
            ViewProduct::Level2(moment) => self.inner.manager.elevation_angles(Some(moment)).await,
            ViewProduct::Level3(_) => Vec::new(),
        }
    }

    pub fn sweep_time(&self) -> Option<DateTime<Utc>> {
        self.inner.sweep.borrow().metadata.time
    }

    pub fn vcp(&self) -> Option<u16> {
        self.inner.sweep.borrow().metadata.vcp
    }

    /// Distance to the far edge of the outermost gate (meters).
    pub fn range(&self) -> f32 {
        self.inner.sweep.borrow().metadata.range
    }

    pub async fn product_name(&self) -> String {
        self.selection().await.product.name()
    }

    /// Raw data word of every published vertex.
    pub fn moment_data(&self) -> Vec<u16> {
        self.inner.sweep.borrow().data.clone()
    }

    /// Color per raw data word of the current product, for GPU-side lookup.
    /// Empty until a sweep and a color table are both available.
    pub async fn color_lookup_table(&self) -> Vec<Rgba8> {
        let Some(table) = self.inner.color_table.read().await.clone() else {
            return Vec::new();
        };
        let decoder = self
            .inner
            .publication
            .lock()
            .await
            .computed
            .as_ref()
            .and_then(|c| c.decoder.clone());
        decoder.map(|d| d.lookup_table(&table)).unwrap_or_default()
    }

    pub fn manager(&self) -> &Arc<RadarProductManager> {
        &self.inner.manager
    }
}

impl ViewInner {
    async fn request(self: &Arc<Self>, request: Request) {
        // Geometry is only reused if it matches the selection this request
        // is numbered for.
        let (generation, selection, reuse) = {
            let mut publication = self.publication.lock().await;
            publication.generation += 1;
            self.state.send_replace(ViewState::ComputingSweep);
            let reuse = match request {
                Request::Recolor => publication
                    .computed
                    .as_ref()
                    .filter(|c| c.selection == publication.selection)
                    .cloned(),
                Request::Compute => None,
            };
            (publication.generation, publication.selection, reuse)
        };

        let view = Arc::clone(self);
        tokio::spawn(async move { view.compute(generation, selection, reuse).await });
    }

    async fn compute(
        self: Arc<Self>,
        generation: u64,
        selection: Selection,
        reuse: Option<ComputedGeometry>,
    ) {
        let start = Instant::now();
        let table = self.color_table.read().await.clone();

        let computed = match reuse {
            Some(computed) => Some(computed),
            None => match build_geometry(&self.manager, selection).await {
                Ok(computed) => computed,
                Err(e) => {
                    warn!(error = %e, ?selection, "Sweep computation failed");
                    None
                }
            },
        };

        let buffer = match (&computed, &table) {
            (Some(computed), Some(table)) => {
                let geometry = Arc::clone(&computed.geometry);
                let table = Arc::clone(table);
                match task::spawn_blocking(move || geometry.colorize(&table)).await {
                    Ok(buffer) => buffer,
                    Err(e) => {
                        warn!(error = %e, "Sweep colorization failed");
                        SweepBuffer::empty(computed.geometry.metadata.clone())
                    }
                }
            }
            (Some(computed), None) => SweepBuffer::empty(computed.geometry.metadata.clone()),
            (None, _) => SweepBuffer::empty(SweepMetadata::default()),
        };

        let mut publication = self.publication.lock().await;
        if publication.generation != generation {
            debug!(
                generation,
                current = publication.generation,
                "Discarding stale sweep"
            );
            return;
        }

        let gates = buffer.gate_count();
        let elevation = buffer.metadata.elevation;
        publication.computed = computed;
        self.sweep.send_replace(Arc::new(buffer));
        self.state.send_replace(ViewState::Idle);
        drop(publication);

        info!(
            site = %self.manager.radar_site().id,
            product = %selection.product.short_name(),
            elevation,
            gates,
            generation,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Computed sweep"
        );
        let _ = self.events.send(ViewEvent::SweepComputed);
    }
}

/// Recompute when the manager loads data for this view's product kind.
/// Stops once the view is dropped, releasing its manager subscription.
fn spawn_manager_listener(
    view: Weak<ViewInner>,
    mut events: broadcast::Receiver<ManagerEvent>,
    mut closed: watch::Receiver<()>,
) {
    tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                received = events.recv() => received,
                _ = closed.changed() => break,
            };
            let event = match received {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let Some(view) = view.upgrade() else {
                break;
            };
            let selection = view.publication.lock().await.selection;
            let relevant = matches!(
                (event, selection.product),
                (ManagerEvent::Level2DataLoaded, ViewProduct::Level2(_))
                    | (ManagerEvent::Level3DataLoaded, ViewProduct::Level3(_))
            );
            if relevant {
                debug!(?event, "Recomputing sweep for new data");
                view.request(Request::Compute).await;
            }
        }
    });
}
