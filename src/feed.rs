//! Viewport-driven station feed.
//!
//! [`FeedController`] keeps the interest points for the visible viewport. It
//! fetches once when mounted and again after every debounced camera move.
//! Requests may overlap. Whichever response is applied replaces the whole
//! set; how overlapping responses are ordered is decided by
//! [`ResponseOrdering`].

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::ApiError;
use crate::api::backend::{Client, InterestPoint};
use crate::camera::Camera;
use crate::debounce::Debouncer;
use crate::geo::ViewportBounds;
use crate::marker::{self, ClickAction, Marker};
use crate::notice::Notifier;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

const LOAD_ERROR: &str = "An error occurred while loading stations";

/// Anything that can answer a nearby query.
pub trait StationSource: Send + Sync + 'static {
    fn fetch_nearby(
        &self,
        bounds: ViewportBounds,
        only_active: bool,
    ) -> impl Future<Output = Result<Vec<InterestPoint>, ApiError>> + Send;
}

impl StationSource for Client {
    async fn fetch_nearby(
        &self,
        bounds: ViewportBounds,
        only_active: bool,
    ) -> Result<Vec<InterestPoint>, ApiError> {
        self.nearby(&bounds, only_active).await
    }
}

/// What happens when responses to overlapping fetches arrive out of order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseOrdering {
    /// Every successful response is applied as it arrives, so a slow
    /// response for an old viewport can overwrite a newer one.
    #[default]
    LastResolvedWins,

    /// Only the response to the most recently issued request is applied.
    /// Anything older is dropped when it resolves, failures included.
    LatestIssuedWins,
}

impl FromStr for ResponseOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last-resolved" => Ok(ResponseOrdering::LastResolvedWins),
            "latest-issued" => Ok(ResponseOrdering::LatestIssuedWins),
            other => Err(format!(
                "unknown response ordering {other:?}, expected last-resolved or latest-issued"
            )),
        }
    }
}

impl fmt::Display for ResponseOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseOrdering::LastResolvedWins => write!(f, "last-resolved"),
            ResponseOrdering::LatestIssuedWins => write!(f, "latest-issued"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedConfig {
    pub debounce: Duration,
    pub ordering: ResponseOrdering,
    pub only_active: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            ordering: ResponseOrdering::default(),
            only_active: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    Fetching,
}

#[derive(Default)]
struct Ledger {
    issued: u64,
    in_flight: usize,
}

struct Shared<S> {
    source: S,
    camera: Camera,
    ordering: ResponseOrdering,
    only_active: AtomicBool,
    mounted: AtomicBool,
    notices: Notifier,
    ledger: Mutex<Ledger>,
    points: watch::Sender<Vec<InterestPoint>>,
    status: watch::Sender<FeedStatus>,
    highlighted: watch::Sender<Option<i64>>,
    selected: watch::Sender<Option<i64>>,
}

impl<S: StationSource> Shared<S> {
    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issues a request for the camera's bounds as they are right now.
    fn fetch(self: &Arc<Self>) -> Option<u64> {
        let bounds = self.camera.bounds();
        if let Err(e) = bounds.validate() {
            warn!("not fetching stations for invalid viewport: {e}");
            return None;
        }

        let only_active = self.only_active.load(Ordering::Relaxed);

        let seq = {
            let mut ledger = self.ledger();
            ledger.issued += 1;
            ledger.in_flight += 1;
            self.status.send_replace(FeedStatus::Fetching);
            ledger.issued
        };

        debug!("fetch #{seq} issued for {bounds}");

        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let _settle = Settle(Arc::clone(&shared));
            let result = shared.source.fetch_nearby(bounds, only_active).await;
            shared.resolve(seq, result);
        });

        Some(seq)
    }

    fn resolve(&self, seq: u64, result: Result<Vec<InterestPoint>, ApiError>) {
        // held until the result is applied so no fetch is issued in between
        let ledger = self.ledger();
        let latest = ledger.issued;

        if !self.mounted.load(Ordering::Acquire) {
            debug!("fetch #{seq} resolved after teardown, ignoring");
            return;
        }

        if self.ordering == ResponseOrdering::LatestIssuedWins && seq != latest {
            debug!("discarding stale fetch #{seq}, #{latest} is the latest issued");
            return;
        }

        match result {
            Ok(points) => {
                debug!("applying fetch #{seq} with {} points", points.len());
                self.points.send_replace(points);
            }
            Err(e) => {
                warn!("fetch #{seq} failed: {e}");
                self.notices.error(LOAD_ERROR);
            }
        }
    }

    fn settle(&self) {
        let mut ledger = self.ledger();
        ledger.in_flight -= 1;

        if ledger.in_flight == 0 {
            self.status.send_replace(FeedStatus::Idle);
        }
    }
}

/// Marks one fetch as finished when dropped, including when the source
/// panics or the task is aborted.
struct Settle<S: StationSource>(Arc<Shared<S>>);

impl<S: StationSource> Drop for Settle<S> {
    fn drop(&mut self) {
        self.0.settle();
    }
}

/// Owns the visible interest point set for one mounted map.
///
/// Must be created inside a Tokio runtime. Dropping the controller tears it
/// down: camera moves are no longer observed and a pending debounced fetch
/// never fires. Requests already in flight run to completion but their
/// results are ignored.
pub struct FeedController<S: StationSource> {
    shared: Arc<Shared<S>>,
    debouncer: Arc<Debouncer<()>>,
    listener: JoinHandle<()>,
}

impl<S: StationSource> FeedController<S> {
    pub fn mount(source: S, camera: Camera, config: FeedConfig, notices: Notifier) -> Self {
        let shared = Arc::new(Shared {
            source,
            camera: camera.clone(),
            ordering: config.ordering,
            only_active: AtomicBool::new(config.only_active),
            mounted: AtomicBool::new(true),
            notices,
            ledger: Mutex::new(Ledger::default()),
            points: watch::channel(Vec::new()).0,
            status: watch::channel(FeedStatus::Idle).0,
            highlighted: watch::channel(None).0,
            selected: watch::channel(None).0,
        });

        let debouncer = {
            let shared = Arc::clone(&shared);
            Arc::new(Debouncer::new(config.debounce, move |()| {
                if shared.mounted.load(Ordering::Acquire) {
                    shared.fetch();
                }
            }))
        };

        let mut moves = camera.subscribe();
        moves.borrow_and_update();

        let listener = {
            let debouncer = Arc::clone(&debouncer);
            tokio::spawn(async move {
                while moves.changed().await.is_ok() {
                    debouncer.call(());
                }
            })
        };

        shared.fetch();

        Self {
            shared,
            debouncer,
            listener,
        }
    }

    /// Same as dropping the controller.
    pub fn unmount(self) {
        drop(self);
    }

    /// Fetches for the current viewport right away, bypassing the debounce.
    pub fn refresh(&self) -> Option<u64> {
        self.shared.fetch()
    }

    pub fn camera(&self) -> &Camera {
        &self.shared.camera
    }

    pub fn status(&self) -> FeedStatus {
        *self.shared.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<FeedStatus> {
        self.shared.status.subscribe()
    }

    pub fn points(&self) -> Vec<InterestPoint> {
        self.shared.points.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<InterestPoint>> {
        self.shared.points.subscribe()
    }

    pub fn markers(&self) -> Vec<Marker> {
        marker::render(
            &self.shared.points.borrow(),
            self.highlighted(),
            self.selected(),
        )
    }

    pub fn highlight(&self, id: Option<i64>) {
        self.shared.highlighted.send_replace(id);
    }

    pub fn highlighted(&self) -> Option<i64> {
        *self.shared.highlighted.borrow()
    }

    pub fn select(&self, id: Option<i64>) {
        self.shared.selected.send_replace(id);
    }

    pub fn selected(&self) -> Option<i64> {
        *self.shared.selected.borrow()
    }

    pub fn subscribe_selected(&self) -> watch::Receiver<Option<i64>> {
        self.shared.selected.subscribe()
    }

    pub fn only_active(&self) -> bool {
        self.shared.only_active.load(Ordering::Relaxed)
    }

    /// Toggles the "only active chargers" filter and refetches.
    pub fn set_only_active(&self, only_active: bool) {
        self.shared.only_active.store(only_active, Ordering::Relaxed);
        self.refresh();
    }

    pub fn click(&self, action: ClickAction) {
        match action {
            ClickAction::ZoomTo { center, zoom_delta } => {
                let zoom = self.shared.camera.zoom().saturating_add(zoom_delta);
                self.shared.camera.set_view(center, zoom);
                // a deliberate jump, not a drag: skip the debounce
                self.refresh();
            }
            ClickAction::OpenDetails(id) => self.select(Some(id)),
        }
    }

    /// Clicks the marker with the given test id, if it is currently shown.
    pub fn click_marker(&self, test_id: &str) -> Option<ClickAction> {
        let action = self
            .markers()
            .into_iter()
            .find(|m| m.test_id == test_id)
            .map(|m| m.action)?;

        self.click(action);
        Some(action)
    }
}

impl<S: StationSource> Drop for FeedController<S> {
    fn drop(&mut self) {
        self.shared.mounted.store(false, Ordering::Release);
        self.listener.abort();
        self.debouncer.cancel();
    }
}
