//! Screen lifecycle: one load task per mount, state published on a watch
//! channel and changed only through [`reduce`].
//!
//! Every mount gets a new generation number. Results carry the generation
//! they were started with and are dropped by the reducer once a newer mount
//! (or an unmount) has happened.

use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info};

use crate::{
    error::{FetchError, FlowError, LocationError},
    location::{LocationProvider, Notifier, ResolvedLocation, resolve_location},
    model::WeatherSnapshot,
    provider::ForecastProvider,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Location,
    Network,
    Status,
    Parse,
}

/// Why a load ended without a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&FlowError> for FailureReason {
    fn from(err: &FlowError) -> Self {
        let kind = match err {
            FlowError::Location(_) => FailureKind::Location,
            FlowError::Fetch(FetchError::Network(_)) => FailureKind::Network,
            FlowError::Fetch(FetchError::Status { .. }) => FailureKind::Status,
            FlowError::Fetch(FetchError::Parse(_)) => FailureKind::Parse,
        };
        Self { kind, message: err.to_string() }
    }
}

impl From<LocationError> for FailureReason {
    fn from(err: LocationError) -> Self {
        FailureReason::from(&FlowError::from(err))
    }
}

#[derive(Debug, Clone)]
pub enum ScreenStatus {
    Loading,
    Loaded { location: ResolvedLocation, snapshot: Arc<WeatherSnapshot> },
    Failed(FailureReason),
}

impl ScreenStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, ScreenStatus::Loading)
    }
}

#[derive(Debug, Clone)]
pub struct ScreenState {
    pub generation: u64,
    pub status: ScreenStatus,
}

impl Default for ScreenState {
    fn default() -> Self {
        Self { generation: 0, status: ScreenStatus::Loading }
    }
}

#[derive(Debug, Clone)]
pub enum ScreenEvent {
    Mounted { generation: u64 },
    Loaded { generation: u64, location: ResolvedLocation, snapshot: Arc<WeatherSnapshot> },
    Failed { generation: u64, reason: FailureReason },
    Unmounted { generation: u64 },
}

/// State transition function. Returns `None` when the event is ignored.
///
/// Results are only accepted for the current generation and only while
/// loading, so a load settles at most once.
pub fn reduce(state: &ScreenState, event: ScreenEvent) -> Option<ScreenState> {
    match event {
        ScreenEvent::Mounted { generation } if generation > state.generation => {
            Some(ScreenState { generation, status: ScreenStatus::Loading })
        }
        ScreenEvent::Unmounted { generation } if generation > state.generation => {
            Some(ScreenState { generation, status: state.status.clone() })
        }
        ScreenEvent::Loaded { generation, location, snapshot }
            if generation == state.generation && state.status.is_loading() =>
        {
            Some(ScreenState { generation, status: ScreenStatus::Loaded { location, snapshot } })
        }
        ScreenEvent::Failed { generation, reason }
            if generation == state.generation && state.status.is_loading() =>
        {
            Some(ScreenState { generation, status: ScreenStatus::Failed(reason) })
        }
        _ => None,
    }
}

fn dispatch(state: &watch::Sender<ScreenState>, event: ScreenEvent) {
    state.send_if_modified(|current| match reduce(current, event) {
        Some(next) => {
            *current = next;
            true
        }
        None => {
            debug!(generation = current.generation, "dropping stale screen event");
            false
        }
    });
}

/// Resolve a location, then fetch its forecast.
pub async fn load_forecast(
    location: &dyn LocationProvider,
    notifier: &dyn Notifier,
    forecast: &dyn ForecastProvider,
) -> Result<(ResolvedLocation, WeatherSnapshot), FlowError> {
    let resolved = resolve_location(location, notifier).await?;
    info!(coordinate = %resolved.coordinate, source = ?resolved.source, "fetching forecast");

    let snapshot = forecast.fetch(resolved.coordinate).await?;
    Ok((resolved, snapshot))
}

/// One forecast screen instance.
#[derive(Debug)]
pub struct Screen {
    location: Arc<dyn LocationProvider>,
    forecast: Arc<dyn ForecastProvider>,
    notifier: Arc<dyn Notifier>,
    generation: u64,
    state: Arc<watch::Sender<ScreenState>>,
    task: Option<JoinHandle<()>>,
}

impl Screen {
    pub fn new(
        location: Arc<dyn LocationProvider>,
        forecast: Arc<dyn ForecastProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, _) = watch::channel(ScreenState::default());
        Self { location, forecast, notifier, generation: 0, state: Arc::new(state), task: None }
    }

    pub fn subscribe(&self) -> watch::Receiver<ScreenState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ScreenState {
        self.state.borrow().clone()
    }

    /// Start a load. Any load still running from a previous mount is aborted.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(&mut self) -> u64 {
        self.abort_task();
        self.generation += 1;
        let generation = self.generation;
        dispatch(&self.state, ScreenEvent::Mounted { generation });

        let location = Arc::clone(&self.location);
        let forecast = Arc::clone(&self.forecast);
        let notifier = Arc::clone(&self.notifier);
        let state = Arc::clone(&self.state);

        self.task = Some(tokio::spawn(async move {
            let event =
                match load_forecast(location.as_ref(), notifier.as_ref(), forecast.as_ref()).await {
                    Ok((location, snapshot)) => {
                        ScreenEvent::Loaded { generation, location, snapshot: Arc::new(snapshot) }
                    }
                    Err(err) => {
                        error!(generation, error = %err, "forecast load failed");
                        ScreenEvent::Failed { generation, reason: FailureReason::from(&err) }
                    }
                };
            dispatch(&state, event);
        }));

        generation
    }

    /// Abort the running load; its result, if any, is discarded.
    pub fn unmount(&mut self) {
        self.abort_task();
        self.generation += 1;
        dispatch(&self.state, ScreenEvent::Unmounted { generation: self.generation });
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        self.abort_task();
    }
}

/// Wait until the latest generation leaves `Loading`.
///
/// Returns `None` if the screen is dropped first. An unmounted screen that
/// was still loading never settles.
pub async fn wait_until_settled(rx: &mut watch::Receiver<ScreenState>) -> Option<ScreenState> {
    rx.wait_for(|state| !state.status.is_loading()).await.ok().map(|state| state.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        location::{
            LocationSource, PERMISSION_DENIED_NOTICE,
            testing::{RecordingNotifier, ScriptedLocation},
        },
        model::{Coordinate, CurrentWeather, DailyForecast, FALLBACK_COORDINATE, HourlyForecast},
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::{
        sync::{
            Mutex,
            atomic::{AtomicBool, Ordering},
        },
        time::Duration,
    };
    use tokio::sync::Notify;

    fn snapshot(temperature: f64, weathercode: i32) -> WeatherSnapshot {
        WeatherSnapshot {
            current: CurrentWeather { temperature, weathercode, windspeed: 10.0 },
            hourly: HourlyForecast::new(vec![], vec![], vec![], vec![]).expect("empty hourly"),
            daily: DailyForecast::new(vec![], vec![], vec![], vec![]).expect("empty daily"),
            timezone: None,
            fetched_at: Utc::now(),
        }
    }

    /// Records every coordinate it is asked for.
    #[derive(Debug, Default)]
    struct RecordingForecast {
        calls: Mutex<Vec<Coordinate>>,
        fail_with_status: Option<u16>,
    }

    impl RecordingForecast {
        fn calls(&self) -> Vec<Coordinate> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl ForecastProvider for RecordingForecast {
        async fn fetch(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, FetchError> {
            self.calls.lock().expect("calls lock").push(coordinate);
            match self.fail_with_status {
                Some(status) => Err(FetchError::Status { status, body: "unavailable".into() }),
                None => Ok(snapshot(21.4, 2)),
            }
        }
    }

    /// Blocks until released; flags when its future is dropped.
    #[derive(Debug, Default)]
    struct GatedForecast {
        release: Notify,
        dropped: Arc<AtomicBool>,
        temperature: Mutex<f64>,
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ForecastProvider for GatedForecast {
        async fn fetch(&self, _coordinate: Coordinate) -> Result<WeatherSnapshot, FetchError> {
            let _flag = DropFlag(Arc::clone(&self.dropped));
            let temperature = *self.temperature.lock().expect("temperature lock");
            self.release.notified().await;
            Ok(snapshot(temperature, 0))
        }
    }

    fn loaded(generation: u64) -> ScreenEvent {
        ScreenEvent::Loaded {
            generation,
            location: ResolvedLocation { coordinate: FALLBACK_COORDINATE, source: LocationSource::Fallback },
            snapshot: Arc::new(snapshot(20.0, 0)),
        }
    }

    #[test]
    fn reducer_accepts_result_for_current_generation() {
        let state = reduce(&ScreenState::default(), ScreenEvent::Mounted { generation: 1 })
            .expect("mount applies");
        assert!(state.status.is_loading());

        let state = reduce(&state, loaded(1)).expect("result applies");
        assert!(matches!(state.status, ScreenStatus::Loaded { .. }));
    }

    #[test]
    fn reducer_drops_stale_results() {
        let state = ScreenState { generation: 2, status: ScreenStatus::Loading };

        assert!(reduce(&state, loaded(1)).is_none());
        assert!(
            reduce(
                &state,
                ScreenEvent::Failed {
                    generation: 1,
                    reason: FailureReason { kind: FailureKind::Network, message: "late".into() },
                },
            )
            .is_none()
        );
    }

    #[test]
    fn reducer_settles_once() {
        let state = ScreenState { generation: 1, status: ScreenStatus::Loading };
        let state = reduce(&state, loaded(1)).expect("first result applies");

        let late_failure = ScreenEvent::Failed {
            generation: 1,
            reason: FailureReason { kind: FailureKind::Parse, message: "dup".into() },
        };
        assert!(reduce(&state, late_failure).is_none());
    }

    #[test]
    fn reducer_ignores_older_mounts() {
        let state = ScreenState { generation: 3, status: ScreenStatus::Loading };
        assert!(reduce(&state, ScreenEvent::Mounted { generation: 2 }).is_none());
    }

    #[test]
    fn failure_reason_classifies_errors() {
        let reason = FailureReason::from(LocationError::Unavailable("gps off".into()));
        assert_eq!(reason.kind, FailureKind::Location);

        let err = FlowError::from(FetchError::Parse("bad".into()));
        assert_eq!(FailureReason::from(&err).kind, FailureKind::Parse);
    }

    #[tokio::test]
    async fn denied_permission_fetches_fallback_once() {
        let location = Arc::new(ScriptedLocation::denied());
        let forecast = Arc::new(RecordingForecast::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let mut screen = Screen::new(location.clone(), forecast.clone(), notifier.clone());
        let mut rx = screen.subscribe();
        screen.mount();

        let state = wait_until_settled(&mut rx).await.expect("settles");

        assert_eq!(forecast.calls(), vec![FALLBACK_COORDINATE]);
        assert_eq!(notifier.messages(), vec![PERMISSION_DENIED_NOTICE.to_string()]);
        match state.status {
            ScreenStatus::Loaded { location, snapshot } => {
                assert_eq!(location.source, LocationSource::Fallback);
                assert_eq!(snapshot.current.temperature, 21.4);
            }
            other => panic!("expected loaded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn granted_permission_fetches_device_position() {
        let position = Coordinate::new(40.0, -3.0);
        let location = Arc::new(ScriptedLocation::granted(position));
        let forecast = Arc::new(RecordingForecast::default());

        let mut screen =
            Screen::new(location.clone(), forecast.clone(), Arc::new(RecordingNotifier::default()));
        let mut rx = screen.subscribe();
        screen.mount();
        wait_until_settled(&mut rx).await.expect("settles");

        assert_eq!(forecast.calls(), vec![position]);
        assert_eq!(location.permission_calls.load(Ordering::SeqCst), 1);
        assert_eq!(location.position_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn location_failure_ends_in_failed_without_fetch() {
        let location =
            Arc::new(ScriptedLocation::new(Ok(crate::Permission::Granted), Err("disabled".into())));
        let forecast = Arc::new(RecordingForecast::default());

        let mut screen =
            Screen::new(location, forecast.clone(), Arc::new(RecordingNotifier::default()));
        let mut rx = screen.subscribe();
        screen.mount();

        let state = wait_until_settled(&mut rx).await.expect("settles");
        assert!(matches!(
            state.status,
            ScreenStatus::Failed(FailureReason { kind: FailureKind::Location, .. })
        ));
        assert!(forecast.calls().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_ends_in_failed() {
        let forecast = Arc::new(RecordingForecast { fail_with_status: Some(503), ..Default::default() });

        let mut screen = Screen::new(
            Arc::new(ScriptedLocation::denied()),
            forecast,
            Arc::new(RecordingNotifier::default()),
        );
        let mut rx = screen.subscribe();
        screen.mount();

        let state = wait_until_settled(&mut rx).await.expect("settles");
        match state.status {
            ScreenStatus::Failed(reason) => {
                assert_eq!(reason.kind, FailureKind::Status);
                assert!(reason.message.contains("503"));
            }
            other => panic!("expected failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn remount_discards_previous_load() {
        let forecast = Arc::new(GatedForecast::default());
        *forecast.temperature.lock().expect("temperature lock") = 1.0;

        let mut screen = Screen::new(
            Arc::new(ScriptedLocation::denied()),
            forecast.clone(),
            Arc::new(RecordingNotifier::default()),
        );
        let mut rx = screen.subscribe();

        assert_eq!(screen.mount(), 1);
        tokio::task::yield_now().await;

        *forecast.temperature.lock().expect("temperature lock") = 2.0;
        assert_eq!(screen.mount(), 2);

        // Give the second load time to reach the gate before releasing it.
        tokio::time::sleep(Duration::from_millis(50)).await;
        forecast.release.notify_waiters();

        let state = wait_until_settled(&mut rx).await.expect("settles");
        assert_eq!(state.generation, 2);
        match state.status {
            ScreenStatus::Loaded { snapshot, .. } => assert_eq!(snapshot.current.temperature, 2.0),
            other => panic!("expected loaded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unmount_aborts_in_flight_load() {
        let forecast = Arc::new(GatedForecast::default());
        let dropped = Arc::clone(&forecast.dropped);

        let mut screen = Screen::new(
            Arc::new(ScriptedLocation::denied()),
            forecast.clone(),
            Arc::new(RecordingNotifier::default()),
        );
        screen.mount();
        tokio::time::sleep(Duration::from_millis(50)).await;

        screen.unmount();

        tokio::time::timeout(Duration::from_secs(1), async {
            while !dropped.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("load future dropped after unmount");

        forecast.release.notify_waiters();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let state = screen.state();
        assert_eq!(state.generation, 2);
        assert!(state.status.is_loading());
    }
}
