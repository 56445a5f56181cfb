use crate::core::clock::{until, Clock};
use crate::core::error::SourceFormatError;
use crate::core::models::{Location, Measurement, Query, TickReport};
use crate::core::settings::{Settings, SourceSettings};
use crate::core::store::LogStore;
use crate::daemon::schedule::DailyWindow;
use crate::daemon::shutdown::Shutdown;
use crate::providers::TravelTimeProvider;
use crate::routes::{loader, Planner};
use chrono::{Duration as TimeDelta, NaiveDateTime};
use std::sync::Arc;
use std::time::Duration;

/// One location source with its cached locations and its output folder.
#[derive(Debug)]
pub struct RouteSet {
    pub name: String,
    pub locations: Vec<Location>,
    pub planner: Planner,
    pub store: LogStore,
}

impl RouteSet {
    pub fn load(settings: &Settings, source: &SourceSettings) -> Result<Self, SourceFormatError> {
        let locations = loader::load(&source.path, source.header)?;

        Ok(Self {
            name: source.name.clone(),
            locations,
            planner: Planner::new(source.mode, settings.max_batch_size),
            store: LogStore::new(settings.source_output_dir(source)),
        })
    }

    pub fn plan(&self) -> impl Iterator<Item = Query<'_>> {
        self.planner.plan(&self.locations)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CollectorConfig {
    pub window: DailyWindow,
    pub poll_interval: Duration,
    pub min_call_spacing: Duration,
    pub max_run_days: u32,
    pub join_open_window: bool,
}

impl From<&Settings> for CollectorConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            window: DailyWindow::new(settings.window_start(), settings.run_duration()),
            poll_interval: settings.poll_interval(),
            min_call_spacing: settings.min_call_spacing(),
            max_run_days: settings.max_run_days,
            join_open_window: settings.join_open_window,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    WaitingForWindow,
    ActiveCollecting {
        window_end: NaiveDateTime,
    },
    SleepingBetweenTicks {
        window_end: NaiveDateTime,
        wake_at: NaiveDateTime,
    },
    Terminated,
}

/// Enforces the minimum gap between the end of one fetch and the start of
/// the next, across ticks as well as within one.
struct Pacer {
    spacing: Duration,
    last_call: Option<NaiveDateTime>,
}

impl Pacer {
    async fn wait(&self, clock: &dyn Clock, shutdown: &Shutdown) -> bool {
        match self.last_call {
            Some(last) => {
                let ready_at = last + to_delta(self.spacing);
                pause(clock, shutdown, until(clock.now(), ready_at)).await
            }
            None => !shutdown.is_requested(),
        }
    }

    fn mark(&mut self, at: NaiveDateTime) {
        self.last_call = Some(at);
    }
}

pub struct Collector {
    config: CollectorConfig,
    routes: Vec<RouteSet>,
    provider: Arc<dyn TravelTimeProvider>,
    clock: Arc<dyn Clock>,
    shutdown: Shutdown,
    state: CollectorState,
    windows_opened: u32,
    last_start: Option<NaiveDateTime>,
    pacer: Pacer,
}

impl Collector {
    pub fn new(
        config: CollectorConfig,
        routes: Vec<RouteSet>,
        provider: Arc<dyn TravelTimeProvider>,
        clock: Arc<dyn Clock>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            pacer: Pacer {
                spacing: config.min_call_spacing,
                last_call: None,
            },
            config,
            routes,
            provider,
            clock,
            shutdown,
            state: CollectorState::WaitingForWindow,
            windows_opened: 0,
            last_start: None,
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> CollectorState {
        self.state
    }

    #[allow(dead_code)]
    pub fn windows_opened(&self) -> u32 {
        self.windows_opened
    }

    pub async fn run(&mut self) {
        tracing::info!(
            provider = self.provider.name(),
            sources = self.routes.len(),
            window_start = %self.config.window.start(),
            poll_interval = ?self.config.poll_interval,
            max_run_days = self.config.max_run_days,
            "Collector started"
        );

        while self.state != CollectorState::Terminated {
            self.step().await;
        }

        tracing::info!(windows = self.windows_opened, "Collector terminated");
    }

    /// Performs one state transition and returns the new state.
    pub async fn step(&mut self) -> CollectorState {
        if self.shutdown.is_requested() {
            self.state = CollectorState::Terminated;
            return self.state;
        }

        let state = self.state;
        self.state = match state {
            CollectorState::WaitingForWindow => self.wait_for_window().await,
            CollectorState::ActiveCollecting { window_end } => self.collect(window_end).await,
            CollectorState::SleepingBetweenTicks {
                window_end,
                wake_at,
            } => {
                let wait = until(self.clock.now(), wake_at);
                if !pause(self.clock.as_ref(), &self.shutdown, wait).await {
                    CollectorState::Terminated
                } else if self.clock.now() >= window_end {
                    tracing::info!(%window_end, "Collection window closed");
                    CollectorState::WaitingForWindow
                } else {
                    CollectorState::ActiveCollecting { window_end }
                }
            }
            CollectorState::Terminated => CollectorState::Terminated,
        };

        self.state
    }

    async fn wait_for_window(&mut self) -> CollectorState {
        if self.windows_opened >= self.config.max_run_days {
            tracing::info!(
                max_run_days = self.config.max_run_days,
                "Reached maximum number of collection days"
            );
            return CollectorState::Terminated;
        }

        let now = self.clock.now();
        let window = self.config.window;

        if self.config.join_open_window {
            if let Some((start, window_end)) = window.open_window(now) {
                self.windows_opened += 1;
                self.last_start = Some(start);
                tracing::info!(%window_end, day = self.windows_opened, "Joining open collection window");
                return CollectorState::ActiveCollecting { window_end };
            }
        }

        let start = match self.last_start {
            Some(previous) => window.next_start_after(previous, now),
            None => window.next_start(now),
        };
        let wait = until(now, start);
        tracing::info!(%start, ?wait, "Waiting for collection window");

        if !pause(self.clock.as_ref(), &self.shutdown, wait).await {
            return CollectorState::Terminated;
        }

        self.windows_opened += 1;
        self.last_start = Some(start);
        let window_end = window.end_for(start);
        tracing::info!(%window_end, day = self.windows_opened, "Collection window opened");
        CollectorState::ActiveCollecting { window_end }
    }

    async fn collect(&mut self, window_end: NaiveDateTime) -> CollectorState {
        let tick_start = self.clock.now();
        if tick_start >= window_end {
            tracing::info!(%window_end, "Collection window closed");
            return CollectorState::WaitingForWindow;
        }

        let report = self.run_tick().await;
        let finished = self.clock.now();
        tracing::info!(
            queries = report.queries,
            failed_queries = report.failed_queries,
            rows_written = report.rows_written,
            rows_skipped = report.rows_skipped,
            write_failures = report.write_failures,
            elapsed = ?until(tick_start, finished),
            "Tick finished"
        );

        if self.shutdown.is_requested() {
            return CollectorState::Terminated;
        }

        CollectorState::SleepingBetweenTicks {
            window_end,
            wake_at: tick_start + to_delta(self.config.poll_interval),
        }
    }

    /// Runs every planned query of every source once. Failures are logged and
    /// counted, never propagated.
    pub async fn run_tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        for routes in &self.routes {
            for query in routes.plan() {
                if !self.pacer.wait(self.clock.as_ref(), &self.shutdown).await {
                    tracing::info!(source = %routes.name, "Stop requested, ending tick early");
                    return report;
                }

                report.merge(self.dispatch(routes, &query).await);
                self.pacer.mark(self.clock.now());
            }
        }

        report
    }

    async fn dispatch(&self, routes: &RouteSet, query: &Query<'_>) -> TickReport {
        let mut report = TickReport {
            queries: 1,
            ..TickReport::default()
        };

        let origins = [query.origin.coordinate];
        let destinations = query.destination_coordinates();

        let matrix = match self
            .provider
            .fetch_travel_times(&origins, &destinations)
            .await
        {
            Ok(matrix) => matrix,
            Err(e) => {
                tracing::warn!(
                    source = %routes.name,
                    origin = %query.origin.label,
                    destinations = ?query.destination_labels(),
                    error = %e,
                    response = e.body().unwrap_or_default(),
                    "Query failed, skipping until next tick"
                );
                report.failed_queries = 1;
                return report;
            }
        };

        let timestamp = self.clock.now();

        for (index, destination) in query.destinations.iter().enumerate() {
            let travel = match matrix.travel_time(0, index) {
                Ok(travel) => travel,
                Err(e) => {
                    tracing::warn!(
                        source = %routes.name,
                        origin = %query.origin.label,
                        destination = %destination.label,
                        error = %e,
                        element = ?matrix.element(0, index).ok(),
                        "Skipping destination with unusable result"
                    );
                    report.rows_skipped += 1;
                    continue;
                }
            };

            let measurement =
                Measurement::new(timestamp, &query.origin.label, &destination.label, travel);

            match routes.store.append(&measurement) {
                Ok(path) => {
                    tracing::debug!(
                        ?path,
                        distance = travel.distance_meters,
                        duration = travel.duration_seconds,
                        traffic = travel.duration_in_traffic_seconds,
                        "Recorded measurement"
                    );
                    report.rows_written += 1;
                }
                Err(e) => {
                    tracing::error!(
                        source = %routes.name,
                        origin = %query.origin.label,
                        destination = %destination.label,
                        error = %e,
                        "Failed to append measurement"
                    );
                    report.write_failures += 1;
                }
            }
        }

        report
    }
}

/// Sleeps unless a stop is requested first. Returns false when stopping.
async fn pause(clock: &dyn Clock, shutdown: &Shutdown, duration: Duration) -> bool {
    if shutdown.is_requested() {
        return false;
    }
    if duration.is_zero() {
        return true;
    }

    tokio::select! {
        _ = clock.sleep(duration) => !shutdown.is_requested(),
        _ = shutdown.wait() => false,
    }
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or_else(|_| TimeDelta::days(1))
}
