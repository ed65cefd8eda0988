//! Turn processing runtime.
//!
//! [`WaypointRuntime`] owns a root router, a [`DialogRegistry`], a
//! [`ConversationStore`] and the configuration, and routes one activity per
//! turn through the tree.
//!
//! Each turn runs on a fresh [`TurnContext`] seeded with the state its
//! conversation had after the last successful turn. State written by a failed
//! turn is discarded.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use waypoint_runtime::WaypointRuntime;
//!
//! let runtime = WaypointRuntime::builder()
//!     .config_file("config/waypoint.toml")
//!     .router(root_tree())
//!     .build()?;
//!
//! let outcome = runtime.process(Activity::message("help")).await?;
//! println!("{:?}", outcome.replies);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use parking_lot::RwLock;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Level, debug, error, info, span, warn};

use crate::config::{ConfigError, ConfigLoader, ConfigResult, WaypointConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging::{self, LoggingBuilder, LoggingError};
use crate::registry::DialogRegistry;
use crate::state::ConversationStore;
use waypoint_core::{Activity, TurnContext};
use waypoint_framework::{BoxedRouter, RoutePath, Router, no_router, route_message};

/// The result of one processed turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    /// Whether a route matched and ran.
    pub matched: bool,
    /// The diagnostic path of the route that ran, if tracked.
    pub path: Option<RoutePath>,
    /// Replies written during the turn, in order.
    pub replies: Vec<String>,
}

/// Counters over every turn the runtime processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub turns: u64,
    pub matched: u64,
    pub unmatched: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct StatsCounters {
    turns: AtomicU64,
    matched: AtomicU64,
    unmatched: AtomicU64,
    failed: AtomicU64,
}

/// The Waypoint runtime.
///
/// Cheap to share behind an `Arc`; turns may be processed concurrently.
pub struct WaypointRuntime {
    config: WaypointConfig,
    /// Root of the routing tree.
    router: RwLock<BoxedRouter>,
    dialogs: DialogRegistry,
    conversations: ConversationStore,
    /// Parent of every turn's cancellation token.
    shutdown: CancellationToken,
    stats: StatsCounters,
}

impl WaypointRuntime {
    /// Creates a runtime with automatic configuration loading.
    ///
    /// Searches the current directory for `waypoint.toml`; if loading fails
    /// the defaults are used. The root router starts out as [`no_router`].
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                WaypointConfig::default()
            });

        Self::from_config(&config)
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration and initializes logging.
    ///
    /// A log file that cannot be opened falls back to stderr; use
    /// [`RuntimeBuilder::build`] to have it reported as an error instead.
    pub fn from_config(config: &WaypointConfig) -> Self {
        logging::init_from_config(&config.logging);
        Self::with_config(config)
    }

    fn with_config(config: &WaypointConfig) -> Self {
        info!(
            log_level = %config.logging.level,
            trace_paths = config.routing.trace_paths,
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            router: RwLock::new(no_router()),
            dialogs: DialogRegistry::new(),
            conversations: ConversationStore::new(),
            shutdown: CancellationToken::new(),
            stats: StatsCounters::default(),
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &WaypointConfig {
        &self.config
    }

    /// Returns the dialog registry.
    pub fn dialogs(&self) -> &DialogRegistry {
        &self.dialogs
    }

    /// Returns the state carried between turns of each conversation.
    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    /// Replaces the root router.
    pub fn set_router<R: Router + 'static>(&self, router: R) {
        self.set_router_boxed(Arc::new(router));
    }

    pub fn set_router_boxed(&self, router: BoxedRouter) {
        *self.router.write() = router;
        debug!("Root router replaced");
    }

    /// Returns the current root router.
    pub fn router(&self) -> BoxedRouter {
        Arc::clone(&self.router.read())
    }

    /// Returns a snapshot of the turn counters.
    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            turns: self.stats.turns.load(Ordering::Relaxed),
            matched: self.stats.matched.load(Ordering::Relaxed),
            unmatched: self.stats.unmatched.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        }
    }

    /// Returns the token cancelled by [`shutdown`](Self::shutdown).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancels every in-flight turn and stops [`run`](Self::run).
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Routes one activity through the tree.
    ///
    /// No match is a successful, unmatched outcome. Match and action errors
    /// are returned as [`RuntimeError::Routing`].
    ///
    /// Concurrent turns of one conversation each start from the same saved
    /// state; the last one to finish wins.
    pub async fn process(&self, activity: Activity) -> RuntimeResult<TurnOutcome> {
        let turn = self.stats.turns.fetch_add(1, Ordering::Relaxed) + 1;
        let conversation = activity.conversation_id.clone();
        let span = span!(
            Level::DEBUG,
            "turn",
            turn,
            conversation = %conversation,
            kind = %activity.kind
        );

        let ctx = Arc::new(
            TurnContext::with_cancellation(activity, self.shutdown.child_token())
                .with_state(self.conversations.load(&conversation)),
        );
        let router = self.router();

        let started = Instant::now();
        let result = route_message(router.as_ref(), Arc::clone(&ctx))
            .instrument(span.clone())
            .await;
        let elapsed = started.elapsed();

        let _enter = span.enter();
        let threshold = self.config.routing.slow_turn_warn_ms;
        if threshold > 0 && elapsed >= Duration::from_millis(threshold) {
            warn!(elapsed_ms = elapsed.as_millis() as u64, "Slow turn");
        }

        match result {
            Ok(outcome) => {
                let counter = if outcome.matched {
                    &self.stats.matched
                } else {
                    &self.stats.unmatched
                };
                counter.fetch_add(1, Ordering::Relaxed);
                self.conversations.save(&conversation, ctx.state_snapshot());

                if self.config.routing.trace_paths {
                    info!(matched = outcome.matched, path = ?outcome.path, "Turn routed");
                }

                Ok(TurnOutcome {
                    matched: outcome.matched,
                    path: outcome.path,
                    replies: ctx.take_replies(),
                })
            }
            Err(err) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                if self.config.routing.cancel_on_error {
                    ctx.cancellation().cancel();
                }
                warn!(error = %err, "Turn failed");
                Err(RuntimeError::Routing(err))
            }
        }
    }

    /// Processes activities until the stream ends, Ctrl+C is received, or
    /// [`shutdown`](Self::shutdown) is called.
    ///
    /// Each successful outcome is passed to `on_outcome`; failed turns are
    /// logged and counted. Returns the final stats.
    pub async fn run<S, F>(&self, activities: S, mut on_outcome: F) -> RuntimeStats
    where
        S: Stream<Item = Activity>,
        F: FnMut(TurnOutcome),
    {
        let mut activities = std::pin::pin!(activities);
        info!("Waypoint runtime is now running. Press Ctrl+C to stop.");

        loop {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down");
                    self.shutdown();
                    break;
                }
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                next = activities.next() => {
                    let Some(activity) = next else {
                        info!("Activity stream ended");
                        break;
                    };
                    match self.process(activity).await {
                        Ok(outcome) => on_outcome(outcome),
                        Err(err) => error!(error = %err, "Turn failed"),
                    }
                }
            }
        }

        let stats = self.stats();
        info!(
            turns = stats.turns,
            matched = stats.matched,
            unmatched = stats.unmatched,
            failed = stats.failed,
            "Runtime stopped"
        );
        stats
    }
}

impl Default for WaypointRuntime {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`WaypointRuntime`] with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    router: Option<BoxedRouter>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder searching the current directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            router: None,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: WaypointConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Sets the root router.
    pub fn router<R: Router + 'static>(mut self, router: R) -> Self {
        self.router = Some(Arc::new(router));
        self
    }

    /// Loads and validates the configuration, then builds the runtime.
    pub fn build(self) -> ConfigResult<WaypointRuntime> {
        let config = self.config_loader.load()?;
        validate_config(&config)?;

        match LoggingBuilder::from_config(&config.logging).try_init() {
            Ok(()) | Err(LoggingError::AlreadyInitialized(_)) => {}
            Err(LoggingError::FileAppender { path, source }) => {
                return Err(ConfigError::LogFile {
                    path,
                    message: source.to_string(),
                });
            }
        }

        let runtime = WaypointRuntime::with_config(&config);
        if let Some(router) = self.router {
            runtime.set_router_boxed(router);
        }
        Ok(runtime)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;
    use tokio_test::{assert_err, assert_ok};
    use parking_lot::Mutex;
    use waypoint_core::{CancellationToken, RouteError, StateMap};
    use waypoint_framework::{RouterExt, Text, best, first, if_true, scored, simple};

    fn quiet_config() -> WaypointConfig {
        WaypointConfig {
            routing: RoutingConfig {
                trace_paths: false,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn help_tree() -> BoxedRouter {
        first(vec![
            if_true(
                |ctx| ctx.text() == Some("help"),
                simple(|| async { "help-text" }).named("help"),
            )
            .boxed(),
            best(vec![
                scored(|| async { "ReplyA" }, 0.4).named("a").boxed(),
                scored(|| async { "ReplyB" }, 0.9).named("b").boxed(),
            ])
            .boxed(),
        ])
        .boxed()
    }

    #[tokio::test]
    async fn test_process_end_to_end() {
        let runtime = WaypointRuntime::from_config(&quiet_config());
        runtime.set_router_boxed(help_tree());

        let outcome = assert_ok!(runtime.process(Activity::message("help")).await);
        assert!(outcome.matched);
        assert_eq!(outcome.replies, vec!["help-text"]);
        assert_eq!(outcome.path, Some(vec!["first[0]/then/help".to_string()]));

        let outcome = assert_ok!(runtime.process(Activity::message("hello")).await);
        assert_eq!(outcome.replies, vec!["ReplyB"]);
        assert_eq!(outcome.path, Some(vec!["first[1]/best[1]/b".to_string()]));

        assert_eq!(
            runtime.stats(),
            RuntimeStats {
                turns: 2,
                matched: 2,
                unmatched: 0,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_unmatched_and_failed_turns() {
        let runtime = WaypointRuntime::from_config(&quiet_config());

        // The default root never matches.
        let outcome = assert_ok!(runtime.process(Activity::message("x")).await);
        assert_eq!(outcome, TurnOutcome::default());

        runtime.set_router(simple(|| async { Err::<(), _>("backend down") }));
        let err = assert_err!(runtime.process(Activity::message("x")).await);
        assert!(matches!(err.as_route_error(), Some(RouteError::Handler(_))));

        let stats = runtime.stats();
        assert_eq!((stats.turns, stats.unmatched, stats.failed), (2, 1, 1));
    }

    #[tokio::test]
    async fn test_turns_observe_shutdown() {
        let runtime = WaypointRuntime::from_config(&quiet_config());
        runtime.set_router(simple(|token: CancellationToken| async move {
            if token.is_cancelled() {
                "cancelled"
            } else {
                "active"
            }
        }));

        let outcome = runtime.process(Activity::message("x")).await.unwrap();
        assert_eq!(outcome.replies, vec!["active"]);

        runtime.shutdown();
        let outcome = runtime.process(Activity::message("x")).await.unwrap();
        assert_eq!(outcome.replies, vec!["cancelled"]);
    }

    #[tokio::test]
    async fn test_run_until_stream_ends() {
        let runtime = WaypointRuntime::from_config(&quiet_config());
        runtime.set_router_boxed(help_tree());

        let activities = futures::stream::iter(vec![
            Activity::message("help"),
            Activity::message("hi"),
        ]);
        let mut replies = Vec::new();
        let stats = runtime
            .run(activities, |outcome| replies.extend(outcome.replies))
            .await;

        assert_eq!(replies, vec!["help-text", "ReplyB"]);
        assert_eq!(stats.turns, 2);
        assert_eq!(stats.matched, 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let runtime = WaypointRuntime::from_config(&quiet_config());
        runtime.shutdown();

        let stats = runtime.run(futures::stream::pending::<Activity>(), |_| {}).await;
        assert_eq!(stats.turns, 0);
    }

    #[tokio::test]
    async fn test_dialogs_are_reachable_from_root() {
        let runtime = WaypointRuntime::from_config(&quiet_config());
        runtime
            .dialogs()
            .register("billing", simple(|| async { "billing menu" }))
            .unwrap();
        runtime.set_router(runtime.dialogs().dialog("billing"));

        let outcome = runtime.process(Activity::message("x")).await.unwrap();
        assert_eq!(outcome.replies, vec!["billing menu"]);

        runtime.dialogs().reset();
        assert!(runtime.process(Activity::message("x")).await.is_err());
    }

    #[test]
    fn test_builder_validates_config() {
        let mut config = quiet_config();
        config.logging.output = crate::config::LogOutput::File;

        let result = WaypointRuntime::builder()
            .without_env()
            .search_path(std::env::temp_dir().join("waypoint-builder-none"))
            .merge(config)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_reports_unwritable_log_file() {
        let blocker =
            std::env::temp_dir().join(format!("waypoint-builder-blocker-{}", std::process::id()));
        std::fs::write(&blocker, b"").unwrap();

        let mut config = quiet_config();
        config.logging.output = crate::config::LogOutput::File;
        config.logging.file_path = Some(blocker.join("turns.log"));

        let result = WaypointRuntime::builder()
            .without_env()
            .search_path(std::env::temp_dir().join("waypoint-builder-none"))
            .merge(config)
            .build();
        assert!(matches!(result, Err(ConfigError::LogFile { .. })));

        std::fs::remove_file(&blocker).unwrap();
    }

    fn ordering_tree() -> BoxedRouter {
        first(vec![
            if_true(
                |ctx| ctx.has_state("ordering"),
                simple(|ctx: Arc<TurnContext>, Text(item): Text| async move {
                    ctx.remove_state("ordering");
                    format!("Ordered one {item}.")
                }),
            )
            .boxed(),
            if_true(
                |ctx| ctx.text() == Some("order"),
                simple(|ctx: Arc<TurnContext>| async move {
                    ctx.set_state("ordering", true).map(|()| "What would you like?")
                }),
            )
            .boxed(),
        ])
        .boxed()
    }

    #[tokio::test]
    async fn test_state_carries_across_turns_of_a_conversation() {
        let runtime = WaypointRuntime::from_config(&quiet_config());
        runtime.set_router_boxed(ordering_tree());
        let alice = |text: &str| Activity::message(text).with_conversation("alice");

        let outcome = assert_ok!(runtime.process(alice("order")).await);
        assert_eq!(outcome.replies, vec!["What would you like?"]);
        assert!(runtime.conversations().contains("alice"));

        // Another conversation does not see alice's state.
        let outcome = assert_ok!(
            runtime
                .process(Activity::message("pizza").with_conversation("bob"))
                .await
        );
        assert!(!outcome.matched);

        let outcome = assert_ok!(runtime.process(alice("pizza")).await);
        assert_eq!(outcome.replies, vec!["Ordered one pizza."]);
        assert!(runtime.conversations().is_empty());
    }

    #[tokio::test]
    async fn test_failed_turn_discards_state() {
        let runtime = WaypointRuntime::from_config(&quiet_config());
        let saved = StateMap::from([("step".to_string(), 1.into())]);
        runtime.conversations().save("alice", saved.clone());

        runtime.set_router(simple(|ctx: Arc<TurnContext>| async move {
            ctx.set_state("step", 2).map_err(RouteError::from)?;
            Err::<(), RouteError>(RouteError::handler("payment declined"))
        }));

        let activity = Activity::message("pay").with_conversation("alice");
        assert_err!(runtime.process(activity).await);
        assert_eq!(runtime.conversations().load("alice"), saved);
    }

    #[tokio::test]
    async fn test_cancel_on_error_reaches_leaked_tokens() {
        async fn failing_turn(config: &WaypointConfig) -> CancellationToken {
            let runtime = WaypointRuntime::from_config(config);
            let leaked: Arc<Mutex<Option<CancellationToken>>> = Arc::default();

            let sink = Arc::clone(&leaked);
            runtime.set_router(simple(move |token: CancellationToken| {
                *sink.lock() = Some(token);
                async { Err::<(), _>("backend down") }
            }));
            assert_err!(runtime.process(Activity::message("x")).await);

            let token = leaked.lock().take();
            token.unwrap()
        }

        let mut config = quiet_config();
        assert!(!failing_turn(&config).await.is_cancelled());

        config.routing.cancel_on_error = true;
        assert!(failing_turn(&config).await.is_cancelled());
    }
}
