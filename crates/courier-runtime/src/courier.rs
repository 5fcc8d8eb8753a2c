//! The Courier context object.
//!
//! [`Courier`] owns every long-lived piece of a bot process: the collaborators,
//! both registries, the banned-user filter, the dispatcher and the poller. It
//! is the registration surface for plugins and handlers and the entry point
//! for running the polling loop.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use courier_runtime::Courier;
//! use courier_framework::{on_command, INTERNAL_PRIORITY};
//!
//! let courier = Courier::builder(transport, users)
//!     .load_config()?
//!     .build();
//!
//! courier.add_handler(
//!     on_command("start", |ctx| async move {
//!         ctx.reply("Welcome!").await?;
//!         Ok(())
//!     }),
//!     INTERNAL_PRIORITY,
//!     None,
//! );
//!
//! courier.run().await?;
//! ```

use std::any::Any;
use std::sync::Arc;

use tokio::signal;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::MemoryCache;
use crate::config::{ConfigLoader, ConfigResult, CourierConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::poller::{PollOutcome, Poller};
use courier_core::{
    BoxedCache, BoxedScheduler, BoxedTransport, BoxedUserStore, JobInfo, JobSpec, OWNER_ROLE,
    ParseMode, Update, UserFilter,
};
use courier_framework::{
    BannedUserFilter, DispatchOutcome, DispatchResult, Dispatcher, Handler, HandlerEntry,
    HandlerRegistry, Plugin, PluginRegistry,
};

/// The runtime context of one bot process.
pub struct Courier {
    config: CourierConfig,
    transport: BoxedTransport,
    users: BoxedUserStore,
    cache: BoxedCache,
    scheduler: Option<BoxedScheduler>,
    plugins: Arc<PluginRegistry>,
    handlers: Arc<HandlerRegistry>,
    banned: Arc<BannedUserFilter>,
    dispatcher: Dispatcher,
    poller: Arc<Poller>,
}

impl Courier {
    /// Starts building a context around a transport and a user store.
    pub fn builder(transport: BoxedTransport, users: BoxedUserStore) -> CourierBuilder {
        CourierBuilder::new(transport, users)
    }

    pub fn config(&self) -> &CourierConfig {
        &self.config
    }

    pub fn transport(&self) -> &BoxedTransport {
        &self.transport
    }

    pub fn cache(&self) -> &BoxedCache {
        &self.cache
    }

    pub fn plugins(&self) -> &Arc<PluginRegistry> {
        &self.plugins
    }

    pub fn handlers(&self) -> &Arc<HandlerRegistry> {
        &self.handlers
    }

    pub fn banned(&self) -> &Arc<BannedUserFilter> {
        &self.banned
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn poller(&self) -> &Arc<Poller> {
        &self.poller
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a handler. See [`HandlerRegistry::register`].
    pub fn add_handler<H: Handler>(
        &self,
        handler: H,
        priority: i32,
        plugin: Option<&str>,
    ) -> Arc<HandlerEntry> {
        self.handlers.register(handler, priority, plugin)
    }

    /// Registers a plugin, applying its `plugins.<name>.enabled` setting.
    pub fn add_plugin(&self, plugin: Plugin) -> Arc<Plugin> {
        let plugin = self.plugins.register(plugin);
        self.apply_plugin_settings(&plugin);
        plugin
    }

    /// Registers a dynamically typed plugin value.
    ///
    /// Fails with [`PluginError::TypeMismatch`](courier_framework::PluginError)
    /// when the value is not a plugin.
    pub fn add_plugin_any(&self, value: Box<dyn Any + Send + Sync>) -> RuntimeResult<Arc<Plugin>> {
        let plugin = self.plugins.register_any(value)?;
        self.apply_plugin_settings(&plugin);
        Ok(plugin)
    }

    fn apply_plugin_settings(&self, plugin: &Plugin) {
        if let Some(settings) = self.config.plugins.get(plugin.name()) {
            plugin.set_enabled(settings.enabled);
            debug!(plugin = plugin.name(), enabled = settings.enabled, "Applied plugin settings");
        }
    }

    /// Enables or disables a plugin; returns `false` for unknown names.
    pub fn enable_plugin(&self, name: &str, enabled: bool) -> bool {
        self.plugins.set_enabled(name, enabled)
    }

    pub fn plugin_definition(&self, name: &str) -> Option<Arc<Plugin>> {
        self.plugins.get(name)
    }

    /// Command listing in dispatch order. See [`HandlerRegistry::commands`].
    pub fn commands(&self, exclude_internal: bool) -> Vec<(String, Arc<HandlerEntry>)> {
        self.handlers.commands(exclude_internal)
    }

    // =========================================================================
    // Dispatch & notifications
    // =========================================================================

    /// Dispatches one update outside the polling loop.
    pub async fn process_update(&self, update: Update) -> DispatchResult<DispatchOutcome> {
        self.dispatcher
            .dispatch(update, Arc::clone(&self.transport))
            .await
    }

    /// Sends `message` to every user with the owner role.
    ///
    /// A failed send is logged and the remaining owners are still tried.
    /// Returns the number of owners reached.
    pub async fn notify_owners(&self, message: &str, parse_mode: ParseMode) -> RuntimeResult<usize> {
        let owners = self.users.list_users(UserFilter::role(OWNER_ROLE)).await?;

        let mut delivered = 0;
        for owner in &owners {
            match self.transport.send_message(owner.id, message, parse_mode).await {
                Ok(_) => delivered += 1,
                Err(e) => warn!(user_id = owner.id, error = %e, "Failed to notify owner"),
            }
        }

        info!(delivered, owners = owners.len(), "Owner notification sent");
        Ok(delivered)
    }

    // =========================================================================
    // Scheduler delegation
    // =========================================================================

    fn scheduler(&self) -> RuntimeResult<&BoxedScheduler> {
        self.scheduler
            .as_ref()
            .ok_or(RuntimeError::SchedulerUnavailable)
    }

    pub async fn add_job(&self, job: JobSpec) -> RuntimeResult<JobInfo> {
        Ok(self.scheduler()?.add_job(job).await?)
    }

    pub async fn pause_job(&self, id: &str) -> RuntimeResult<()> {
        Ok(self.scheduler()?.pause_job(id).await?)
    }

    pub async fn resume_job(&self, id: &str) -> RuntimeResult<()> {
        Ok(self.scheduler()?.resume_job(id).await?)
    }

    pub async fn remove_job(&self, id: &str) -> RuntimeResult<()> {
        Ok(self.scheduler()?.remove_job(id).await?)
    }

    pub async fn get_job(&self, id: &str) -> RuntimeResult<Option<JobInfo>> {
        Ok(self.scheduler()?.get_job(id).await?)
    }

    pub async fn get_jobs(&self) -> RuntimeResult<Vec<JobInfo>> {
        Ok(self.scheduler()?.get_jobs().await?)
    }

    // =========================================================================
    // Polling loop
    // =========================================================================

    /// Runs a single polling cycle.
    pub async fn poll_once(&self) -> RuntimeResult<PollOutcome> {
        self.poller.poll_once().await
    }

    /// Spawns the polling loop on the current tokio runtime.
    ///
    /// A cycle starts every `polling.poll_interval_ms`; ticks missed while a
    /// cycle runs are skipped. Cycle errors are logged and the loop goes on.
    pub fn spawn_polling(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let poller = Arc::clone(&self.poller);
        let period = self.config.polling.poll_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => match poller.poll_once().await {
                        Ok(outcome) => debug!(?outcome, "Polling cycle finished"),
                        Err(e) => error!(error = %e, "Polling cycle failed"),
                    },
                }
            }

            info!("Polling loop stopped");
        })
    }

    /// Runs the polling loop until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let token = CancellationToken::new();
        let handle = self.spawn_polling(token.clone());
        info!(
            job = %self.config.polling.job_name,
            handlers = self.handlers.len(),
            plugins = self.plugins.len(),
            "Courier is running"
        );

        shutdown.await;
        token.cancel();

        if let Err(e) = handle.await {
            error!(error = %e, "Polling task ended abnormally");
        }
        info!("Courier stopped");
        Ok(())
    }

    /// Runs until Ctrl+C (or SIGTERM on Unix).
    pub async fn run(&self) -> RuntimeResult<()> {
        self.run_until(wait_for_shutdown()).await
    }
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    info!("Received Ctrl+C, shutting down");
}

impl std::fmt::Debug for Courier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Courier")
            .field("handlers", &self.handlers.len())
            .field("plugins", &self.plugins.len())
            .field("scheduler", &self.scheduler.is_some())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// CourierBuilder
// =============================================================================

/// Builder for [`Courier`].
pub struct CourierBuilder {
    transport: BoxedTransport,
    users: BoxedUserStore,
    config: CourierConfig,
    cache: Option<BoxedCache>,
    scheduler: Option<BoxedScheduler>,
    init_logging: bool,
}

impl CourierBuilder {
    pub fn new(transport: BoxedTransport, users: BoxedUserStore) -> Self {
        Self {
            transport,
            users,
            config: CourierConfig::default(),
            cache: None,
            scheduler: None,
            init_logging: false,
        }
    }

    pub fn config(mut self, config: CourierConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads configuration from the default locations and installs logging.
    pub fn load_config(self) -> ConfigResult<Self> {
        self.load_config_with(ConfigLoader::new())
    }

    /// Loads configuration through `loader` and installs logging.
    pub fn load_config_with(mut self, loader: ConfigLoader) -> ConfigResult<Self> {
        self.config = loader.load()?;
        self.init_logging = true;
        Ok(self)
    }

    /// Uses `cache` instead of a fresh [`MemoryCache`].
    pub fn cache(mut self, cache: BoxedCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn scheduler(mut self, scheduler: BoxedScheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn build(self) -> Courier {
        if self.init_logging {
            logging::init_from_config(&self.config.logging);
        }

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryCache::new()) as BoxedCache);

        let plugins = Arc::new(PluginRegistry::new());
        let handlers = Arc::new(HandlerRegistry::new(Arc::clone(&plugins)));
        let banned = Arc::new(
            BannedUserFilter::new(Arc::clone(&cache), Arc::clone(&self.users))
                .with_key(self.config.cache.banned_ids_key.clone())
                .with_ttl(self.config.cache.banned_ids_ttl()),
        );
        let dispatcher = Dispatcher::new(
            Arc::clone(&plugins),
            Arc::clone(&handlers),
            Arc::clone(&banned),
        );
        let poller = Arc::new(Poller::from_config(
            Arc::clone(&self.transport),
            Arc::clone(&cache),
            dispatcher.clone(),
            &self.config.polling,
        ));

        info!(
            job = %self.config.polling.job_name,
            scheduler = self.scheduler.is_some(),
            "Courier initialized"
        );

        Courier {
            config: self.config,
            transport: self.transport,
            users: self.users,
            cache,
            scheduler: self.scheduler,
            plugins,
            handlers,
            banned,
            dispatcher,
            poller,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginSettings;
    use crate::poller::PollStats;
    use crate::testing::{MemoryStore, RecordingScheduler, ScriptedTransport, text_update};
    use courier_core::{BoxError, CacheService, Trigger};
    use courier_framework::{
        CommandHandler, DropReason, INTERNAL_PRIORITY, MessageHandler, PluginError,
    };
    use std::time::Duration;

    fn courier_with(
        store: MemoryStore,
        config: CourierConfig,
    ) -> (Courier, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::default());
        let courier = Courier::builder(transport.clone(), Arc::new(store))
            .config(config)
            .build();
        (courier, transport)
    }

    fn courier() -> (Courier, Arc<ScriptedTransport>) {
        courier_with(MemoryStore::default(), CourierConfig::default())
    }

    fn greeting() -> CommandHandler {
        CommandHandler::new("start", |ctx| async move {
            ctx.reply("Welcome!").await?;
            Ok::<(), BoxError>(())
        })
    }

    #[tokio::test]
    async fn test_process_update_replies() {
        let (courier, transport) = courier();
        courier.add_handler(greeting(), INTERNAL_PRIORITY, None);

        let outcome = courier
            .process_update(text_update(1, 77, "/start"))
            .await
            .unwrap();

        assert!(outcome.is_consumed());
        assert_eq!(
            transport.sent(),
            vec![(77, "Welcome!".to_string(), ParseMode::Plain)]
        );
    }

    #[tokio::test]
    async fn test_plugin_settings_from_config() {
        let mut config = CourierConfig::default();
        config
            .plugins
            .insert("Chatter".into(), PluginSettings { enabled: false });
        let (courier, transport) = courier_with(MemoryStore::default(), config);

        courier.add_plugin(Plugin::new("Chatter", "chatter"));
        courier.add_handler(
            MessageHandler::new(|ctx| async move {
                ctx.reply("chat").await?;
                Ok::<(), BoxError>(())
            }),
            10,
            Some("Chatter"),
        );

        let outcome = courier.process_update(text_update(1, 5, "hey")).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Dropped(DropReason::NoMatch));

        assert!(courier.enable_plugin("Chatter", true));
        courier.process_update(text_update(2, 5, "hey")).await.unwrap();
        assert_eq!(transport.sent().len(), 1);
        assert!(!courier.enable_plugin("Ghost", true));
    }

    #[tokio::test]
    async fn test_add_plugin_any() {
        let (courier, _) = courier();

        let err = courier.add_plugin_any(Box::new(42_u32)).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Plugin(PluginError::TypeMismatch { .. })
        ));

        courier
            .add_plugin_any(Box::new(Plugin::new("Weather", "weather")))
            .unwrap();
        assert_eq!(
            courier.plugin_definition("Weather").unwrap().modspec(),
            "weather"
        );
        assert!(courier.plugin_definition("Missing").is_none());
    }

    #[tokio::test]
    async fn test_commands_listing() {
        let (courier, _) = courier();
        courier.add_plugin(Plugin::new("Weather", "weather"));
        courier.add_handler(greeting(), INTERNAL_PRIORITY, None);
        courier.add_handler(
            CommandHandler::new("forecast", |_| async { Ok(()) }).module("weather::commands"),
            50,
            None,
        );

        let names = |listing: Vec<(String, Arc<HandlerEntry>)>| -> Vec<String> {
            listing.into_iter().map(|(name, _)| name).collect()
        };
        let all = names(courier.commands(false));
        let external = names(courier.commands(true));
        assert_eq!(all, vec!["start", "forecast"]);
        assert_eq!(external, vec!["forecast"]);
    }

    #[tokio::test]
    async fn test_notify_owners_continues_after_failure() {
        let store = MemoryStore::default()
            .with_user(1, OWNER_ROLE)
            .with_user(2, OWNER_ROLE)
            .with_user(3, "user")
            .with_user(4, OWNER_ROLE);
        let (courier, transport) = courier_with(store, CourierConfig::default());
        transport.fail_sends_to(2);

        let delivered = courier
            .notify_owners("*deploy done*", ParseMode::Markdown)
            .await
            .unwrap();

        assert_eq!(delivered, 2);
        let recipients: Vec<_> = transport.sent().into_iter().map(|(id, _, _)| id).collect();
        assert_eq!(recipients, vec![1, 4]);
        assert!(transport
            .sent()
            .iter()
            .all(|(_, _, mode)| *mode == ParseMode::Markdown));
    }

    #[tokio::test]
    async fn test_scheduler_unavailable() {
        let (courier, _) = courier();

        assert!(matches!(
            courier.get_jobs().await,
            Err(RuntimeError::SchedulerUnavailable)
        ));
        assert!(matches!(
            courier.pause_job("fetch_messages").await,
            Err(RuntimeError::SchedulerUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_scheduler_delegation() {
        let transport = Arc::new(ScriptedTransport::default());
        let courier = Courier::builder(transport, Arc::new(MemoryStore::default()))
            .scheduler(Arc::new(RecordingScheduler::default()))
            .build();

        let job = JobSpec::new("digest", Trigger::Interval(Duration::from_secs(60)), || async {});
        let info = courier.add_job(job).await.unwrap();
        assert_eq!(info.id, "digest");

        courier.pause_job("digest").await.unwrap();
        assert!(courier.get_job("digest").await.unwrap().unwrap().paused);
        courier.resume_job("digest").await.unwrap();
        assert!(!courier.get_job("digest").await.unwrap().unwrap().paused);

        courier.remove_job("digest").await.unwrap();
        assert!(courier.get_jobs().await.unwrap().is_empty());
        assert!(matches!(
            courier.remove_job("digest").await,
            Err(RuntimeError::Scheduler(_))
        ));
    }

    #[tokio::test]
    async fn test_banned_settings_from_config() {
        let mut config = CourierConfig::default();
        config.cache.banned_ids_key = "bans".into();
        let (courier, transport) = courier_with(MemoryStore::with_banned([9]), config);
        courier.add_handler(greeting(), INTERNAL_PRIORITY, None);

        let outcome = courier
            .process_update(text_update(1, 9, "/start"))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Dropped(DropReason::Banned));
        assert!(transport.sent().is_empty());
        assert_eq!(
            courier.cache().get("bans", false).await.unwrap(),
            Some(serde_json::json!([9]))
        );
    }

    #[tokio::test]
    async fn test_poll_once_uses_config() {
        let mut config = CourierConfig::default();
        config.polling.job_name = "poll".into();
        config.polling.offset_key = "offset".into();
        let (courier, transport) = courier_with(MemoryStore::default(), config);
        courier.add_handler(greeting(), INTERNAL_PRIORITY, None);
        transport.push_updates(vec![text_update(3, 1, "/start")]);

        let outcome = courier.poll_once().await.unwrap();

        assert_eq!(
            outcome,
            PollOutcome::Completed(PollStats {
                fetched: 1,
                consumed: 1,
                offset: Some(4),
                ..Default::default()
            })
        );
        assert_eq!(
            courier.cache().get("offset", true).await.unwrap(),
            Some(serde_json::json!(4))
        );
        assert_eq!(courier.poller().lock_key(), "poll-lock");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_polls_then_stops() {
        let (courier, transport) = courier();
        courier.add_handler(greeting(), INTERNAL_PRIORITY, None);
        transport.push_updates(vec![text_update(1, 1, "/start")]);
        transport.push_updates(vec![text_update(2, 1, "/start")]);

        courier
            .run_until(tokio::time::sleep(Duration::from_millis(1500)))
            .await
            .unwrap();

        assert_eq!(transport.fetch_offsets(), vec![None, Some(2)]);
        assert_eq!(transport.sent().len(), 2);
    }
}
