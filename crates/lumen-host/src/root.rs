// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The composition root.
//!
//! [`HostBuilder::build`] discovers modules, evaluates the service graph,
//! loads plugins, and collects entry points. The resulting
//! [`ApplicationHost`] is the only place extension types are constructed.

use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::Router;
use lumen_config::{ConfigurationManager, LumenConfig, PathsConfig};
use lumen_core::{
    BoundTransport, Component, Deferred, Disposable, EdgeTriggeredFlag, EntryPoint, Export,
    LumenError, Plugin, ReadinessGate, ServiceResolver, SystemInfo, WebSocketListener,
};
use lumen_gateway::{
    ApiState, FrontDoorState, GatewayTransport, ServerConfig, SystemInfoSource, api_router,
    build_router,
};
use lumen_network::{
    HttpProbeClient, NetworkInterfaces, NetworkLocator, ProbeClient, SystemInterfaces,
    spawn_interface_watcher,
};
use lumen_plugin::{
    Catalog, ConcreteType, FactoryTable, LoadedPlugin, Module, ModuleOrigin, PluginCandidate,
    PluginSet, PluginStatus, load_plugin, scan_plugin_directory,
};
use parking_lot::{Mutex, RwLock};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::disposal::{DisposalReport, DisposalTracker};
use crate::graph::{ServiceGraph, Stage};
use crate::install::INSTALL_DRAIN_TIMEOUT;
use crate::orchestrator::{PhaseReport, StartupReport, run_shutdown, run_startup};
use crate::status::{Lifecycle, server_name};
use crate::system_id::SystemId;

/// A storage-backed service initialized during composition.
///
/// Repositories run their on-disk setup synchronously while the graph is
/// evaluated and are disposed after every extension.
pub trait Repository: Disposable {
    fn name(&self) -> &str;

    fn initialize(&self) -> Result<(), LumenError>;
}

struct RepositoryHandle(Arc<dyn Repository>);

impl Disposable for RepositoryHandle {
    fn dispose(&self) -> Result<(), LumenError> {
        self.0.dispose()
    }
}

struct PendingFrontDoor {
    listener: TcpListener,
    router: Router,
}

/// Info routes are built before the host exists; they look it up on request.
struct DeferredInfo(Deferred<dyn SystemInfoSource>);

#[async_trait]
impl SystemInfoSource for DeferredInfo {
    async fn system_info(&self, cancel: &CancellationToken) -> Result<SystemInfo, LumenError> {
        self.0.get()?.system_info(cancel).await
    }
}

struct HostInfo(Weak<ApplicationHost>);

#[async_trait]
impl SystemInfoSource for HostInfo {
    async fn system_info(&self, cancel: &CancellationToken) -> Result<SystemInfo, LumenError> {
        let host = self
            .0
            .upgrade()
            .ok_or_else(|| LumenError::Internal("host has been disposed".into()))?;
        host.system_info(cancel).await
    }
}

/// Extensions constructed from one batch of concrete types.
pub(crate) struct LoadedExtensions {
    pub(crate) plugins: Vec<LoadedPlugin>,
    pub(crate) entry_points: Vec<Arc<dyn EntryPoint>>,
    pub(crate) listeners: Vec<Arc<dyn WebSocketListener>>,
}

/// Configures and composes an [`ApplicationHost`].
pub struct HostBuilder {
    config: LumenConfig,
    version: String,
    modules: Vec<Arc<dyn Module>>,
    factories: Arc<FactoryTable>,
    probe_client: Option<Arc<dyn ProbeClient>>,
    interfaces: Option<Arc<dyn NetworkInterfaces>>,
    repositories: Vec<Arc<dyn Repository>>,
    can_self_restart: bool,
}

impl HostBuilder {
    pub fn new(config: LumenConfig) -> Self {
        let can_self_restart = config.server.allow_self_restart;
        Self {
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
            modules: Vec::new(),
            factories: Arc::new(FactoryTable::new()),
            probe_client: None,
            interfaces: None,
            repositories: Vec::new(),
            can_self_restart,
        }
    }

    /// Adds a built-in module. Built-in modules are discovered before any
    /// module found in the plugins directory.
    pub fn with_module(mut self, module: Arc<dyn Module>) -> Self {
        self.modules.push(module);
        self
    }

    pub fn with_factory<F>(self, symbol: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ServiceResolver) -> Result<Arc<dyn Component>, LumenError> + Send + Sync + 'static,
    {
        self.factories.register(symbol, factory);
        self
    }

    pub fn with_probe_client(mut self, client: Arc<dyn ProbeClient>) -> Self {
        self.probe_client = Some(client);
        self
    }

    pub fn with_interfaces(mut self, interfaces: Arc<dyn NetworkInterfaces>) -> Self {
        self.interfaces = Some(interfaces);
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn Repository>) -> Self {
        self.repositories.push(repository);
        self
    }

    pub fn allow_self_restart(mut self, allowed: bool) -> Self {
        self.can_self_restart = allowed;
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Composes the host and binds the front door without serving it yet.
    pub async fn build(self) -> Result<Arc<ApplicationHost>, LumenError> {
        let started = Instant::now();
        let resolver = Arc::new(ServiceResolver::new());
        let config = Arc::new(ConfigurationManager::new(self.config));
        let current = config.current();

        let discovered = scan_plugin_directory(&current.paths.plugins_dir());
        // Unreadable manifests stay unknown so a later install retries them.
        let known_modules: HashSet<PathBuf> = discovered
            .iter()
            .filter(|module| module.exported_types().is_ok())
            .filter_map(|module| match module.origin() {
                ModuleOrigin::File(path) => Some(path.clone()),
                ModuleOrigin::Builtin => None,
            })
            .collect();
        let mut modules = self.modules;
        modules.extend(discovered);
        let catalog = Catalog::discover(&modules);
        info!(
            modules = modules.len(),
            types = catalog.len(),
            "module discovery complete"
        );

        let tracker = Arc::new(DisposalTracker::new());
        let pending_restart = Arc::new(EdgeTriggeredFlag::new("pending-restart"));
        let gate = Arc::new(ReadinessGate::new());
        let listeners: Arc<RwLock<Vec<Arc<dyn WebSocketListener>>>> = Arc::default();
        let front_door: Arc<Mutex<Option<PendingFrontDoor>>> = Arc::default();

        let mut graph = ServiceGraph::new();

        // Primitives
        {
            let config = config.clone();
            graph.add(Stage::Primitives, "configuration", move |r| r.register(config));
        }
        {
            let paths = current.paths.clone();
            graph.add(Stage::Primitives, "paths", move |r| r.register(Arc::new(paths)));
        }
        graph.add(Stage::Primitives, "system-id", |r| {
            let paths = r.resolve::<PathsConfig>()?;
            r.register(Arc::new(SystemId::load_or_create(&paths.data_dir())?))
        });

        // Network
        {
            let client = self.probe_client;
            let timeout = Duration::from_secs(current.network.probe_timeout_secs);
            graph.add(Stage::Network, "probe-client", move |r| {
                let client: Arc<dyn ProbeClient> = match client {
                    Some(client) => client,
                    None => Arc::new(HttpProbeClient::with_timeout(timeout)?),
                };
                r.register::<dyn ProbeClient>(client)
            });
        }
        {
            let interfaces = self.interfaces;
            graph.add(Stage::Network, "network-interfaces", move |r| {
                let interfaces: Arc<dyn NetworkInterfaces> =
                    interfaces.unwrap_or_else(|| Arc::new(SystemInterfaces));
                r.register::<dyn NetworkInterfaces>(interfaces)
            });
        }
        {
            let handle = resolver.clone();
            let pending_restart = pending_restart.clone();
            graph.add(Stage::Network, "network-locator", move |r| {
                let locator = NetworkLocator::new(
                    r.resolve::<ConfigurationManager>()?,
                    r.resolve::<dyn ProbeClient>()?,
                    r.resolve::<dyn NetworkInterfaces>()?,
                    pending_restart,
                )
                .with_transport(Deferred::new(&handle));
                r.register(Arc::new(locator))
            });
        }

        // Repositories
        for repository in self.repositories {
            let tracker = tracker.clone();
            graph.add(Stage::Repositories, "repository", move |_| {
                let name = repository.name().to_string();
                repository.initialize()?;
                debug!(repository = %name, "repository initialized");
                tracker.track_core(name, Arc::new(RepositoryHandle(repository)));
                Ok(())
            });
        }

        // Managers
        graph.add(Stage::Managers, "plugin-set", |r| r.register(Arc::new(PluginSet::new())));
        {
            let factories = self.factories;
            graph.add(Stage::Managers, "factory-table", move |r| r.register(factories));
        }

        // Transport
        {
            let handle = resolver.clone();
            let gate = gate.clone();
            let listeners = listeners.clone();
            let front_door = front_door.clone();
            graph.add(Stage::Transport, "front-door", move |r| {
                let locator = r.resolve::<NetworkLocator>()?;
                let network = r.resolve::<ConfigurationManager>()?.current().network.clone();
                let (http_port, https_port) = network.effective_ports();
                let (listener, transport) = lumen_gateway::bind(&ServerConfig {
                    host: network.bind_address.clone(),
                    http_port,
                    https_port,
                    url_prefixes: locator.url_prefixes(),
                })?;
                let transport = Arc::new(transport);
                r.register::<dyn BoundTransport>(transport.clone())?;
                r.register(transport)?;

                let api = api_router(ApiState {
                    product_name: locator.product_name().to_string(),
                    info: Arc::new(DeferredInfo(Deferred::new(&handle))),
                });
                let router = build_router(FrontDoorState {
                    gate,
                    listeners: Arc::new(move || listeners.read().clone()),
                    api,
                });
                *front_door.lock() = Some(PendingFrontDoor { listener, router });
                Ok(())
            });
        }

        if let Err(e) = graph.evaluate(&resolver) {
            tracker.dispose_all();
            resolver.clear();
            return Err(e);
        }

        let host = Arc::new(ApplicationHost {
            version: self.version,
            config: resolver.resolve()?,
            locator: resolver.resolve()?,
            plugins: resolver.resolve()?,
            factories: resolver.resolve()?,
            system_id: resolver.resolve()?,
            transport: resolver.resolve()?,
            resolver: resolver.clone(),
            catalog: RwLock::new(catalog),
            tracker,
            lifecycle: Lifecycle::new(self.can_self_restart, pending_restart),
            gate,
            entry_points: RwLock::new(Vec::new()),
            listeners,
            front_door: Mutex::new(front_door.lock().take()),
            known_modules: Mutex::new(known_modules),
            background: Mutex::new(Vec::new()),
            installs: TaskTracker::new(),
            startup_begun: AtomicBool::new(false),
            entry_points_stopped: AtomicBool::new(false),
        });
        resolver.register::<dyn SystemInfoSource>(Arc::new(HostInfo(Arc::downgrade(&host))))?;

        let types = host.catalog.read().concrete_types().to_vec();
        let loaded = host.load_extensions(&types);
        host.entry_points.write().extend(loaded.entry_points);

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            services = resolver.len(),
            plugins = host.plugins.len(),
            entry_points = host.entry_points.read().len(),
            "host composed"
        );
        Ok(host)
    }
}

/// The running host: singletons, extensions, and lifecycle.
pub struct ApplicationHost {
    pub(crate) version: String,
    pub(crate) resolver: Arc<ServiceResolver>,
    pub(crate) config: Arc<ConfigurationManager>,
    pub(crate) locator: Arc<NetworkLocator>,
    pub(crate) plugins: Arc<PluginSet>,
    pub(crate) factories: Arc<FactoryTable>,
    pub(crate) system_id: Arc<SystemId>,
    pub(crate) transport: Arc<GatewayTransport>,
    pub(crate) catalog: RwLock<Catalog>,
    pub(crate) tracker: Arc<DisposalTracker>,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) gate: Arc<ReadinessGate>,
    pub(crate) entry_points: RwLock<Vec<Arc<dyn EntryPoint>>>,
    pub(crate) listeners: Arc<RwLock<Vec<Arc<dyn WebSocketListener>>>>,
    front_door: Mutex<Option<PendingFrontDoor>>,
    pub(crate) known_modules: Mutex<HashSet<PathBuf>>,
    background: Mutex<Vec<JoinHandle<()>>>,
    pub(crate) installs: TaskTracker,
    /// Set under the `entry_points` write lock when startup takes its
    /// snapshot. Entry points added before that join the startup pass.
    pub(crate) startup_begun: AtomicBool,
    /// Set under the `entry_points` write lock when shutdown takes its
    /// snapshot.
    pub(crate) entry_points_stopped: AtomicBool,
}

impl ApplicationHost {
    /// Returns the singleton registered for `T`. Never constructs.
    pub fn resolve<T>(&self) -> Result<Arc<T>, LumenError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolver.resolve::<T>()
    }

    /// Runs the factory behind `concrete`'s constructor symbol.
    pub fn create_instance(&self, concrete: &ConcreteType) -> Result<Arc<dyn Component>, LumenError> {
        let factory = self
            .factories
            .get(concrete.constructor())
            .ok_or_else(|| LumenError::Construction {
                type_name: concrete.name().to_string(),
                message: format!("no factory registered for `{}`", concrete.constructor()),
            })?;
        match catch_unwind(AssertUnwindSafe(|| factory(self.resolver.as_ref()))) {
            Ok(result) => result,
            Err(_) => Err(LumenError::Construction {
                type_name: concrete.name().to_string(),
                message: "factory panicked".into(),
            }),
        }
    }

    /// Like [`Self::create_instance`], but logs the failure and returns `None`.
    pub fn create_instance_safe(&self, concrete: &ConcreteType) -> Option<Arc<dyn Component>> {
        match self.create_instance(concrete) {
            Ok(component) => Some(component),
            Err(e) => {
                error!(
                    type_name = concrete.name(),
                    module = concrete.module().name(),
                    error = %e,
                    "error creating extension instance"
                );
                None
            }
        }
    }

    /// Constructs every cataloged implementer of `T`.
    ///
    /// With `manage_lifetime`, disposable instances are released when the host
    /// is disposed.
    pub fn get_exports<T>(&self, manage_lifetime: bool) -> Vec<Arc<T>>
    where
        T: Export + ?Sized,
    {
        let types = self.catalog.read().get_exports_of(&T::capability());
        self.construct_exports::<T>(&types, manage_lifetime)
            .into_iter()
            .map(|(_, export)| export)
            .collect()
    }

    fn construct_exports<T>(
        &self,
        types: &[ConcreteType],
        manage_lifetime: bool,
    ) -> Vec<(ConcreteType, Arc<T>)>
    where
        T: Export + ?Sized,
    {
        let capability = T::capability();
        types
            .iter()
            .filter(|concrete| concrete.implements(&capability))
            .filter_map(|concrete| {
                let component = self.create_instance_safe(concrete)?;
                if manage_lifetime && let Some(disposable) = component.clone().as_disposable() {
                    self.tracker.track_extension(concrete.name(), disposable);
                }
                match T::from_component(component) {
                    Some(export) => Some((concrete.clone(), export)),
                    None => {
                        warn!(
                            type_name = concrete.name(),
                            %capability,
                            "type declares a capability it does not implement"
                        );
                        None
                    }
                }
            })
            .collect()
    }

    /// Loads plugins, entry points, and socket listeners from `types`.
    ///
    /// Plugins disabled by configuration join the set with
    /// [`PluginStatus::Disabled`]; nothing else from their module is built.
    pub(crate) fn load_extensions(&self, types: &[ConcreteType]) -> LoadedExtensions {
        let config = self.config.current();
        let plugins_dir = config.paths.plugins_dir();

        let plugins: Vec<LoadedPlugin> = self
            .construct_exports::<dyn Plugin>(types, true)
            .into_iter()
            .filter_map(|(concrete, instance)| {
                load_plugin(&PluginCandidate { concrete, instance }, &plugins_dir)
            })
            .map(|mut plugin| {
                if !config.plugin_enabled(&plugin.name) {
                    info!(plugin = %plugin.name, "plugin disabled by configuration");
                    plugin.status = PluginStatus::Disabled;
                }
                plugin
            })
            .collect();

        let disabled: HashSet<String> = plugins
            .iter()
            .filter(|p| p.status == PluginStatus::Disabled)
            .map(|p| p.module_name.clone())
            .chain(self.plugins.disabled_modules())
            .collect();
        let active: Vec<ConcreteType> = types
            .iter()
            .filter(|t| !disabled.contains(t.module().name()))
            .cloned()
            .collect();

        let entry_points: Vec<Arc<dyn EntryPoint>> = self
            .construct_exports::<dyn EntryPoint>(&active, true)
            .into_iter()
            .map(|(_, entry)| entry)
            .collect();
        let listeners: Vec<Arc<dyn WebSocketListener>> = self
            .construct_exports::<dyn WebSocketListener>(&active, true)
            .into_iter()
            .map(|(_, listener)| listener)
            .collect();

        self.plugins.extend(plugins.clone());
        self.listeners.write().extend(listeners.iter().cloned());

        LoadedExtensions {
            plugins,
            entry_points,
            listeners,
        }
    }

    /// Starts serving the front door. Can be called once.
    pub fn serve(&self) -> Result<JoinHandle<Result<(), LumenError>>, LumenError> {
        let PendingFrontDoor { listener, router } = self
            .front_door
            .lock()
            .take()
            .ok_or_else(|| LumenError::Internal("front door is already serving".into()))?;
        Ok(tokio::spawn(lumen_gateway::serve(
            listener,
            router,
            self.lifecycle.lifetime(),
        )))
    }

    /// Starts the background watchers, then runs both startup phases.
    ///
    /// Only the first call does anything; later calls return empty reports.
    pub async fn run_startup_tasks(self: &Arc<Self>) -> StartupReport {
        let entries = {
            let entry_points = self.entry_points.write();
            if self.startup_begun.swap(true, Ordering::AcqRel) {
                warn!("startup tasks already ran");
                None
            } else {
                Some(entry_points.clone())
            }
        };
        let Some(entries) = entries else {
            return run_startup(&[], &self.gate).await;
        };

        let lifetime = self.lifecycle.lifetime();
        let poll = Duration::from_secs(self.config.current().network.interface_poll_secs.max(1));
        {
            let mut background = self.background.lock();
            background.push(self.spawn_config_listener(lifetime.clone()));
            background.push(spawn_interface_watcher(
                self.locator.clone(),
                poll,
                lifetime,
            ));
        }

        let report = run_startup(&entries, &self.gate).await;
        info!(
            pre = report.pre.outcomes.len(),
            post = report.post.outcomes.len(),
            failed = report.pre.failures().len() + report.post.failures().len(),
            "startup complete"
        );
        report
    }

    fn spawn_config_listener(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let mut changes = self.config.subscribe();
        let locator = self.locator.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    change = changes.recv() => match change {
                        Ok(change) => {
                            locator.on_configuration_changed(&change.current);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "configuration listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!("configuration listener stopped");
        })
    }

    /// Runs every entry point's shutdown hook once.
    ///
    /// Installs still in flight are given [`INSTALL_DRAIN_TIMEOUT`] to finish
    /// first, so the entry points they add are shut down too.
    pub async fn shutdown(&self) -> Option<PhaseReport> {
        self.lifecycle.begin_shutdown();
        self.installs.close();
        if tokio::time::timeout(INSTALL_DRAIN_TIMEOUT, self.installs.wait())
            .await
            .is_err()
        {
            warn!(pending = self.installs.len(), "plugin installs still running at shutdown");
        }

        let entries = {
            let entry_points = self.entry_points.write();
            if self.entry_points_stopped.swap(true, Ordering::AcqRel) {
                return None;
            }
            entry_points.clone()
        };
        info!("shutting down entry points");
        Some(run_shutdown(&entries).await)
    }

    /// Releases extensions, then repositories, then the resolver. Runs once.
    pub fn dispose(&self) -> Option<DisposalReport> {
        let report = self.tracker.dispose_all()?;
        for handle in self.background.lock().drain(..) {
            handle.abort();
        }
        self.entry_points.write().clear();
        self.listeners.write().clear();
        self.front_door.lock().take();
        self.resolver.clear();
        info!("host disposed");
        Some(report)
    }

    pub async fn system_info(&self, cancel: &CancellationToken) -> Result<SystemInfo, LumenError> {
        let config = self.config.current();
        let (http_port, https_port) = config.network.effective_ports();
        let local_address = self.locator.local_api_url(cancel).await?;
        let wan_address = self.locator.wan_api_url(cancel).await?;

        Ok(SystemInfo {
            version: self.version.clone(),
            product_name: self.locator.product_name().to_string(),
            server_name: server_name(&config),
            id: self.system_id.to_string(),
            operating_system: std::env::consts::OS.to_string(),
            system_architecture: std::env::consts::ARCH.to_string(),
            local_address,
            wan_address,
            http_server_port_number: http_port,
            https_port_number: https_port,
            supports_https: self.locator.supports_https(),
            has_pending_restart: self.lifecycle.has_pending_restart(),
            is_shutting_down: self.lifecycle.is_shutting_down(),
            can_self_restart: self.lifecycle.can_self_restart(),
            has_update_available: self.lifecycle.has_update_available(),
            program_data_path: config.paths.program_data_path.clone(),
            plugins_path: config.paths.plugins_dir().display().to_string(),
        })
    }

    pub fn request_restart(&self) -> Result<bool, LumenError> {
        self.lifecycle.request_restart()
    }

    pub fn notify_pending_restart(&self) -> bool {
        self.lifecycle.notify_pending_restart()
    }

    pub fn notify_update_available(&self) -> bool {
        self.lifecycle.notify_update_available()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn config(&self) -> &Arc<ConfigurationManager> {
        &self.config
    }

    pub fn locator(&self) -> &Arc<NetworkLocator> {
        &self.locator
    }

    pub fn plugins(&self) -> &Arc<PluginSet> {
        &self.plugins
    }

    pub fn transport(&self) -> &GatewayTransport {
        &self.transport
    }

    pub fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    /// Snapshot of the catalog, including hot-installed types.
    pub fn catalog(&self) -> Catalog {
        self.catalog.read().clone()
    }

    pub fn entry_points(&self) -> Vec<Arc<dyn EntryPoint>> {
        self.entry_points.read().clone()
    }

    pub fn websocket_listeners(&self) -> Vec<Arc<dyn WebSocketListener>> {
        self.listeners.read().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.tracker.is_disposed()
    }
}

impl std::fmt::Debug for ApplicationHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationHost")
            .field("version", &self.version)
            .field("system_id", &self.system_id.to_string())
            .field("local_addr", &self.transport.local_addr())
            .field("plugins", &self.plugins.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
