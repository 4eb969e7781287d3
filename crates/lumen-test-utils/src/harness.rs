// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end host tests.
//!
//! `TestHost` composes a real [`ApplicationHost`] on a temporary program data
//! directory, bound to an ephemeral loopback port, with a scripted probe
//! client and a fixed interface list.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lumen_config::LumenConfig;
use lumen_core::{Component, LumenError, ServiceResolver};
use lumen_host::{ApplicationHost, HostBuilder, Repository};
use lumen_network::NetworkInterfaces;
use lumen_plugin::{Factory, Module};

use crate::mock_network::{FakeInterfaces, MockProbeClient};

/// Port reported for TLS. Never bound by the front door.
const TEST_HTTPS_PORT: u16 = 18920;

/// Builder for [`TestHost`].
pub struct TestHostBuilder {
    dir: tempfile::TempDir,
    config: LumenConfig,
    modules: Vec<Arc<dyn Module>>,
    factories: Vec<(String, Factory)>,
    repositories: Vec<Arc<dyn Repository>>,
    probe: Arc<MockProbeClient>,
    interfaces: Arc<dyn NetworkInterfaces>,
    can_self_restart: bool,
}

impl TestHostBuilder {
    fn new() -> Result<Self, LumenError> {
        let dir = tempfile::TempDir::new()?;
        let mut config = LumenConfig::default();
        config.paths.program_data_path = dir.path().display().to_string();
        config.network.bind_address = "127.0.0.1".into();
        config.network.http_port = 0;
        config.network.https_port = TEST_HTTPS_PORT;
        Ok(Self {
            dir,
            config,
            modules: Vec::new(),
            factories: Vec::new(),
            repositories: Vec::new(),
            probe: Arc::new(MockProbeClient::new()),
            interfaces: Arc::new(FakeInterfaces::loopback_only()),
            can_self_restart: true,
        })
    }

    /// Edits the configuration before the host is built.
    pub fn configure(mut self, edit: impl FnOnce(&mut LumenConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    pub fn with_module(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Arc::new(module));
        self
    }

    pub fn with_factory<F>(mut self, symbol: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ServiceResolver) -> Result<Arc<dyn Component>, LumenError> + Send + Sync + 'static,
    {
        self.factories.push((symbol.into(), Arc::new(factory)));
        self
    }

    /// Registers a factory that always hands out the same instance.
    pub fn with_instance<C: Component>(self, symbol: impl Into<String>, instance: Arc<C>) -> Self {
        self.with_factory(symbol, move |_| Ok(instance.clone() as Arc<dyn Component>))
    }

    pub fn with_repository(mut self, repository: Arc<dyn Repository>) -> Self {
        self.repositories.push(repository);
        self
    }

    pub fn with_interfaces(mut self, interfaces: impl NetworkInterfaces + 'static) -> Self {
        self.interfaces = Arc::new(interfaces);
        self
    }

    pub fn allow_self_restart(mut self, allowed: bool) -> Self {
        self.can_self_restart = allowed;
        self
    }

    pub fn probe(&self) -> &Arc<MockProbeClient> {
        &self.probe
    }

    /// Writes a module manifest under `{plugins}/{folder}/` before the host
    /// starts, so it is picked up by the initial discovery pass.
    pub fn write_manifest(self, folder: &str, file_name: &str, content: &str) -> Result<Self, LumenError> {
        write_manifest(&self.config.paths.plugins_dir(), folder, file_name, content)?;
        Ok(self)
    }

    pub async fn build(self) -> Result<TestHost, LumenError> {
        let mut builder = HostBuilder::new(self.config)
            .version("0.0.0-test")
            .with_probe_client(self.probe.clone())
            .with_interfaces(self.interfaces)
            .allow_self_restart(self.can_self_restart);
        for module in self.modules {
            builder = builder.with_module(module);
        }
        for (symbol, factory) in self.factories {
            builder = builder.with_factory(symbol, move |r| factory(r));
        }
        for repository in self.repositories {
            builder = builder.with_repository(repository);
        }

        Ok(TestHost {
            host: builder.build().await?,
            probe: self.probe,
            _dir: self.dir,
        })
    }
}

/// A composed host plus the collaborators the test controls.
pub struct TestHost {
    pub host: Arc<ApplicationHost>,
    pub probe: Arc<MockProbeClient>,
    /// Kept alive for cleanup on drop.
    _dir: tempfile::TempDir,
}

impl TestHost {
    pub fn builder() -> TestHostBuilder {
        match TestHostBuilder::new() {
            Ok(builder) => builder,
            Err(e) => panic!("failed to create test host directory: {e}"),
        }
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.host.config().current().paths.plugins_dir()
    }

    /// `http://127.0.0.1:{port}` of the bound front door.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.host.transport().local_addr())
    }

    /// Drops a module manifest into the running host's plugin directory and
    /// returns the folder it was written to.
    pub fn write_manifest(&self, folder: &str, file_name: &str, content: &str) -> Result<PathBuf, LumenError> {
        write_manifest(&self.plugins_dir(), folder, file_name, content)
    }
}

fn write_manifest(plugins_dir: &Path, folder: &str, file_name: &str, content: &str) -> Result<PathBuf, LumenError> {
    let dir = plugins_dir.join(folder);
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join(file_name), content)?;
    Ok(dir)
}
