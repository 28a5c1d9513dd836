//! Typed adapters, one per remote command namespace
//!
//! Every adapter is a thin view over a [`Remote`](crate::Remote): it builds
//! the command, classifies failures through the sentinel table and parses
//! the report the command prints.

pub mod apps;
pub mod checks;
pub mod config;
pub mod docker_options;
pub mod domains;
pub mod git;
pub mod http_auth;
pub mod letsencrypt;
pub mod network;
pub mod nginx;
pub mod plugin;
pub mod ports;
pub mod proxy;
pub mod registry;
pub mod service;
pub mod storage;

pub use apps::{Apps, DeploySourceReport};
pub use checks::{Checks, ChecksStatus};
pub use config::Config;
pub use docker_options::{DockerOptions, Phase};
pub use domains::{DomainsReport, Domains, GlobalDomainsReport};
pub use git::{ArchiveType, Git};
pub use http_auth::{HttpAuth, HttpAuthReport};
pub use letsencrypt::Letsencrypt;
pub use network::{Network, NetworkProperty};
pub use nginx::{Nginx, NginxScope};
pub use plugin::{PluginInfo, Plugins};
pub use ports::{PortMapping, Ports};
pub use proxy::{Proxy, ProxyReport};
pub use registry::Registry;
pub use service::{ServiceKind, Services};
pub use storage::{STORAGE_ROOT, Storage, StorageMount};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::client::{ClientOptions, DokkuClient};
    use crate::testing::FakeTransport;
    use std::sync::Arc;

    pub fn client(fake: &Arc<FakeTransport>) -> DokkuClient {
        DokkuClient::new(fake.clone(), ClientOptions::default())
    }
}
