//! `proxy:*`

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::Result;
use crate::report::Report;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyReport {
    pub enabled: bool,
    /// `nginx`, `caddy`, `haproxy`, `traefik`, ...
    pub proxy_type: String,
}

pub struct Proxy<'a> {
    remote: Remote<'a>,
}

impl<'a> Proxy<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    pub async fn report(&self, app: &str) -> Result<ProxyReport> {
        let output = self
            .remote
            .run_for_app(app, Invocation::new("proxy:report").arg(app))
            .await?;
        let report = Report::parse(&output.stdout);
        Ok(ProxyReport {
            enabled: report.flag("proxy enabled"),
            proxy_type: report.value("proxy type"),
        })
    }

    pub async fn enable(&self, app: &str) -> Result<()> {
        self.remote
            .run_for_app(app, Invocation::new("proxy:enable").arg(app))
            .await?;
        Ok(())
    }

    pub async fn disable(&self, app: &str) -> Result<()> {
        self.remote
            .run_for_app(app, Invocation::new("proxy:disable").arg(app))
            .await?;
        Ok(())
    }

    pub async fn set_type(&self, app: &str, proxy_type: &str) -> Result<()> {
        self.remote
            .run_for_app(app, Invocation::new("proxy:set").arg(app).arg(proxy_type))
            .await?;
        Ok(())
    }
}
