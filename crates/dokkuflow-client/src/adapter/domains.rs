//! `domains:*`

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::Result;
use crate::report::Report;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainsReport {
    pub app_enabled: bool,
    pub app_vhosts: Vec<String>,
    pub global_enabled: bool,
    pub global_vhosts: Vec<String>,
}

impl DomainsReport {
    pub fn from_report(report: &Report) -> Self {
        Self {
            app_enabled: report.flag("domains app enabled"),
            app_vhosts: report.list("domains app vhosts"),
            global_enabled: report.flag("domains global enabled"),
            global_vhosts: report.list("domains global vhosts"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalDomainsReport {
    pub enabled: bool,
    pub vhosts: Vec<String>,
}

pub struct Domains<'a> {
    remote: Remote<'a>,
}

impl<'a> Domains<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    pub async fn report(&self, app: &str) -> Result<DomainsReport> {
        let output = self
            .remote
            .run_for_app(app, Invocation::new("domains:report").arg(app))
            .await?;
        Ok(DomainsReport::from_report(&Report::parse(&output.stdout)))
    }

    pub async fn global_report(&self) -> Result<GlobalDomainsReport> {
        let output = self
            .remote
            .run(Invocation::new("domains:report").arg("--global"))
            .await?;
        let report = Report::parse(&output.stdout);
        Ok(GlobalDomainsReport {
            enabled: report.flag("domains global enabled"),
            vhosts: report.list("domains global vhosts"),
        })
    }

    pub async fn add(&self, app: &str, domain: &str) -> Result<()> {
        self.remote
            .run_for_app(app, Invocation::new("domains:add").arg(app).arg(domain))
            .await?;
        Ok(())
    }

    pub async fn remove(&self, app: &str, domain: &str) -> Result<()> {
        self.remote
            .run_for_app(app, Invocation::new("domains:remove").arg(app).arg(domain))
            .await?;
        Ok(())
    }

    pub async fn add_global(&self, domain: &str) -> Result<()> {
        self.remote
            .run(Invocation::new("domains:add-global").arg(domain))
            .await?;
        Ok(())
    }

    pub async fn remove_global(&self, domain: &str) -> Result<()> {
        self.remote
            .run(Invocation::new("domains:remove-global").arg(domain))
            .await?;
        Ok(())
    }

    pub async fn enable(&self, app: &str) -> Result<()> {
        self.remote
            .run_for_app(app, Invocation::new("domains:enable").arg(app))
            .await?;
        Ok(())
    }

    pub async fn disable(&self, app: &str) -> Result<()> {
        self.remote
            .run_for_app(app, Invocation::new("domains:disable").arg(app))
            .await?;
        Ok(())
    }
}
