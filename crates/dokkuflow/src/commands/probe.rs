use crate::GlobalArgs;
use crate::session::{self, Session};
use anyhow::Context;
use colored::Colorize;

pub async fn handle(args: &GlobalArgs) -> anyhow::Result<bool> {
    let session = Session::load(args)?;
    let client = session.client()?;
    let cancel = session::cancel_on_ctrl_c();

    let caps = client
        .capabilities(&cancel)
        .await
        .context("failed to probe the Dokku host")?;

    println!("Dokku {}", caps.version().to_string().cyan().bold());
    let tested = if caps.is_tested() {
        "yes".green()
    } else {
        "no".yellow()
    };
    println!("  tested version: {}", tested);
    let ports = if caps.has_ports_namespace_v2() {
        "ports:*"
    } else {
        "proxy:ports-*"
    };
    println!("  port commands:  {}", ports);
    Ok(true)
}
