//! `config:*`
//!
//! Values always cross the command line base64-encoded (`--encoded`).

use crate::client::Remote;
use crate::command::Invocation;
use crate::error::{ClientError, Result};
use crate::report::list_lines;
use crate::secret::encode_value;

pub struct Config<'a> {
    remote: Remote<'a>,
}

impl<'a> Config<'a> {
    pub fn new(remote: Remote<'a>) -> Self {
        Self { remote }
    }

    /// Current value; an unset key or an empty value yields `None`
    pub async fn get(&self, app: &str, key: &str) -> Result<Option<String>> {
        let invocation = Invocation::new("config:get").arg(app).arg(key);
        match self.remote.run_for_app(app, invocation).await {
            Ok(output) if output.stdout.is_empty() => Ok(None),
            Ok(output) => Ok(Some(output.stdout)),
            // config:get exits 1 silently for unset keys
            Err(ClientError::Remote { status: 1, output }) if output.trim().is_empty() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn set(&self, app: &str, key: &str, value: &str, no_restart: bool) -> Result<()> {
        let encoded = encode_value(value);
        let invocation = Invocation::new("config:set")
            .arg("--encoded")
            .arg_if(no_restart, "--no-restart")
            .arg(app)
            .arg(format!("{}={}", key, encoded))
            .redact(encoded)
            .redact(value);
        self.remote.run_for_app(app, invocation).await?;
        Ok(())
    }

    pub async fn unset(&self, app: &str, key: &str, no_restart: bool) -> Result<()> {
        let invocation = Invocation::new("config:unset")
            .arg_if(no_restart, "--no-restart")
            .arg(app)
            .arg(key);
        self.remote.run_for_app(app, invocation).await?;
        Ok(())
    }

    pub async fn keys(&self, app: &str) -> Result<Vec<String>> {
        let output = self
            .remote
            .run_for_app(app, Invocation::new("config:keys").arg(app))
            .await?;
        Ok(list_lines(&output.stdout))
    }
}
