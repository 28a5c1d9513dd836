//! SSH transport for dokkuflow
//!
//! Executes command strings against the Dokku command shell of a remote
//! host. The transport knows nothing about Dokku itself: it runs one
//! command, captures stdout/stderr and the exit status, and reports
//! connection problems as errors.
//!
//! # Requirements
//!
//! - The OpenSSH client (`ssh`) must be installed
//! - The remote user (normally `dokku`) must accept the configured key
//!
//! # Example
//!
//! ```ignore
//! use dokkuflow_ssh::{SshConfig, SshTransport, Transport};
//!
//! let transport = SshTransport::new(SshConfig::new("dokku.example.com"))?;
//! let output = transport.exec("apps:list").await?;
//! println!("{}", output.stdout);
//! ```

pub mod error;
pub mod key;
pub mod process;
pub mod transport;

pub use error::{Result, SshError};
pub use key::{HostKeyPolicy, KeySource, SshConfig};
pub use process::SshTransport;
pub use transport::{CommandOutput, InteractiveSession, Transport};
