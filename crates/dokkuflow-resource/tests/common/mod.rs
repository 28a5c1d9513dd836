use dokkuflow_client::testing::FakeTransport;
use dokkuflow_client::{ClientOptions, DokkuClient};
use dokkuflow_resource::{Context, Engine};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub fn client(fake: &Arc<FakeTransport>) -> Arc<DokkuClient> {
    Arc::new(DokkuClient::new(fake.clone(), ClientOptions::default()))
}

pub fn engine(fake: &Arc<FakeTransport>) -> Engine {
    Engine::new(Context::new(client(fake), CancellationToken::new()))
}

/// In-memory sink for formatted tracing output
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

#[allow(dead_code)]
impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Dispatcher writing DEBUG and above into this buffer
    pub fn dispatch(&self) -> tracing::Dispatch {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::Dispatch::new(subscriber)
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
