use crate::error::ClientError;
use async_trait::async_trait;
use huddle_core::ClientFrame;

/// Outbound half of the server channel, as seen by the orchestrator.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send(&self, frame: ClientFrame) -> Result<(), ClientError>;
}
