use crate::error::ClientError;
use async_trait::async_trait;
use std::sync::Arc;
use webrtc::track::track_local::TrackLocal;

pub type LocalTrack = Arc<dyn TrackLocal + Send + Sync>;

/// Camera/microphone acquisition seam. A failure here is fatal to starting
/// a session and is surfaced to the embedder for remediation (permission
/// prompt, device selection); it is never retried silently.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self) -> Result<LocalMedia, ClientError>;
}

/// Locally captured tracks, attached to every peer link at creation.
#[derive(Clone)]
pub struct LocalMedia {
    audio: Vec<LocalTrack>,
    video: Vec<LocalTrack>,
}

impl LocalMedia {
    pub fn new(audio: Vec<LocalTrack>, video: Vec<LocalTrack>) -> Self {
        Self { audio, video }
    }

    pub fn tracks(&self) -> impl Iterator<Item = &LocalTrack> {
        self.audio.iter().chain(self.video.iter())
    }
}

/// Hands over tracks the embedder has already captured, e.g. from a device
/// pipeline built with `TrackLocalStaticSample`.
pub struct StaticMediaSource {
    audio: Vec<LocalTrack>,
    video: Vec<LocalTrack>,
}

impl StaticMediaSource {
    pub fn new(audio: Vec<LocalTrack>, video: Vec<LocalTrack>) -> Self {
        Self { audio, video }
    }
}

#[async_trait]
impl MediaSource for StaticMediaSource {
    async fn acquire(&self) -> Result<LocalMedia, ClientError> {
        Ok(LocalMedia::new(self.audio.clone(), self.video.clone()))
    }
}
