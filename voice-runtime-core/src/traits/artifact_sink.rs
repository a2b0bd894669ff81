use crate::models::artifact::CaptureArtifact;

/// Receives finished recordings for persistence.
///
/// The runtime never reads back from the sink.
pub trait ArtifactSink: Send + Sync {
    fn artifact_ready(&self, artifact: &CaptureArtifact);
}
