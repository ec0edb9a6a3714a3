//! Async facade over the registry.
//!
//! Frame processing and session teardown are CPU- and file-bound, so they run
//! on tokio's blocking pool instead of the async worker threads.

use std::sync::Arc;

use shuttle_core::{CourtRegion, Error, Result, SessionId, ThresholdOverrides};
use shuttle_pose::FrameInput;

use crate::registry::SessionRegistry;
use crate::report::Report;
use crate::session::{FrameResult, SessionConfig};

#[derive(Clone)]
pub struct SessionService {
    registry: Arc<SessionRegistry>,
}

impl SessionService {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    async fn blocking<T, F>(&self, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&SessionRegistry) -> Result<T> + Send + 'static,
    {
        let registry = self.registry.clone();
        tokio::task::spawn_blocking(move || task(&registry))
            .await
            .map_err(|e| Error::Worker(e.to_string()))?
    }

    pub async fn start_session(
        &self,
        court: CourtRegion,
        overrides: Option<ThresholdOverrides>,
    ) -> Result<SessionId> {
        self.blocking(move |registry| registry.start_session(court, overrides))
            .await
    }

    pub async fn create(&self, id: SessionId, config: SessionConfig) -> Result<()> {
        self.blocking(move |registry| registry.create(id, config)).await
    }

    /// Process one encoded (PNG/JPEG) frame
    pub async fn process_frame(
        &self,
        id: SessionId,
        frame: Vec<u8>,
        timestamp: f64,
    ) -> Result<FrameResult> {
        self.blocking(move |registry| {
            registry.process_frame(id, FrameInput::Encoded(&frame), timestamp)
        })
        .await
    }

    /// Process one packed RGB frame
    pub async fn process_rgb(
        &self,
        id: SessionId,
        width: u32,
        height: u32,
        data: Vec<u8>,
        timestamp: f64,
    ) -> Result<FrameResult> {
        self.blocking(move |registry| {
            let frame = FrameInput::Rgb {
                width,
                height,
                data: &data,
            };
            registry.process_frame(id, frame, timestamp)
        })
        .await
    }

    pub async fn end_session(&self, id: SessionId) -> Result<Report> {
        self.blocking(move |registry| registry.end(id)).await
    }

    /// Finalize every active session, returning the reports that were produced
    pub async fn close_all(&self) -> Result<Vec<Report>> {
        self.blocking(|registry| Ok(registry.close_all())).await
    }

    pub fn active_sessions(&self) -> Vec<SessionId> {
        self.registry.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use shuttle_core::{Joint, JointSample, PixelPoint, PoseLandmarks};
    use shuttle_pose::ReplayFactory;

    fn court() -> CourtRegion {
        CourtRegion::new(
            PixelPoint::new(0, 0),
            PixelPoint::new(100, 0),
            PixelPoint::new(0, 100),
            PixelPoint::new(100, 100),
            "green",
        )
        .unwrap()
    }

    fn service(factory: Arc<ReplayFactory>) -> SessionService {
        let mut config = ServiceConfig::default();
        config.output.heatmap = false;
        config.output.directory =
            std::env::temp_dir().join(format!("shuttle-service-{}", uuid::Uuid::new_v4()));
        SessionService::new(Arc::new(SessionRegistry::new(factory, config)))
    }

    #[tokio::test]
    async fn test_concurrent_sessions_are_isolated() {
        let pose = PoseLandmarks::new([JointSample::new(0.25, 0.5, 0.9); Joint::COUNT]);
        let factory = Arc::new(ReplayFactory::new(vec![Some(pose); 5]));
        let service = service(factory.clone());

        let a = service.start_session(court(), None).await.unwrap();
        let b = service.start_session(court(), None).await.unwrap();
        assert_eq!(service.active_sessions().len(), 2);

        let rgb = vec![0u8; 200 * 100 * 3];
        let (ra, rb) = tokio::join!(
            service.process_rgb(a, 200, 100, rgb.clone(), 0.0),
            service.process_rgb(b, 200, 100, rgb.clone(), 0.0),
        );
        assert!(ra.unwrap().player_detected);
        assert!(rb.unwrap().player_detected);

        for i in 1..3 {
            service.process_rgb(a, 200, 100, rgb.clone(), i as f64 / 30.0).await.unwrap();
        }

        let report_a = service.end_session(a).await.unwrap();
        assert_eq!(report_a.summary.frames_processed, 3);
        assert!(service.end_session(a).await.is_err());

        let remaining = service.close_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].session_id, b);
        assert_eq!(factory.live_instances(), 0);
    }

    #[tokio::test]
    async fn test_bad_raw_frame_is_not_fatal() {
        let service = service(Arc::new(ReplayFactory::new(Vec::new())));
        let id = service.start_session(court(), None).await.unwrap();

        let result = service.process_rgb(id, 10, 10, vec![0u8; 3], 0.0).await.unwrap();
        assert!(!result.player_detected);
        assert_eq!(result.frame_index, 0);
    }
}
