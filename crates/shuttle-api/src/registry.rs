//! Concurrent session registry.
//!
//! The map lock is only held for insert, lookup and removal. Frame processing
//! happens under the per-session lock, so independent sessions never block
//! each other and `end` waits for an in-flight frame of the same session.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use shuttle_core::{CourtRegion, Error, Result, SessionId, ThresholdOverrides};
use shuttle_heatmap::HeatmapRenderer;
use shuttle_pose::{FrameInput, OracleFactory};

use crate::config::ServiceConfig;
use crate::report::Report;
use crate::session::{FrameResult, SessionConfig, SessionContext};

pub type SharedSession = Arc<Mutex<SessionContext>>;

pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, SharedSession>>,
    factory: Arc<dyn OracleFactory>,
    config: ServiceConfig,
    renderer: HeatmapRenderer,
}

impl SessionRegistry {
    pub fn new(factory: Arc<dyn OracleFactory>, config: ServiceConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            factory,
            renderer: HeatmapRenderer::new(config.heatmap.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Create a session under `id`.
    ///
    /// An active session with the same id is closed and replaced. If the oracle
    /// cannot be created nothing is registered and any existing session is kept.
    pub fn create(&self, id: SessionId, config: SessionConfig) -> Result<()> {
        config.court.validate()?;
        let thresholds = config.resolve_thresholds(&self.config.thresholds)?;
        let oracle = self.factory.create(&self.config.oracle)?;

        let context = SessionContext::new(id, &config, thresholds, oracle);

        let displaced = self
            .sessions
            .lock()
            .insert(id, Arc::new(Mutex::new(context)));
        if let Some(displaced) = displaced {
            tracing::warn!(session = %id, "Replacing active session");
            displaced.lock().close();
        }

        tracing::info!(
            session = %id,
            handedness = ?config.settings.handedness,
            exercise = ?config.settings.exercise,
            "Session started"
        );
        Ok(())
    }

    /// Start a session under a fresh id using the service's session defaults
    pub fn start_session(
        &self,
        court: CourtRegion,
        overrides: Option<ThresholdOverrides>,
    ) -> Result<SessionId> {
        let config = SessionConfig::new(court)
            .with_settings(self.config.session.clone())
            .with_overrides(overrides.unwrap_or_default());

        let id = SessionId::new();
        self.create(id, config)?;
        Ok(id)
    }

    pub fn get(&self, id: SessionId) -> Option<SharedSession> {
        self.sessions.lock().get(&id).cloned()
    }

    pub fn process_frame(
        &self,
        id: SessionId,
        frame: FrameInput<'_>,
        timestamp: f64,
    ) -> Result<FrameResult> {
        let session = self.get(id).ok_or(Error::SessionNotFound(id))?;
        let mut session = session.lock();
        Ok(session.process_frame(frame, timestamp))
    }

    /// Finalize and remove a session, releasing its oracle
    pub fn end(&self, id: SessionId) -> Result<Report> {
        let session = self
            .sessions
            .lock()
            .remove(&id)
            .ok_or(Error::SessionNotFound(id))?;

        let mut session = session.lock();
        let report = session.finalize(&self.config.output, &self.renderer)?;

        tracing::info!(
            session = %id,
            shots = report.summary.total_shots,
            rallies = report.summary.total_rallies,
            frames = report.summary.frames_processed,
            "Session ended"
        );
        Ok(report)
    }

    /// Finalize every active session.
    ///
    /// Open rallies are flushed and artifacts written exactly as [`end`](Self::end)
    /// does. A session that fails to finalize is logged and skipped; its oracle is
    /// still released.
    pub fn close_all(&self) -> Vec<Report> {
        let sessions: Vec<_> = self.sessions.lock().drain().collect();
        let total = sessions.len();

        let mut reports = Vec::with_capacity(total);
        for (id, session) in sessions {
            let mut session = session.lock();
            match session.finalize(&self.config.output, &self.renderer) {
                Ok(report) => {
                    tracing::info!(
                        session = %id,
                        shots = report.summary.total_shots,
                        rallies = report.summary.total_rallies,
                        "Session finalized at shutdown"
                    );
                    reports.push(report);
                }
                Err(e) => {
                    tracing::warn!(session = %id, error = %e, "Failed to finalize session");
                    session.close();
                }
            }
        }

        tracing::info!(closed = total, finalized = reports.len(), "Closed all sessions");
        reports
    }

    pub fn list(&self) -> Vec<SessionId> {
        self.sessions.lock().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
