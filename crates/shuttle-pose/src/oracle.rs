//! Pose oracle contract.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use shuttle_core::{Error, PoseLandmarks, Result};

/// Oracle configuration, passed through to whatever model backs the oracle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleOptions {
    /// 0 = fastest, 2 = most accurate
    pub model_complexity: u8,
    pub min_detection_confidence: f64,
    pub min_tracking_confidence: f64,
}

impl Default for OracleOptions {
    fn default() -> Self {
        Self {
            model_complexity: 1,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

impl OracleOptions {
    pub fn validate(&self) -> Result<()> {
        if self.model_complexity > 2 {
            return Err(Error::Config(format!(
                "model_complexity must be 0, 1 or 2, got {}",
                self.model_complexity
            )));
        }

        for (name, value) in [
            ("min_detection_confidence", self.min_detection_confidence),
            ("min_tracking_confidence", self.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{name} must be in [0, 1], got {value}")));
            }
        }

        Ok(())
    }
}

/// A pose-estimation instance owned by exactly one session.
///
/// Implementations are expected to be deterministic for fixed options and input.
pub trait PoseOracle: Send {
    /// Detect at most one player in the frame
    fn detect(&mut self, frame: &RgbImage) -> Result<Option<PoseLandmarks>>;

    /// Release model resources. Called once when the owning session ends or is
    /// replaced; the oracle is not used afterwards.
    fn close(&mut self) {}
}

/// Creates one oracle per session
pub trait OracleFactory: Send + Sync {
    fn create(&self, options: &OracleOptions) -> Result<Box<dyn PoseOracle>>;
}

impl<F> OracleFactory for F
where
    F: Fn(&OracleOptions) -> Result<Box<dyn PoseOracle>> + Send + Sync,
{
    fn create(&self, options: &OracleOptions) -> Result<Box<dyn PoseOracle>> {
        self(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverDetects;

    impl PoseOracle for NeverDetects {
        fn detect(&mut self, _frame: &RgbImage) -> Result<Option<PoseLandmarks>> {
            Ok(None)
        }
    }

    #[test]
    fn test_default_options_valid() {
        assert!(OracleOptions::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_complexity() {
        let options = OracleOptions {
            model_complexity: 3,
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_closure_factory() {
        let factory = |_: &OracleOptions| -> Result<Box<dyn PoseOracle>> { Ok(Box::new(NeverDetects)) };
        let mut oracle = factory.create(&OracleOptions::default()).unwrap();
        assert!(oracle.detect(&RgbImage::new(2, 2)).unwrap().is_none());
    }
}
