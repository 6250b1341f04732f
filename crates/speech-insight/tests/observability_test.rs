//! Global subscriber initialization. Lives in its own test binary because the
//! subscriber can only be installed once per process.

use speech_insight::observability::{self, LogTarget, ObservabilityConfig};
use tracing::Level;

#[test]
fn test_file_target_receives_crate_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.log");

    observability::init(ObservabilityConfig {
        level: Level::INFO,
        target: LogTarget::File(path.to_string_lossy().into_owned()),
    })
    .unwrap();

    tracing::info!(target: "speech_insight::pipeline", job = 7, "Pipeline completed");
    tracing::debug!(target: "speech_insight::pipeline", "below the configured level");

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("Pipeline completed"));
    assert!(contents.contains("job=7"));
    assert!(!contents.contains("below the configured level"));

    // A second installation is refused rather than silently replacing the first
    assert!(observability::init(ObservabilityConfig::default()).is_err());
}
