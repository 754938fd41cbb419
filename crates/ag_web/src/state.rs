use ag_core::AppConfig;
use ag_inference::Classifier;
use tokio::sync::Mutex;

pub struct AppState {
    pub config: AppConfig,
    pub classifier: Classifier,
    /// Held for the length of a run; the state files are not safe to share.
    pub run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: AppConfig, classifier: Classifier) -> Self {
        Self {
            config,
            classifier,
            run_lock: Mutex::new(()),
        }
    }
}
