//! Load-once detector handle.
//!
//! The handle owns a loader and runs it lazily on first use. Whatever the
//! loader returns, a ready detector or a [`LoadError`], is kept for the
//! lifetime of the handle: later callers get the same detector or the same
//! error, and the loader never runs a second time.

use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use tracing::{error, info};

use super::{Detector, DetectorSource, RenamedDetector};
use crate::error::LoadError;
use crate::ir::ClassNames;

type Loader = Box<dyn Fn() -> Result<Box<dyn Detector>, LoadError> + Send + Sync>;

const UNINITIALIZED: u8 = 0;
const LOADING: u8 = 1;
const READY: u8 = 2;
const FAILED: u8 = 3;

/// Lifecycle of a [`DetectorHandle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleState {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

/// Process-wide, lazily loaded detector.
///
/// Safe to share between threads. Concurrent first callers block on a single
/// load attempt; once loaded, the detector is only ever read.
pub struct DetectorHandle {
    loader: Loader,
    loaded: OnceLock<Result<Box<dyn Detector>, LoadError>>,
    state: AtomicU8,
    load_attempts: AtomicUsize,
}

impl DetectorHandle {
    /// Creates a handle around an arbitrary loader.
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Detector>, LoadError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            loaded: OnceLock::new(),
            state: AtomicU8::new(UNINITIALIZED),
            load_attempts: AtomicUsize::new(0),
        }
    }

    /// Creates a handle that loads from `source`, optionally replacing the
    /// model's class names.
    pub fn from_source(source: DetectorSource, names: Option<ClassNames>) -> Self {
        Self::new(move || {
            let detector = source.load()?;
            Ok(match names.clone() {
                Some(names) => {
                    Box::new(RenamedDetector::new(detector, names)) as Box<dyn Detector>
                }
                None => detector,
            })
        })
    }

    /// Returns the loaded detector, loading it on first call.
    ///
    /// # Errors
    /// Returns the memoized [`LoadError`] if loading failed, on this call or
    /// any earlier one.
    pub fn get(&self) -> Result<&dyn Detector, LoadError> {
        let loaded = self.loaded.get_or_init(|| self.load());
        match loaded {
            Ok(detector) => Ok(detector.as_ref()),
            Err(err) => Err(err.clone()),
        }
    }

    /// Current lifecycle state. Never triggers a load.
    pub fn state(&self) -> HandleState {
        match self.state.load(Ordering::Acquire) {
            UNINITIALIZED => HandleState::Uninitialized,
            LOADING => HandleState::Loading,
            READY => HandleState::Ready,
            _ => HandleState::Failed,
        }
    }

    /// Number of times the loader has actually run (0 or 1).
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::Acquire)
    }

    #[tracing::instrument(skip(self))]
    fn load(&self) -> Result<Box<dyn Detector>, LoadError> {
        self.state.store(LOADING, Ordering::Release);
        self.load_attempts.fetch_add(1, Ordering::AcqRel);

        let result = (self.loader)();
        match &result {
            Ok(detector) => {
                info!(
                    backend = detector.name(),
                    classes = detector.class_names().len(),
                    "Model loaded successfully"
                );
                self.state.store(READY, Ordering::Release);
            }
            Err(err) => {
                error!(error = %err, "Model load failed; detection disabled");
                self.state.store(FAILED, Ordering::Release);
            }
        }
        result
    }
}

impl fmt::Debug for DetectorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectorHandle")
            .field("state", &self.state())
            .field("load_attempts", &self.load_attempts())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;
    use crate::ir::{ConfidenceThreshold, InputImage, RawDetection};
    use std::path::PathBuf;
    use std::sync::Arc;

    struct Empty;

    impl Detector for Empty {
        fn detect(
            &self,
            _image: &InputImage,
            _threshold: ConfidenceThreshold,
        ) -> Result<Vec<RawDetection>, InferenceError> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "empty"
        }
    }

    fn counting_handle(fail: bool) -> (DetectorHandle, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let handle = DetectorHandle::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            if fail {
                Err(LoadError::WeightsMissing {
                    path: PathBuf::from("weights/best.onnx"),
                })
            } else {
                Ok(Box::new(Empty) as Box<dyn Detector>)
            }
        });
        (handle, calls)
    }

    #[test]
    fn test_starts_uninitialized_and_lazy() {
        let (handle, calls) = counting_handle(false);
        assert_eq!(handle.state(), HandleState::Uninitialized);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_success_is_memoized() {
        let (handle, calls) = counting_handle(false);
        for _ in 0..5 {
            assert_eq!(handle.get().unwrap().name(), "empty");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.state(), HandleState::Ready);
        assert_eq!(handle.load_attempts(), 1);
    }

    #[test]
    fn test_failure_is_memoized_without_retry() {
        let (handle, calls) = counting_handle(true);
        let first = handle.get().err().unwrap();
        let second = handle.get().err().unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.state(), HandleState::Failed);
    }

    #[test]
    fn test_concurrent_first_use_loads_once() {
        let (handle, calls) = counting_handle(false);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    assert!(handle.get().is_ok());
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_source_applies_name_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preds.json");
        std::fs::write(&path, r#"{"names": {"0": "model-name"}, "detections": []}"#).unwrap();

        let handle = DetectorHandle::from_source(
            DetectorSource::Predictions(path),
            Some(ClassNames::from_sequence(["stone"])),
        );
        let detector = handle.get().unwrap();
        assert_eq!(detector.class_names().resolve(0u64.into()), "stone");
    }
}
