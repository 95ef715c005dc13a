//! ONNX Runtime backend for YOLO-style detection exports.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::TensorRef;
use tracing::{debug, warn};

use super::Detector;
use super::yolo::{decode_head, letterbox_tensor, DecodeOptions};
use crate::error::{InferenceError, LoadError};
use crate::ir::io_names::names_from_flow_mapping;
use crate::ir::{ClassNames, ConfidenceThreshold, InputImage, RawDetection};

/// Model-specific settings that the ONNX file does not reliably expose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OnnxOptions {
    /// Square input edge the model was exported with.
    pub input_size: u32,
    pub decode: DecodeOptions,
    pub intra_threads: usize,
}

impl Default for OnnxOptions {
    fn default() -> Self {
        Self {
            input_size: 640,
            decode: DecodeOptions::default(),
            intra_threads: 4,
        }
    }
}

/// YOLO detector running on ONNX Runtime.
///
/// `Session::run` needs exclusive access, so the session sits behind a
/// mutex; concurrent requests are serialized at inference time only.
pub struct OnnxDetector {
    session: Mutex<Session>,
    names: ClassNames,
    options: OnnxOptions,
}

impl OnnxDetector {
    #[tracing::instrument(skip(options))]
    pub fn load(path: &Path, options: OnnxOptions) -> Result<Self, LoadError> {
        let backend_err = |e: ort::Error| LoadError::Backend {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let session = Session::builder()
            .map_err(backend_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(backend_err)?
            .with_intra_threads(options.intra_threads)
            .map_err(backend_err)?
            .commit_from_file(path)
            .map_err(backend_err)?;

        let names = match session.metadata().and_then(|meta| meta.custom("names")) {
            Ok(Some(raw)) => names_from_flow_mapping(&raw).unwrap_or_else(|message| {
                warn!(%message, "Ignoring unparseable class names in model metadata");
                ClassNames::new()
            }),
            Ok(None) => ClassNames::new(),
            Err(e) => {
                warn!(error = %e, "Model metadata unavailable");
                ClassNames::new()
            }
        };

        debug!(classes = names.len(), input_size = options.input_size, "ONNX session ready");

        Ok(Self {
            session: Mutex::new(session),
            names,
            options,
        })
    }
}

impl Detector for OnnxDetector {
    #[tracing::instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    fn detect(
        &self,
        image: &InputImage,
        threshold: ConfidenceThreshold,
    ) -> Result<Vec<RawDetection>, InferenceError> {
        let size = self.options.input_size as usize;
        let (tensor, letterbox) = letterbox_tensor(image.pixels(), self.options.input_size);
        let input = Array4::from_shape_vec((1, 3, size, size), tensor)
            .map_err(|e| InferenceError::Backend(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::Backend("session lock poisoned".into()))?;

        let input_value = TensorRef::from_array_view(input.view())
            .map_err(|e| InferenceError::Backend(e.to_string()))?;
        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| InferenceError::Backend(e.to_string()))?;

        let head = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| InferenceError::InvalidOutput(e.to_string()))?;

        let shape = head.shape().to_vec();
        if shape.len() != 3 || shape[0] != 1 {
            return Err(InferenceError::InvalidOutput(format!(
                "expected [1, features, anchors], got {:?}",
                shape
            )));
        }
        let data: Vec<f32> = head.iter().copied().collect();

        decode_head(
            &data,
            shape[1],
            shape[2],
            threshold,
            &letterbox,
            &self.options.decode,
        )
    }

    fn class_names(&self) -> &ClassNames {
        &self.names
    }

    fn name(&self) -> &str {
        "onnx"
    }
}
