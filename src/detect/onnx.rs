use ndarray::{Array4, ArrayViewD};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::TensorRef;

use super::backend::{Backend, RawCandidate};
use super::DetectError;

// Layer rows are [cx, cy, w, h, objectness, class scores...].
const BOX_ATTRS: usize = 5;

/// ONNX Runtime inference session plus the output-layer names resolved once
/// at load time.
pub struct OrtBackend {
    session: Session,
    output_names: Vec<String>,
}

impl OrtBackend {
    pub fn new(model_path: &str) -> Result<Self, DetectError> {
        let builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?;

        let session = if model_path.starts_with("http://") || model_path.starts_with("https://") {
            builder.commit_from_url(model_path)?
        } else {
            builder.commit_from_file(model_path)?
        };

        let output_names = session.outputs.iter().map(|o| o.name.clone()).collect();

        Ok(Self {
            session,
            output_names,
        })
    }

    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }
}

impl Backend for OrtBackend {
    fn infer(&mut self, input: Array4<f32>) -> Result<Vec<RawCandidate>, DetectError> {
        let tensor_ref = TensorRef::from_array_view(input.view())?.into_dyn();
        let outputs = self.session.run(ort::inputs![tensor_ref])?;

        let mut candidates = Vec::new();
        for name in &self.output_names {
            let Some(value) = outputs.get(name.as_str()) else {
                continue;
            };
            let array = value.try_extract_array::<f32>()?;
            decode_layer(&array, &mut candidates);
        }

        Ok(candidates)
    }
}

/// Flatten one output layer into candidates. Accepts [1, N, A] and [N, A]
/// shaped layers; anything else is skipped.
fn decode_layer(output: &ArrayViewD<f32>, candidates: &mut Vec<RawCandidate>) {
    let shape = output.shape();
    let (rows, attrs) = match shape.len() {
        3 => (shape[1], shape[2]),
        2 => (shape[0], shape[1]),
        _ => return,
    };

    if attrs <= BOX_ATTRS {
        return;
    }

    let Some(flat) = output.as_slice() else {
        return;
    };

    for i in 0..rows {
        let row = &flat[i * attrs..(i + 1) * attrs];
        candidates.push(RawCandidate {
            bbox: [row[0], row[1], row[2], row[3]],
            scores: row[BOX_ATTRS..].to_vec(),
        });
    }
}
