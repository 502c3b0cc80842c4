use crate::error::DetectionError;
use anyhow::Result;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::info;
use tract_onnx::prelude::*;

pub type Model = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

pub fn initialize_model(path: &Path) -> Result<Model> {
    let model = tract_onnx::onnx()
        .model_for_path(path)?
        .into_optimized()?
        .into_runnable()?;

    Ok(model)
}

/// A model loaded at most once. Concurrent callers share the pending load;
/// a failed load is not cached.
pub struct ModelSlot {
    path: PathBuf,
    cell: OnceCell<Arc<Mutex<Model>>>,
}

impl ModelSlot {
    pub fn new(path: impl Into<PathBuf>) -> ModelSlot {
        ModelSlot {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Arc<Mutex<Model>>, DetectionError> {
        let model = self
            .cell
            .get_or_try_init(|| async {
                let path = self.path.clone();
                info!("Loading model {}", path.display());
                let model = tokio::task::spawn_blocking(move || initialize_model(&path))
                    .await
                    .map_err(anyhow::Error::from)??;
                Ok::<_, DetectionError>(Arc::new(Mutex::new(model)))
            })
            .await?;

        Ok(model.clone())
    }

    pub fn get(&self) -> Option<Arc<Mutex<Model>>> {
        self.cell.get().cloned()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum InputRange {
    ZeroToOne,
    NegOneToOne,
}

/// Resize to the model's input and pack as an NHWC f32 tensor.
pub fn image_to_tensor(img: &RgbaImage, width: u32, height: u32, range: InputRange) -> Tensor {
    let resized = imageops::resize(img, width, height, FilterType::Triangle);
    let arr = tract_ndarray::Array4::from_shape_fn(
        (1, height as usize, width as usize, 3),
        |(_, y, x, c)| {
            let v = resized.get_pixel(x as u32, y as u32).0[c] as f32;
            match range {
                InputRange::ZeroToOne => v / 255.,
                InputRange::NegOneToOne => v / 127.5 - 1.,
            }
        },
    );

    arr.into()
}

/// Run the model and flatten each output, keyed by its last dimension.
pub fn run_flat(model: &Model, input: Tensor) -> Result<Vec<(usize, Vec<f32>)>, DetectionError> {
    let outputs = model.run(tvec!(input.into()))?;

    let mut flat = Vec::with_capacity(outputs.len());
    for out in outputs.iter() {
        let view = out.to_array_view::<f32>()?;
        let last = view.shape().last().copied().unwrap_or(0);
        flat.push((last, view.iter().copied().collect()));
    }

    Ok(flat)
}
