pub mod assets;
pub mod compositor;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod landmarks;
pub mod masks;
pub mod pipeline;
pub mod session;
pub mod shapes;
pub mod stream;
pub mod surface;
pub mod task;

pub use compositor::{EffectSettings, Playback, VideoSource};
pub use filter::LookFilter;
pub use landmarks::{Landmark, LandmarkSet};
pub use pipeline::{BackendChain, Detection, DetectionBackend, TrackedBox, TrackingStatus};
pub use session::{EffectConfig, EffectSession};
pub use stream::{AudioTrack, MediaStream, OutputStream, VideoFrame};
