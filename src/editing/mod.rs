pub mod renderer;
pub mod selector;
pub mod synthesizer;

pub use renderer::{clip_file_name, render_triplet, MemoryClipSink, RenderedClip, WavClipSink, WavEncoding};
pub use selector::GapSelector;
pub use synthesizer::MidpointInvasionSynthesizer;
