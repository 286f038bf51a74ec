pub use crate::editing::renderer::{MemoryClipSink, WavClipSink, WavEncoding};
pub use crate::editing::selector::GapSelector;
pub use crate::editing::synthesizer::MidpointInvasionSynthesizer;
