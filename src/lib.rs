pub mod alignment;
pub mod audio;
pub mod config;
pub mod editing;
pub mod error;
pub mod pipeline;
pub mod types;

pub use alignment::{load_alignment, validate_alignment, MfaWordRecord};
pub use audio::waveform::{AudioBuffer, Waveform};
pub use audio::zero_crossing::{SearchDirection, SnapKind, ZeroCrossing, ZeroCrossingLocator};
pub use config::{ClipFormat, EditPointConfig, InvadedSide, InvasionRange};
pub use editing::{GapSelector, MemoryClipSink, MidpointInvasionSynthesizer, WavClipSink, WavEncoding};
pub use error::EditPointError;
pub use pipeline::builder::EditPointEngineBuilder;
pub use pipeline::runtime::{EditPointEngine, UtterancePlan};
pub use pipeline::traits::{ClipRequest, ClipSink, CutSynthesizer, EditPointSelector, WaveformAccess};
pub use types::{
    AlignedPhoneme, AlignedWord, BoundarySide, ChunkFlags, ClipRecord, CutSpec, CutTriplet,
    DroppedCandidate, EditCandidate, EditType, SilenceGap, UtteranceAlignment, UtteranceOutput,
};
