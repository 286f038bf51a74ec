pub mod resample;
pub mod waveform;
pub mod zero_crossing;
