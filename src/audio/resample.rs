use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::audio::waveform::AudioBuffer;
use crate::error::EditPointError;

/// Converts a whole clip to `target_rate_hz` in one pass. The output holds
/// exactly `round(frames * target / source)` frames per channel, aligned with
/// the input (the sinc filter delay is trimmed off).
pub fn resample_buffer(
    audio: AudioBuffer,
    target_rate_hz: u32,
) -> Result<AudioBuffer, EditPointError> {
    let frames = audio.frames();
    if audio.sample_rate_hz == target_rate_hz || frames == 0 {
        return Ok(AudioBuffer {
            sample_rate_hz: target_rate_hz,
            ..audio
        });
    }
    if audio.sample_rate_hz == 0 || target_rate_hz == 0 {
        return Err(EditPointError::resample(format!(
            "cannot resample {} Hz to {target_rate_hz} Hz",
            audio.sample_rate_hz
        )));
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Cubic,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = target_rate_hz as f64 / audio.sample_rate_hz as f64;
    let expected = (frames as f64 * ratio).round() as usize;

    let mut resampler =
        SincFixedIn::<f32>::new(ratio, 1.0, params, frames, audio.channel_count())
            .map_err(EditPointError::resample)?;
    let delay = resampler.output_delay();
    let mut output = resampler
        .process(&audio.channels, None)
        .map_err(EditPointError::resample)?;
    let tail = resampler
        .process_partial(None::<&[Vec<f32>]>, None)
        .map_err(EditPointError::resample)?;

    for (channel, rest) in output.iter_mut().zip(tail) {
        channel.extend(rest);
        channel.drain(..delay.min(channel.len()));
        channel.resize(expected, 0.0);
    }
    tracing::trace!(
        from_hz = audio.sample_rate_hz,
        to_hz = target_rate_hz,
        frames,
        resampled = expected,
        "resampled clip"
    );
    Ok(AudioBuffer {
        sample_rate_hz: target_rate_hz,
        channels: output,
    })
}
