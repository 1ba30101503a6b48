//! The three FFmpeg operations used by the pipeline.

use std::path::Path;

use tracing::info;

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};

/// Extract the audio track as uncompressed 44.1 kHz stereo PCM.
///
/// Failure here means the input is malformed or unsupported and is
/// terminal for the job.
pub async fn extract_audio(input: impl AsRef<Path>, output: impl AsRef<Path>) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    info!("Extracting audio: {} -> {}", input.display(), output.display());

    FfmpegCommand::new(input, output)
        .no_video()
        .output_args(["-acodec", "pcm_s16le", "-ar", "44100", "-ac", "2"])
        .run()
        .await?;

    ensure_exists(output)
}

/// Apply the deterministic voice-band filter: attenuate below 200 Hz and
/// above 3000 Hz. Approximates voice isolation without a trained model.
pub async fn filter_voice_band(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    info!("Applying voice band filter: {} -> {}", input.display(), output.display());

    FfmpegCommand::new(input, output)
        .audio_filter("highpass=f=200,lowpass=f=3000")
        .run()
        .await?;

    ensure_exists(output)
}

/// Mux the original video stream (copied, not re-encoded) with the cleaned
/// audio track (AAC at a fixed bitrate), trimming to the shorter stream.
pub async fn mux_video_audio(
    video: impl AsRef<Path>,
    audio: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let video = video.as_ref();
    let audio = audio.as_ref();
    let output = output.as_ref();

    info!(
        "Recombining video {} with audio {} -> {}",
        video.display(),
        audio.display(),
        output.display()
    );

    FfmpegCommand::new(video, output)
        .input(audio)
        .video_codec("copy")
        .audio_codec("aac")
        .audio_bitrate("192k")
        .output_args(["-map", "0:v:0", "-map", "1:a:0"])
        .shortest()
        .run()
        .await?;

    ensure_exists(output)
}

fn ensure_exists(path: &Path) -> MediaResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(MediaError::MissingArtifact(path.to_path_buf()))
    }
}
