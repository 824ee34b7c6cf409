//! FFmpeg-based GIF assembly.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};
use tracing::info;

use crate::process::{run_command, CommandFailure};

use super::config::AnimationConfig;
use super::error::EncodeError;
use super::traits::Animator;
use super::types::AnimationArtifact;

/// Name of the concat list written next to the frames.
const FRAME_LIST_NAME: &str = "frames.ffconcat";

/// Palette pass keeps the satellite colours intact in a 256 colour GIF.
const PALETTE_FILTER: &str = "[0:v]split[a][b];[a]palettegen=stats_mode=full[p];[b][p]paletteuse";

/// Assembles frames with ffmpeg's concat demuxer.
pub struct FfmpegAnimator {
    config: AnimationConfig,
}

impl FfmpegAnimator {
    pub fn new(config: AnimationConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AnimationConfig::default())
    }

    /// Builds the concat list giving every frame the configured duration.
    ///
    /// The demuxer ignores the duration of the last entry, so the last frame
    /// is listed twice.
    fn build_frame_list(&self, frames: &[PathBuf]) -> String {
        let duration = self.config.frame_delay_ms as f64 / 1000.0;
        let mut list = String::from("ffconcat version 1.0\n");
        for frame in frames {
            list.push_str(&format!("file '{}'\n", escape_concat_path(frame)));
            list.push_str(&format!("duration {duration:.3}\n"));
        }
        if let Some(last) = frames.last() {
            list.push_str(&format!("file '{}'\n", escape_concat_path(last)));
        }
        list
    }

    fn build_args(&self, list: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            list.to_string_lossy().to_string(),
            "-filter_complex".to_string(),
            PALETTE_FILTER.to_string(),
            "-loop".to_string(),
            if self.config.loop_forever { "0" } else { "-1" }.to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}

async fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path).await?);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let bytes_read = reader.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[async_trait]
impl Animator for FfmpegAnimator {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn assemble(
        &self,
        frames: &[PathBuf],
        output: &Path,
    ) -> Result<AnimationArtifact, EncodeError> {
        let Some(first) = frames.first() else {
            return Err(EncodeError::NoFrames);
        };

        let list_dir = first.parent().unwrap_or_else(|| Path::new("."));
        let list_path = list_dir.join(FRAME_LIST_NAME);
        tokio::fs::write(&list_path, self.build_frame_list(frames)).await?;

        let args = self.build_args(&list_path, output);
        run_command(&self.config.ffmpeg_path, &args, self.config.timeout_secs)
            .await
            .map_err(|failure| match failure {
                CommandFailure::NotFound => EncodeError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                },
                CommandFailure::Exited { code, stderr } => EncodeError::failed(
                    format!("FFmpeg exited with code: {code:?}"),
                    (!stderr.is_empty()).then_some(stderr),
                ),
                CommandFailure::TimedOut => EncodeError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                },
                CommandFailure::Io(e) => EncodeError::Io(e),
            })?;

        let metadata = tokio::fs::metadata(output)
            .await
            .map_err(|_| EncodeError::OutputMissing {
                path: output.to_path_buf(),
            })?;
        let sha256 = sha256_file(output).await?;

        info!(
            path = %output.display(),
            frames = frames.len(),
            size_bytes = metadata.len(),
            "Animation assembled"
        );

        Ok(AnimationArtifact {
            path: output.to_path_buf(),
            frame_count: frames.len(),
            size_bytes: metadata.len(),
            sha256,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_frame_list_repeats_last_frame() {
        let animator = FfmpegAnimator::with_defaults();
        let list = animator.build_frame_list(&[
            PathBuf::from("/f/a.png"),
            PathBuf::from("/f/b.png"),
        ]);
        assert_eq!(
            list,
            "ffconcat version 1.0\n\
             file '/f/a.png'\nduration 0.250\n\
             file '/f/b.png'\nduration 0.250\n\
             file '/f/b.png'\n"
        );
    }

    #[test]
    fn test_frame_list_escapes_quotes() {
        let animator = FfmpegAnimator::with_defaults();
        let list = animator.build_frame_list(&[PathBuf::from("/f/it's.png")]);
        assert!(list.contains("file '/f/it'\\''s.png'"));
    }

    #[test]
    fn test_loop_flag() {
        let list = Path::new("/f/frames.ffconcat");
        let out = Path::new("/w/out.gif");

        let args = FfmpegAnimator::with_defaults().build_args(list, out);
        let pos = args.iter().position(|a| a == "-loop").unwrap();
        assert_eq!(args[pos + 1], "0");
        assert_eq!(args.last().unwrap(), "/w/out.gif");

        let once = FfmpegAnimator::new(AnimationConfig {
            loop_forever: false,
            ..Default::default()
        });
        let args = once.build_args(list, out);
        let pos = args.iter().position(|a| a == "-loop").unwrap();
        assert_eq!(args[pos + 1], "-1");
    }

    #[tokio::test]
    async fn test_no_frames() {
        let err = FfmpegAnimator::with_defaults()
            .assemble(&[], Path::new("/w/out.gif"))
            .await
            .unwrap_err();
        assert!(matches!(err, EncodeError::NoFrames));
    }

    #[tokio::test]
    async fn test_missing_ffmpeg() {
        let temp = TempDir::new().unwrap();
        let frame = temp.path().join("a.png");
        std::fs::write(&frame, b"png").unwrap();
        let animator = FfmpegAnimator::new(AnimationConfig {
            ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg"),
            ..Default::default()
        });

        let err = animator
            .assemble(&[frame], &temp.path().join("out.gif"))
            .await
            .unwrap_err();

        assert!(matches!(err, EncodeError::FfmpegNotFound { .. }));
        assert!(temp.path().join(FRAME_LIST_NAME).exists());
    }

    #[tokio::test]
    async fn test_sha256_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).await.unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
