//! Renderer backed by an external compositing command.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::process::{run_command, CommandFailure};

use super::config::{CompositorConfig, INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER};
use super::error::RenderError;
use super::traits::Renderer;

/// Runs a configured command once per raw product.
///
/// Frames are named `<sequence>-<raw stem>`, so they sort in animation
/// order and stay recognisable in `frames/`.
pub struct CommandRenderer {
    config: CompositorConfig,
}

impl CommandRenderer {
    pub fn new(config: CompositorConfig) -> Self {
        Self { config }
    }

    /// Path of the frame rendered from `raw`.
    pub fn frame_path(&self, raw: &Path, frames_dir: &Path, sequence: usize) -> PathBuf {
        frames_dir.join(format!(
            "{}.{}",
            frame_stem(raw, sequence),
            self.config.frame_extension
        ))
    }

    fn build_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }
}

/// File stem of the `sequence`-th frame, rendered from `raw`.
pub fn frame_stem(raw: &Path, sequence: usize) -> String {
    let stem = raw
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    format!("{sequence:04}-{stem}")
}

#[async_trait]
impl Renderer for CommandRenderer {
    fn name(&self) -> &str {
        "command"
    }

    async fn render(
        &self,
        raw: &Path,
        frames_dir: &Path,
        sequence: usize,
    ) -> Result<PathBuf, RenderError> {
        let frame = self.frame_path(raw, frames_dir, sequence);
        let args = self.build_args(raw, &frame);

        run_command(&self.config.command, &args, self.config.timeout_secs)
            .await
            .map_err(|failure| match failure {
                CommandFailure::NotFound => RenderError::CommandNotFound {
                    path: self.config.command.clone(),
                },
                CommandFailure::Exited { code, stderr } => RenderError::failed(
                    format!("{} exited with code {:?}", self.config.command.display(), code),
                    (!stderr.is_empty()).then_some(stderr),
                ),
                CommandFailure::TimedOut => RenderError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                },
                CommandFailure::Io(e) => RenderError::Io(e),
            })?;

        if !tokio::fs::try_exists(&frame).await? {
            return Err(RenderError::OutputMissing { path: frame });
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn renderer(command: &str, args: &[&str]) -> CommandRenderer {
        CommandRenderer::new(CompositorConfig {
            command: PathBuf::from(command),
            args: args.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        })
    }

    #[test]
    fn test_build_args_substitutes_placeholders() {
        let r = renderer("render", &["--in={input}", "{output}", "--fast"]);
        let args = r.build_args(Path::new("/x/a.nat"), Path::new("/f/a.png"));
        assert_eq!(args, vec!["--in=/x/a.nat", "/f/a.png", "--fast"]);
    }

    #[test]
    fn test_frame_path_uses_sequence_and_raw_stem() {
        let r = CommandRenderer::new(CompositorConfig::default());
        assert_eq!(
            r.frame_path(Path::new("/x/MSG4-20240301.nat"), Path::new("/f"), 7),
            PathBuf::from("/f/0007-MSG4-20240301.png")
        );
    }

    #[test]
    fn test_same_raw_name_gives_distinct_frames() {
        let r = CommandRenderer::new(CompositorConfig::default());
        let first = r.frame_path(Path::new("/x/p1/IMG.nat"), Path::new("/f"), 0);
        let second = r.frame_path(Path::new("/x/p2/IMG.nat"), Path::new("/f"), 1);
        assert_ne!(first, second);
        assert!(first < second);
    }

    #[tokio::test]
    async fn test_missing_command() {
        let temp = TempDir::new().unwrap();
        let r = renderer("/nonexistent/render", &["{input}", "{output}"]);
        let err = r
            .render(&temp.path().join("a.nat"), temp.path(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::CommandNotFound { .. }));
        assert!(!err.is_decode());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_render_with_shell_command() {
        let temp = TempDir::new().unwrap();
        let raw = temp.path().join("scene.nat");
        std::fs::write(&raw, b"raw").unwrap();
        let r = renderer("/bin/sh", &["-c", "cp \"$0\" \"$1\"", "{input}", "{output}"]);

        let frame = r.render(&raw, temp.path(), 3).await.unwrap();

        assert_eq!(frame, temp.path().join("0003-scene.png"));
        assert_eq!(std::fs::read(&frame).unwrap(), b"raw");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_decode_error() {
        let temp = TempDir::new().unwrap();
        let r = renderer("/bin/sh", &["-c", "echo 'cannot read header' >&2; exit 1"]);
        let err = r
            .render(&temp.path().join("a.nat"), temp.path(), 0)
            .await
            .unwrap_err();
        match &err {
            RenderError::Failed { stderr, .. } => {
                assert_eq!(stderr.as_deref(), Some("cannot read header"))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_decode());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_silent_command_without_output() {
        let temp = TempDir::new().unwrap();
        let r = renderer("/bin/sh", &["-c", "true"]);
        let err = r
            .render(&temp.path().join("a.nat"), temp.path(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::OutputMissing { .. }));
    }
}
