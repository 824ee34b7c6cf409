//! Configuration for the animation module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Animation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Display time of each frame in milliseconds.
    #[serde(default = "default_frame_delay_ms")]
    pub frame_delay_ms: u64,

    #[serde(default = "default_loop_forever")]
    pub loop_forever: bool,

    /// File name of the animation, created in the workspace root.
    #[serde(default = "default_output_name")]
    pub output_name: String,

    /// Encoding timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_frame_delay_ms() -> u64 {
    250
}

fn default_loop_forever() -> bool {
    true
}

fn default_output_name() -> String {
    "Meteosat_Europe.gif".to_string()
}

fn default_timeout() -> u64 {
    600
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            frame_delay_ms: default_frame_delay_ms(),
            loop_forever: default_loop_forever(),
            output_name: default_output_name(),
            timeout_secs: default_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnimationConfig::default();
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.frame_delay_ms, 250);
        assert!(config.loop_forever);
        assert_eq!(config.output_name, "Meteosat_Europe.gif");
    }
}
