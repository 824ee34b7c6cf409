//! Animation assembly.
//!
//! Frames are combined into a looping GIF by ffmpeg. The artifact carries
//! its size and checksum so the publisher and the run log can refer to it.

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::AnimationConfig;
pub use error::EncodeError;
pub use ffmpeg::FfmpegAnimator;
pub use traits::Animator;
pub use types::AnimationArtifact;
