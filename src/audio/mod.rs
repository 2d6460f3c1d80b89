//! # Audio I/O
//!
//! Decoding of input recordings into [`AudioBuffer`]s and WAV output of the
//! rendered overlays. Decoding is delegated to hound (WAV) and Symphonia
//! (mp3, flac, ogg, m4a, aac).
//!
//! ```rust,no_run
//! use clicktrack::audio::{AudioLoader, AudioWriter};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let audio = AudioLoader::load("song.wav").await?;
//! println!("{:.1}s at {} Hz", audio.buffer.duration(), audio.buffer.sample_rate());
//!
//! AudioWriter::new(16).write(&audio.buffer, "copy.wav")?;
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod types;
pub mod writer;

pub use loader::{AudioLoader, AUDIO_EXTENSIONS};
pub use types::{AudioBuffer, AudioFile, FileMetadata};
pub use writer::AudioWriter;
