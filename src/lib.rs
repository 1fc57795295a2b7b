//! Voicemint - AI Voice Dubbing for Videos
//!
//! Generates a voice-over script from a frame of a video, translates it,
//! synthesizes dubbed speech and plays it synchronized with the muted video.
//! Standalone text-to-speech and speech-to-text are available too.

pub mod cli;
pub mod config;
pub mod error;
pub mod audio;
pub mod media;
pub mod services;
pub mod script;
pub mod panel;
pub mod session;
pub mod workflow;
