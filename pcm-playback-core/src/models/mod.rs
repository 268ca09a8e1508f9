pub mod audio_models;
pub mod config;
pub mod error;
pub mod playback_result;
pub mod state;
