pub mod playback_delegate;
pub mod playback_device;
