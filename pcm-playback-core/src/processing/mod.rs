pub mod transfer_buffer;
pub mod wav_format;
