pub mod coach;
pub mod config;
pub mod detector;
pub mod history;
pub mod pipeline;
pub mod platform;
pub mod playback;
pub mod service;
pub mod tts;
