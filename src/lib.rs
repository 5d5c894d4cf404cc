//! TTS Tester Library
//!
//! Core modules for the TTS Tester desktop tool.

pub mod audio;
pub mod config;
pub mod devices;
pub mod error;
pub mod gui;
pub mod tags;
pub mod tts;
