//! Slideshow model and playback engine.
//!
//! A [`slideshow::Slideshow`] owns slides, which own trait-object elements.
//! [`playback::PlaybackController`] drives a loaded show, keeping only a
//! window of slides around the current one rendered and holding players.

pub mod config;
pub mod element;
pub mod errors;
pub mod import;
pub mod keymap;
pub mod media;
pub mod playback;
pub mod properties;
pub mod registry;
pub mod slide;
pub mod slideshow;
pub mod surface;
