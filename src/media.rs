//! Media player service consumed by audio and video elements.
//!
//! Player commands are fire-and-forget; a player reports its state changes
//! later through the callback it was created with. Dropping a player releases it.

use crate::errors::MediaError;
use log::{debug, info};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    Stopped,
    Playing,
    Paused,
}

/// What a player should play.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaSource {
    pub path: PathBuf,
    /// Volume in percent, 0 to 100.
    pub volume: u8,
    pub looping: bool,
    pub video: bool,
}

pub type StateCallback = Box<dyn FnMut(PlayerState)>;

pub trait MediaPlayer {
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn set_muted(&mut self, muted: bool);
    fn is_muted(&self) -> bool;
}

pub trait MediaBackend {
    fn create_player(&self, source: &MediaSource, on_state: StateCallback) -> Result<Box<dyn MediaPlayer>, MediaError>;
}

/// Backend whose players only track their state. Used where no audio/video
/// output is available.
#[derive(Debug, Default)]
pub struct SilentBackend;

struct SilentPlayer {
    path: PathBuf,
    state: PlayerState,
    muted: bool,
    on_state: StateCallback,
}

impl SilentPlayer {
    fn transition(&mut self, state: PlayerState) {
        if self.state != state {
            debug!("Silent player '{}': {:?} -> {:?}", self.path.display(), self.state, state);
            self.state = state;
            (self.on_state)(state);
        }
    }
}

impl MediaPlayer for SilentPlayer {
    fn play(&mut self) { self.transition(PlayerState::Playing); }
    fn pause(&mut self) { self.transition(PlayerState::Paused); }
    fn stop(&mut self) { self.transition(PlayerState::Stopped); }
    fn set_muted(&mut self, muted: bool) { self.muted = muted; }
    fn is_muted(&self) -> bool { self.muted }
}

impl Drop for SilentPlayer {
    fn drop(&mut self) {
        debug!("Silent player '{}' released", self.path.display());
    }
}

impl MediaBackend for SilentBackend {
    fn create_player(&self, source: &MediaSource, on_state: StateCallback) -> Result<Box<dyn MediaPlayer>, MediaError> {
        info!("Creating silent player for '{}' (volume {}, loop {})", source.path.display(), source.volume, source.looping);
        Ok(Box::new(SilentPlayer { path: source.path.clone(), state: PlayerState::Stopped, muted: false, on_state }))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn silent_player_reports_transitions_once() {
        let states = Rc::new(RefCell::new(Vec::new()));
        let sink = states.clone();
        let source = MediaSource { path: "a.ogg".into(), volume: 100, looping: false, video: false };
        let mut player = SilentBackend.create_player(&source, Box::new(move |s| sink.borrow_mut().push(s))).unwrap();

        player.play();
        player.play();
        player.pause();
        player.stop();
        assert_eq!(*states.borrow(), vec![PlayerState::Playing, PlayerState::Paused, PlayerState::Stopped]);

        assert!(!player.is_muted());
        player.set_muted(true);
        assert!(player.is_muted());
    }
}
