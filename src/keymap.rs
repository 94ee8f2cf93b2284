//! Keyboard bindings of the playback view.

use egui::{Key, Modifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewAction {
    Next,
    Prev,
    First,
    Last,
    GoTo,
    TogglePlayPause,
    Stop,
    ToggleMute,
    Restart,
    ToggleBlack,
    Close,
}

pub fn action_for_key(key: Key, modifiers: Modifiers) -> Option<ViewAction> {
    if modifiers.command && key == Key::Q {
        return Some(ViewAction::Close);
    }
    if modifiers.any() {
        return None;
    }
    let action = match key {
        Key::Enter | Key::ArrowRight | Key::ArrowDown | Key::Tab | Key::L | Key::J => ViewAction::Next,
        Key::Backspace | Key::ArrowLeft | Key::ArrowUp | Key::H | Key::K => ViewAction::Prev,
        Key::Home | Key::PageUp => ViewAction::First,
        Key::End | Key::PageDown => ViewAction::Last,
        Key::P | Key::Space => ViewAction::TogglePlayPause,
        Key::S => ViewAction::Stop,
        Key::M => ViewAction::ToggleMute,
        Key::R | Key::F5 => ViewAction::Restart,
        Key::G => ViewAction::GoTo,
        Key::B => ViewAction::ToggleBlack,
        Key::Escape | Key::Q | Key::F11 => ViewAction::Close,
        _ => return None,
    };
    Some(action)
}
