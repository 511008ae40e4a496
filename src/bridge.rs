//! Feedback-to-playback navigation.
//!
//! A feedback entry is clickable as a whole and also carries a nested
//! timestamp control. Both lead to the same seek-and-play; the nested
//! control stops propagation so one click never navigates twice.

use crate::api::FeedbackItem;
use crate::player::{MediaSurface, PlaybackController};

/// Jump to the item's timestamp and resume playback
pub fn activate<S: MediaSurface>(item: &FeedbackItem, player: &mut PlaybackController<S>) {
    tracing::debug!("Jumping to feedback {} at {}s", item.id, item.timestamp_seconds);
    player.seek_and_play(item.timestamp_seconds);
}

/// Which part of a feedback entry received the click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Entry,
    Timestamp,
}

#[derive(Debug)]
pub struct ClickEvent {
    pub target: ClickTarget,
    propagation_stopped: bool,
}

impl ClickEvent {
    pub fn new(target: ClickTarget) -> Self {
        Self {
            target,
            propagation_stopped: false,
        }
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Deliver a click to a feedback entry, innermost handler first.
/// Returns how many times navigation fired.
pub fn dispatch_click<S: MediaSurface>(
    item: &FeedbackItem,
    target: ClickTarget,
    player: &mut PlaybackController<S>,
) -> usize {
    let mut event = ClickEvent::new(target);
    let mut activations = 0;

    if event.target == ClickTarget::Timestamp {
        event.stop_propagation();
        activate(item, player);
        activations += 1;
    }

    if !event.propagation_stopped() {
        activate(item, player);
        activations += 1;
    }

    activations
}
