//! Animation playback state of an actor.

use skirmish_common::Tick;

/// A sequence being played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayingSequence {
    /// Sequence name
    pub name: String,
    /// Tick playback started
    pub start_tick: Tick,
    /// Length in ticks (0 = loops until replaced)
    pub duration_ticks: Tick,
}

impl PlayingSequence {
    /// Whether playback has ended at `tick`.
    #[must_use]
    pub fn is_finished(&self, tick: Tick) -> bool {
        self.duration_ticks > 0 && tick >= self.start_tick + self.duration_ticks
    }
}

/// Tracks the sequence an actor is currently playing.
#[derive(Debug, Default)]
pub struct AnimationManager {
    current: Option<PlayingSequence>,
}

impl AnimationManager {
    /// Creates an idle manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a sequence, replacing the current one.
    pub fn play(&mut self, name: &str, start_tick: Tick, duration_ticks: Tick) {
        self.current = Some(PlayingSequence {
            name: name.to_owned(),
            start_tick,
            duration_ticks: duration_ticks.max(0),
        });
    }

    /// Stops playback.
    pub fn stop(&mut self) {
        self.current = None;
    }

    /// Current sequence.
    #[must_use]
    pub fn current(&self) -> Option<&PlayingSequence> {
        self.current.as_ref()
    }

    /// Clears a finished sequence.
    pub fn update(&mut self, tick: Tick) {
        if self.current.as_ref().is_some_and(|seq| seq.is_finished(tick)) {
            self.current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_finishes() {
        let mut animation = AnimationManager::new();
        animation.play("Attack_01_A", 100, 50);

        animation.update(149);
        assert_eq!(animation.current().map(|s| s.name.as_str()), Some("Attack_01_A"));

        animation.update(150);
        assert!(animation.current().is_none());
    }

    #[test]
    fn test_looping_sequence_persists() {
        let mut animation = AnimationManager::new();
        animation.play("Idle_A", 0, 0);
        animation.update(1_000_000);
        assert!(animation.current().is_some());

        animation.stop();
        assert!(animation.current().is_none());
    }
}
