//! Field notifications and the bus that carries them.
//!
//! These are the in-memory notifications handed to the broadcast boundary;
//! byte encoding is left to the packet layer.

use crossbeam_channel::{bounded, Receiver, Sender};
use skirmish_common::{EffectId, ObjectId, SkillId, SkillUid, Vec3};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use crate::damage::DamageRecord;
use crate::stats::BasicAttribute;

/// Notifications broadcast to everyone in a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEvent {
    /// A skill cast was accepted
    SkillUsed {
        /// Casting actor
        caster_id: ObjectId,
        /// Skill id
        skill_id: SkillId,
        /// Skill level
        level: i16,
        /// Cast uid
        uid: SkillUid,
        /// Motion point
        motion_point: u8,
        /// Caster position at cast
        position: Vec3,
        /// Caster rotation at cast
        rotation: Vec3,
    },
    /// An attribute of an actor changed
    StatUpdate {
        /// Actor whose stat changed
        object_id: ObjectId,
        /// Attribute
        attribute: BasicAttribute,
        /// New current value
        current: i64,
        /// Maximum value
        total: i64,
    },
    /// Aggregated outcome of one attack
    SkillDamage(DamageRecord),
    /// A buff was added or refreshed
    BuffAdded {
        /// Actor holding the buff
        object_id: ObjectId,
        /// Actor that applied it
        caster_id: ObjectId,
        /// Effect id
        effect_id: EffectId,
        /// Effect level
        level: i16,
        /// Stack count after the change
        stacks: u32,
    },
    /// A buff was removed or expired
    BuffRemoved {
        /// Actor that held the buff
        object_id: ObjectId,
        /// Effect id
        effect_id: EffectId,
    },
    /// A region skill was spawned from a splash effect
    SkillEffectSpawned {
        /// Id of the region instance
        object_id: ObjectId,
        /// Actor that caused it
        caster_id: ObjectId,
        /// Region origins
        positions: Vec<Vec3>,
        /// Region rotation
        rotation: Vec3,
    },
    /// An actor died
    ActorDied {
        /// Actor that died
        object_id: ObjectId,
    },
}

/// Bounded queue between the combat core and the broadcast boundary.
///
/// Publishing never blocks a combat operation: once `capacity`
/// notifications are pending, further ones are dropped and counted.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<FieldEvent>,
    receiver: Receiver<FieldEvent>,
    capacity: usize,
    dropped: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a bus holding at most `capacity` pending notifications.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Queues a notification. Returns `false` if it was dropped.
    pub fn publish(&self, event: FieldEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(err) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(dropped, "Field event dropped: {:?}", err.into_inner());
                false
            },
        }
    }

    /// Takes every pending notification in publish order.
    pub fn drain(&self) -> Vec<FieldEvent> {
        self.receiver.try_iter().collect()
    }

    /// Notifications waiting to be drained.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Notifications dropped because the bus was full.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Maximum pending notifications.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        bus.publish(FieldEvent::ActorDied {
            object_id: ObjectId::new(1),
        });
        bus.publish(FieldEvent::ActorDied {
            object_id: ObjectId::new(2),
        });

        assert_eq!(bus.pending_count(), 2);
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops() {
        let bus = EventBus::new(1);
        let accepted: Vec<bool> = (1..=3)
            .map(|id| {
                bus.publish(FieldEvent::ActorDied {
                    object_id: ObjectId::new(id),
                })
            })
            .collect();

        assert_eq!(accepted, vec![true, false, false]);
        assert_eq!(bus.dropped_count(), 2);
        assert_eq!(bus.capacity(), 1);
        assert_eq!(
            bus.drain(),
            vec![FieldEvent::ActorDied {
                object_id: ObjectId::new(1)
            }]
        );
    }
}
