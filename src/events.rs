use crate::clip::AnimationClip;
use bevy_ecs::prelude::{Entity, Resource};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum AnimEvent {
    NotifyTriggered { entity: Entity, clip: Arc<str>, name: Arc<str>, time: f32 },
    PlaybackFinished { entity: Entity, clip: Arc<str> },
}

impl fmt::Display for AnimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimEvent::NotifyTriggered { entity, clip, name, time } => {
                write!(
                    f,
                    "NotifyTriggered entity={} clip={} name={} time={:.3}",
                    entity.index(),
                    clip,
                    name,
                    time
                )
            }
            AnimEvent::PlaybackFinished { entity, clip } => {
                write!(f, "PlaybackFinished entity={} clip={}", entity.index(), clip)
            }
        }
    }
}

#[derive(Default, Resource)]
pub struct EventBus {
    events: Vec<AnimEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: AnimEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<AnimEvent> {
        self.events.drain(..).collect()
    }
}

/// Collects the notifies a play head crossed while moving from `previous` to
/// `current`. A looping head that wrapped fires the tail of the clip and then
/// the part before the new position. Notifies land in `out` in trigger order.
pub fn collect_notifies(
    clip: &AnimationClip,
    previous: f32,
    current: f32,
    looped: bool,
    out: &mut Vec<(Arc<str>, f32)>,
) {
    if clip.notifies.is_empty() || (current - previous).abs() <= f32::EPSILON {
        return;
    }
    if current > previous {
        for notify in clip.notifies.iter() {
            if notify.time > previous && notify.time <= current {
                out.push((notify.name.clone(), notify.time));
            }
        }
    } else if looped {
        // Wrapped: (previous, length] then [0, current].
        for notify in clip.notifies.iter() {
            if notify.time > previous {
                out.push((notify.name.clone(), notify.time));
            }
        }
        for notify in clip.notifies.iter() {
            if notify.time <= current {
                out.push((notify.name.clone(), notify.time));
            }
        }
    }
}
