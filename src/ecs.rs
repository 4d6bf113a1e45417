use crate::assets::AnimationLibrary;
use crate::blendspace::{BlendSpace1D, BlendSpace2D};
use crate::events::{collect_notifies, AnimEvent, EventBus};
use crate::player::{ClipPlayer, PoseSource};
use crate::pose::Pose;
use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::Rng;
use std::sync::Arc;

/// The pose provider attached to an animator: a plain clip or a blend space.
pub enum AnimSource {
    Clip(ClipPlayer),
    Blend1d(BlendSpace1D),
    Blend2d(BlendSpace2D),
}

impl PoseSource for AnimSource {
    fn advance(&mut self, dt: f32, library: &AnimationLibrary, out: &mut Pose) {
        match self {
            AnimSource::Clip(player) => player.advance(dt, library, out),
            AnimSource::Blend1d(space) => space.advance(dt, library, out),
            AnimSource::Blend2d(space) => space.advance(dt, library, out),
        }
    }

    fn play_length(&self, library: &AnimationLibrary) -> Option<f32> {
        match self {
            AnimSource::Clip(player) => player.play_length(library),
            AnimSource::Blend1d(space) => space.play_length(library),
            AnimSource::Blend2d(space) => space.play_length(library),
        }
    }

    fn dominant_clip(&self) -> Option<Arc<str>> {
        match self {
            AnimSource::Clip(player) => player.dominant_clip(),
            AnimSource::Blend1d(space) => space.dominant_clip(),
            AnimSource::Blend2d(space) => space.dominant_clip(),
        }
    }

    fn current_play_time(&self) -> f32 {
        match self {
            AnimSource::Clip(player) => player.current_play_time(),
            AnimSource::Blend1d(space) => space.current_play_time(),
            AnimSource::Blend2d(space) => space.current_play_time(),
        }
    }

    fn previous_play_time(&self) -> f32 {
        match self {
            AnimSource::Clip(player) => player.previous_play_time(),
            AnimSource::Blend1d(space) => space.previous_play_time(),
            AnimSource::Blend2d(space) => space.previous_play_time(),
        }
    }

    fn looping(&self) -> bool {
        match self {
            AnimSource::Clip(player) => player.looping(),
            AnimSource::Blend1d(space) => space.looping(),
            AnimSource::Blend2d(space) => space.looping(),
        }
    }
}

// ---------- Components ----------
#[derive(Component)]
pub struct Animator {
    pub source: AnimSource,
    pub playing: bool,
}

#[derive(Component, Clone)]
pub struct SkeletonRef {
    pub key: Arc<str>,
}

#[derive(Component, Default)]
pub struct BonePose(pub Pose);

#[derive(Resource, Default, Clone, Copy, Debug)]
pub struct AnimatorMetrics {
    pub animators: usize,
    pub evaluated: usize,
    pub notifies: usize,
    pub finished: usize,
}

pub struct AnimatorInfo {
    pub skeleton: Arc<str>,
    pub playing: bool,
    pub dominant_clip: Option<Arc<str>>,
    pub play_time: f32,
    pub joint_count: usize,
}

/// World wrapper owning the animated entities. One `update` call per frame
/// advances every playing animator, writes its pose and queues notify and
/// finish events on the bus.
pub struct AnimWorld {
    pub world: World,
}

impl AnimWorld {
    pub fn new() -> Self {
        let mut world = World::new();
        world.insert_resource(EventBus::default());
        world.insert_resource(AnimatorMetrics::default());
        Self { world }
    }

    /// Spawns an animator bound to `skeleton`, starting from the rest pose.
    /// `None` when the skeleton is not loaded.
    pub fn spawn_animator(
        &mut self,
        library: &AnimationLibrary,
        skeleton: &str,
        source: AnimSource,
    ) -> Option<Entity> {
        let rig = library.skeleton(skeleton)?;
        let mut pose = Pose::default();
        rig.write_rest_pose(&mut pose);
        let entity = self
            .world
            .spawn((
                Animator { source, playing: true },
                SkeletonRef { key: Arc::from(skeleton) },
                BonePose(pose),
            ))
            .id();
        Some(entity)
    }

    pub fn update(&mut self, dt: f32, library: &AnimationLibrary) {
        let mut metrics = AnimatorMetrics::default();
        let mut pending: Vec<AnimEvent> = Vec::new();
        let mut notify_scratch: Vec<(Arc<str>, f32)> = Vec::new();
        let mut query = self.world.query::<(Entity, &mut Animator, &mut BonePose)>();
        for (entity, mut animator, mut pose) in query.iter_mut(&mut self.world) {
            metrics.animators += 1;
            if !animator.playing {
                continue;
            }
            metrics.evaluated += 1;
            animator.source.advance(dt, library, &mut pose.0);

            let Some(clip_key) = animator.source.dominant_clip() else {
                continue;
            };
            let Some(clip) = library.clip(&clip_key) else {
                continue;
            };
            let previous = animator.source.previous_play_time();
            let current = animator.source.current_play_time();
            let looping = animator.source.looping();

            notify_scratch.clear();
            collect_notifies(&clip, previous, current, looping, &mut notify_scratch);
            for (name, time) in notify_scratch.drain(..) {
                metrics.notifies += 1;
                pending.push(AnimEvent::NotifyTriggered {
                    entity,
                    clip: clip_key.clone(),
                    name,
                    time,
                });
            }

            if !looping && previous < clip.play_length && current >= clip.play_length {
                animator.playing = false;
                metrics.finished += 1;
                pending.push(AnimEvent::PlaybackFinished { entity, clip: clip_key.clone() });
            }
        }
        let mut bus = self.world.resource_mut::<EventBus>();
        for event in pending {
            bus.push(event);
        }
        *self.world.resource_mut::<AnimatorMetrics>() = metrics;
    }

    pub fn set_blend_parameter(&mut self, entity: Entity, value: f32) -> bool {
        if let Some(mut animator) = self.world.get_mut::<Animator>(entity) {
            if let AnimSource::Blend1d(space) = &mut animator.source {
                space.set_parameter(value);
                return true;
            }
        }
        false
    }

    pub fn set_blend_parameter_2d(&mut self, entity: Entity, value: Vec2) -> bool {
        if let Some(mut animator) = self.world.get_mut::<Animator>(entity) {
            if let AnimSource::Blend2d(space) = &mut animator.source {
                space.set_parameter(value);
                return true;
            }
        }
        false
    }

    pub fn set_playing(&mut self, entity: Entity, playing: bool) -> bool {
        if let Some(mut animator) = self.world.get_mut::<Animator>(entity) {
            animator.playing = playing;
            true
        } else {
            false
        }
    }

    pub fn set_play_rate(&mut self, entity: Entity, rate: f32) -> bool {
        if let Some(mut animator) = self.world.get_mut::<Animator>(entity) {
            match &mut animator.source {
                AnimSource::Clip(player) => player.set_play_rate(rate),
                AnimSource::Blend1d(space) => space.set_play_rate(rate),
                AnimSource::Blend2d(space) => space.set_play_rate(rate),
            }
            true
        } else {
            false
        }
    }

    pub fn bone_pose(&self, entity: Entity) -> Option<&Pose> {
        self.world.get::<BonePose>(entity).map(|pose| &pose.0)
    }

    pub fn animator_info(&self, entity: Entity) -> Option<AnimatorInfo> {
        let animator = self.world.get::<Animator>(entity)?;
        let skeleton = self.world.get::<SkeletonRef>(entity)?;
        let pose = self.world.get::<BonePose>(entity)?;
        Some(AnimatorInfo {
            skeleton: skeleton.key.clone(),
            playing: animator.playing,
            dominant_clip: animator.source.dominant_clip(),
            play_time: animator.source.current_play_time(),
            joint_count: pose.0.len(),
        })
    }

    pub fn drain_events(&mut self) -> Vec<AnimEvent> {
        self.world.resource_mut::<EventBus>().drain()
    }

    pub fn metrics(&self) -> AnimatorMetrics {
        *self.world.resource::<AnimatorMetrics>()
    }

    pub fn entity_count(&self) -> usize {
        self.world.entities().len() as usize
    }

    pub fn despawn_animator(&mut self, entity: Entity) -> bool {
        self.world.despawn(entity)
    }

    /// Spawns `count` copies of one clip with randomized phase and rate, for
    /// throughput measurements. Returns how many actually spawned.
    pub fn spawn_profiling_rig(
        &mut self,
        library: &AnimationLibrary,
        clip: &str,
        count: usize,
    ) -> usize {
        let Some((clip_data, _)) = library.resolve_clip(clip) else {
            return 0;
        };
        let skeleton = clip_data.skeleton.clone();
        let length = clip_data.play_length.max(f32::EPSILON);
        let mut rng = rand::thread_rng();
        let mut spawned = 0;
        for _ in 0..count {
            let mut player = ClipPlayer::new(clip);
            player.set_time(rng.gen_range(0.0..length));
            player.set_play_rate(rng.gen_range(0.75..1.25));
            if self.spawn_animator(library, &skeleton, AnimSource::Clip(player)).is_some() {
                spawned += 1;
            }
        }
        spawned
    }
}

impl Default for AnimWorld {
    fn default() -> Self {
        Self::new()
    }
}
