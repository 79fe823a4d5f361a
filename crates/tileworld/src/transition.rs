//! Teleport choreography: slide through the door, fade out, swap maps,
//! reposition the hero, fade back in.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::collision::CollisionLayer;
use crate::config::WorldConfig;
use crate::content::{DefinitionError, MapDefinition};
use crate::events::TileEventId;
use crate::session::EventGuard;
use crate::tile::{Direction, TilePos, Vec2};
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeleportPhase {
    Idle,
    Armed,
    Advancing,
    CrossFadingOut,
    MapSwapping,
    Repositioning,
    CrossFadingIn,
}

impl TeleportPhase {
    pub fn label(self) -> &'static str {
        match self {
            TeleportPhase::Idle => "idle",
            TeleportPhase::Armed => "armed",
            TeleportPhase::Advancing => "advancing",
            TeleportPhase::CrossFadingOut => "cross_fading_out",
            TeleportPhase::MapSwapping => "map_swapping",
            TeleportPhase::Repositioning => "repositioning",
            TeleportPhase::CrossFadingIn => "cross_fading_in",
        }
    }
}

impl fmt::Display for TeleportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An armed teleport. Holds the session gates raised by the firing event;
/// they drop back when the plan (or the coordinator run consuming it) ends.
#[derive(Debug)]
pub struct TeleportPlan {
    pub event_id: TileEventId,
    pub event_position: TilePos,
    pub target: String,
    pub target_pos: TilePos,
    pub destination_layer: CollisionLayer,
    pub destination_direction: Direction,
    pub advance_effect: bool,
    pub(crate) guard: EventGuard,
}

#[derive(Debug, Error)]
pub enum MapLoadError {
    #[error("map '{key}' was not found")]
    NotFound { key: String },
    #[error("failed to read map file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("map '{key}' is malformed: {source}")]
    Malformed {
        key: String,
        #[source]
        source: DefinitionError,
    },
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("failed to load destination map '{target}': {source}")]
    Load {
        target: String,
        #[source]
        source: MapLoadError,
    },
    #[error("failed to mount destination map '{target}': {source}")]
    Mount {
        target: String,
        #[source]
        source: DefinitionError,
    },
}

/// Produces map definitions by key. The only long-latency call of a transition.
#[allow(async_fn_in_trait)]
pub trait MapLoader {
    async fn load_map(&mut self, key: &str) -> Result<MapDefinition, MapLoadError>;
}

/// Physics, audio, camera and animation collaborators driven by a transition.
#[allow(async_fn_in_trait)]
pub trait WorldServices {
    fn play_sound(&mut self, key: &str);
    fn pause_physics(&mut self);
    fn resume_physics(&mut self);
    fn open_door(&mut self, door: TilePos);
    async fn slide_hero(&mut self, to: Vec2, duration: Duration);
    async fn fade_out(&mut self);
    async fn flash(&mut self);

    fn finish_reveal(&mut self) {}

    fn phase_changed(&mut self, _phase: TeleportPhase) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Completed { map: String, tile: TilePos },
    /// A door teleport the hero did not actually walk into.
    NotStoppedByCollision,
}

/// Runs armed teleports to completion, one at a time.
#[derive(Debug)]
pub struct MapTransitionCoordinator {
    phase: TeleportPhase,
    slide_duration: Duration,
    slide_rise_px: f32,
    open_door_sound: String,
    default_door_sound: String,
}

impl MapTransitionCoordinator {
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            phase: TeleportPhase::Idle,
            slide_duration: config.door_slide_duration(),
            slide_rise_px: config.door_slide_rise_px,
            open_door_sound: config.door_open_sound.clone(),
            default_door_sound: config.door_default_sound.clone(),
        }
    }

    pub fn phase(&self) -> TeleportPhase {
        self.phase
    }

    /// Drives `plan` through every phase. The session gates clear, physics
    /// resumes and the phase returns to idle on every exit path, including
    /// load failures and the future being dropped mid-run.
    pub async fn run<S, L>(
        &mut self,
        world: &mut World,
        plan: TeleportPlan,
        services: &mut S,
        loader: &mut L,
    ) -> Result<TransitionOutcome, TransitionError>
    where
        S: WorldServices,
        L: MapLoader,
    {
        let TeleportPlan {
            event_id,
            event_position,
            target,
            target_pos,
            destination_layer,
            destination_direction,
            advance_effect,
            guard,
        } = plan;
        let mut scope = RunScope {
            phase: &mut self.phase,
            services,
            physics_paused: false,
        };
        scope.enter(TeleportPhase::Armed);
        info!(
            event_id = event_id.0,
            destination = %target,
            x_target = target_pos.x,
            y_target = target_pos.y,
            advance_effect,
            "teleport_started"
        );

        if advance_effect {
            scope.services.play_sound(&self.open_door_sound);
            if !world.hero().stopped_by_colliding {
                scope.enter(TeleportPhase::Idle);
                drop(guard);
                return Ok(TransitionOutcome::NotStoppedByCollision);
            }
            scope.enter(TeleportPhase::Advancing);
            world.hero_mut().direction = Direction::Up;
            scope.services.open_door(event_position);
            scope.pause_physics();
            let tile_width = world
                .map()
                .map_or(world.config().default_tile_width, |map| map.tile_width());
            let slide_to = Vec2 {
                x: tile_width * (event_position.x as f32 + 0.5),
                y: world.hero().position.y - self.slide_rise_px,
            };
            scope.services.slide_hero(slide_to, self.slide_duration).await;
            world.hero_mut().position = slide_to;
        } else {
            scope.services.play_sound(&self.default_door_sound);
        }

        scope.enter(TeleportPhase::CrossFadingOut);
        scope.services.fade_out().await;
        if world.hero().on_reveal {
            scope.services.finish_reveal();
            world.toggle_reveal();
        }
        world.hero_mut().direction = destination_direction;

        scope.enter(TeleportPhase::MapSwapping);
        scope.pause_physics();
        world.hero_mut().collision_layer = destination_layer;
        world.unmount_map();
        let definition = match loader.load_map(&target).await {
            Ok(definition) => definition,
            Err(source) => {
                error!(map = %target, error = %source, "teleport_map_load_failed");
                scope.resume_physics();
                scope.enter(TeleportPhase::Idle);
                drop(guard);
                return Err(TransitionError::Load { target, source });
            }
        };
        if let Err(source) = world.enter_map(&definition, destination_layer) {
            error!(map = %target, error = %source, "teleport_map_mount_failed");
            scope.resume_physics();
            scope.enter(TeleportPhase::Idle);
            drop(guard);
            return Err(TransitionError::Mount { target, source });
        }

        scope.enter(TeleportPhase::Repositioning);
        world.hero_mut().place_on_tile(target_pos);
        world.hero_mut().stopped_by_colliding = false;
        scope.resume_physics();

        scope.enter(TeleportPhase::CrossFadingIn);
        scope.services.flash().await;

        scope.enter(TeleportPhase::Idle);
        drop(guard);
        info!(map = %target, x = target_pos.x, y = target_pos.y, "teleport_finished");
        Ok(TransitionOutcome::Completed {
            map: target,
            tile: target_pos,
        })
    }
}

/// Borrows the coordinator's phase and the services for one run. Dropped
/// before the run reaches idle, it resumes physics and resets the phase.
struct RunScope<'a, S: WorldServices> {
    phase: &'a mut TeleportPhase,
    services: &'a mut S,
    physics_paused: bool,
}

impl<S: WorldServices> RunScope<'_, S> {
    fn enter(&mut self, phase: TeleportPhase) {
        *self.phase = phase;
        self.services.phase_changed(phase);
        info!(phase = phase.label(), "teleport_phase");
    }

    fn pause_physics(&mut self) {
        if !self.physics_paused {
            self.services.pause_physics();
            self.physics_paused = true;
        }
    }

    fn resume_physics(&mut self) {
        if self.physics_paused {
            self.services.resume_physics();
            self.physics_paused = false;
        }
    }
}

impl<S: WorldServices> Drop for RunScope<'_, S> {
    fn drop(&mut self) {
        if !self.physics_paused && *self.phase == TeleportPhase::Idle {
            return;
        }
        warn!(phase = self.phase.label(), "teleport_abandoned");
        self.resume_physics();
        self.enter(TeleportPhase::Idle);
    }
}
