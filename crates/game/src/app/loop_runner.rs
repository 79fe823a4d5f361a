use std::process::ExitCode;

use thiserror::Error;
use tileworld::{
    DefinitionError, Direction, FireOutcome, MapLoadError, MapLoader, MapTransitionCoordinator,
    TilePos, TransitionError, TransitionOutcome, World, WorldServices,
};
use tracing::{debug, error, info, warn};

use super::bootstrap::AppWiring;
use super::services::{FileMapLoader, HeadlessServices};

#[derive(Debug, Error)]
pub(crate) enum RunError {
    #[error("failed to build async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to load start map '{map}': {source}")]
    StartMapLoad {
        map: String,
        #[source]
        source: MapLoadError,
    },
    #[error("failed to mount start map '{map}': {source}")]
    StartMapMount {
        map: String,
        #[source]
        source: DefinitionError,
    },
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RouteSummary {
    pub(crate) steps: usize,
    pub(crate) events_fired: usize,
    pub(crate) teleports: usize,
    pub(crate) final_map: Option<String>,
    pub(crate) final_tile: TilePos,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match run_route(app) {
        Ok(summary) => {
            info!(
                steps = summary.steps,
                events_fired = summary.events_fired,
                teleports = summary.teleports,
                map = summary.final_map.as_deref().unwrap_or("<none>"),
                x = summary.final_tile.x,
                y = summary.final_tile.y,
                "route_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "route_failed");
            ExitCode::FAILURE
        }
    }
}

fn run_route(app: AppWiring) -> Result<RouteSummary, RunError> {
    let AppWiring {
        paths,
        mut world,
        start_map,
        route,
    } = app;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(RunError::Runtime)?;
    let mut loader = FileMapLoader::new(paths);
    let mut services = HeadlessServices::default();

    runtime.block_on(async {
        enter_start_map(&mut world, &start_map, &mut loader).await?;
        drive_route(&mut world, &route, &mut services, &mut loader).await
    })
}

pub(crate) async fn enter_start_map<L: MapLoader>(
    world: &mut World,
    key: &str,
    loader: &mut L,
) -> Result<(), RunError> {
    let definition = loader
        .load_map(key)
        .await
        .map_err(|source| RunError::StartMapLoad {
            map: key.to_string(),
            source,
        })?;
    let layer = world.hero().collision_layer;
    world
        .enter_map(&definition, layer)
        .map_err(|source| RunError::StartMapMount {
            map: key.to_string(),
            source,
        })?;
    let tile = world.hero().tile;
    world.hero_mut().place_on_tile(tile);
    Ok(())
}

/// Walks the hero one tile per entry of `route`, running every teleport the
/// walk arms before taking the next step.
pub(crate) async fn drive_route<S, L>(
    world: &mut World,
    route: &[Direction],
    services: &mut S,
    loader: &mut L,
) -> Result<RouteSummary, RunError>
where
    S: WorldServices,
    L: MapLoader,
{
    let mut coordinator = MapTransitionCoordinator::new(world.config());
    let mut summary = RouteSummary::default();

    for (step, direction) in route.iter().copied().enumerate() {
        summary.steps += 1;
        match world.move_hero(direction) {
            FireOutcome::Ignored(reason) => {
                debug!(step, direction = direction.label(), reason = ?reason, "step_quiet");
            }
            FireOutcome::Teleport(plan) => {
                summary.events_fired += 1;
                // Nothing simulates bodies here, so a door is always walked into.
                world.hero_mut().stopped_by_colliding = plan.advance_effect;
                match coordinator.run(world, plan, services, loader).await? {
                    TransitionOutcome::Completed { map, tile } => {
                        summary.teleports += 1;
                        info!(step, map = %map, x = tile.x, y = tile.y, "route_teleported");
                    }
                    TransitionOutcome::NotStoppedByCollision => {
                        warn!(step, "route_teleport_skipped");
                    }
                }
            }
            outcome => {
                summary.events_fired += 1;
                info!(
                    step,
                    direction = direction.label(),
                    outcome = outcome.label(),
                    "step_fired"
                );
            }
        }
    }

    summary.final_map = world.map().map(|map| map.key().to_string());
    summary.final_tile = world.hero().tile;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use serde_json::json;
    use tempfile::TempDir;
    use tileworld::{
        CollisionLayer, ContentPaths, DefinitionTables, Hero, MemoryStorage, WorldConfig,
    };

    use super::*;
    use crate::app::services::LoggingScripts;

    fn write_map(paths: &ContentPaths, map: serde_json::Value) {
        let key = map["key"].as_str().expect("key").to_string();
        fs::write(paths.map_file(&key), map.to_string()).expect("write map");
    }

    fn content() -> (TempDir, ContentPaths) {
        let temp = TempDir::new().expect("temp");
        let paths = ContentPaths::from_root(temp.path().to_path_buf());
        fs::create_dir_all(&paths.maps_dir).expect("mkdir");
        write_map(
            &paths,
            json!({
                "key": "madra",
                "width": 20,
                "height": 15,
                "interactable_objects": [{"key_name": "ledge", "x": 8, "y": 7}],
                "tile_events": [
                    {"type": "teleport", "x": 6, "y": 4, "activation_directions": ["up"],
                     "target": "inn", "x_target": 4, "y_target": 9, "advance_effect": true}
                ]
            }),
        );
        write_map(
            &paths,
            json!({
                "key": "inn",
                "width": 8,
                "height": 12,
                "tile_events": [
                    {"type": "teleport", "x": 4, "y": 10, "activation_directions": ["down"],
                     "target": "madra", "x_target": 6, "y_target": 5}
                ]
            }),
        );
        (temp, paths)
    }

    fn world() -> World {
        let ledge = serde_json::from_value(json!({
            "key_name": "ledge",
            "events": [{"type": "jump"}]
        }))
        .expect("ledge def");
        let tables = DefinitionTables::from_defs(vec![ledge], Vec::new()).expect("tables");
        let config = WorldConfig {
            door_slide_duration_ms: 0,
            ..WorldConfig::default()
        };
        World::new(
            config,
            tables,
            Box::new(MemoryStorage::new()),
            Box::new(LoggingScripts),
            Hero::new(TilePos::new(10, 7), CollisionLayer(0)),
        )
    }

    fn route(labels: &[&str]) -> Vec<Direction> {
        labels
            .iter()
            .map(|label| Direction::from_label(label).expect("direction"))
            .collect()
    }

    #[tokio::test]
    async fn route_jumps_and_round_trips_through_the_inn() {
        let (_temp, paths) = content();
        let mut loader = FileMapLoader::new(paths);
        let mut services = HeadlessServices::with_durations(Duration::ZERO, Duration::ZERO);
        let mut world = world();

        enter_start_map(&mut world, "madra", &mut loader)
            .await
            .expect("start map");
        let summary = drive_route(
            &mut world,
            &route(&["left", "left", "up", "up", "up", "down"]),
            &mut services,
            &mut loader,
        )
        .await
        .expect("route");

        assert_eq!(summary.steps, 6);
        assert_eq!(summary.events_fired, 3);
        assert_eq!(summary.teleports, 2);
        assert_eq!(summary.final_map.as_deref(), Some("madra"));
        assert_eq!(summary.final_tile, TilePos::new(6, 5));
        assert_eq!(world.hero().direction, Direction::Down);
        assert!(world.gates().movement_allowed());
        assert!(!services.physics_paused());
    }

    #[tokio::test]
    async fn missing_destination_map_fails_the_route_and_frees_movement() {
        let (_temp, paths) = content();
        fs::remove_file(paths.map_file("inn")).expect("remove inn");
        let mut loader = FileMapLoader::new(paths);
        let mut services = HeadlessServices::with_durations(Duration::ZERO, Duration::ZERO);
        let mut world = world();
        world.hero_mut().place_on_tile(TilePos::new(6, 5));

        enter_start_map(&mut world, "madra", &mut loader)
            .await
            .expect("start map");
        let err = drive_route(&mut world, &route(&["up"]), &mut services, &mut loader)
            .await
            .expect_err("inn is gone");

        assert!(matches!(
            err,
            RunError::Transition(TransitionError::Load { ref target, .. }) if target == "inn"
        ));
        assert!(world.gates().movement_allowed());
        assert!(world.map().is_none());
    }

    #[tokio::test]
    async fn unknown_start_map_is_reported() {
        let (_temp, paths) = content();
        let mut loader = FileMapLoader::new(paths);
        let mut world = world();
        let err = enter_start_map(&mut world, "atlantis", &mut loader)
            .await
            .expect_err("no such map");
        assert!(matches!(
            err,
            RunError::StartMapLoad {
                ref map,
                source: MapLoadError::NotFound { .. },
            } if map == "atlantis"
        ));
    }
}
