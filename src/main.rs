use geo_landmarks::api::{CallbackDelegate, Landmarker, LandmarkerEvent};
use geo_landmarks::core::{AnchorId, ContentHandle, GeodeticPoint, Metadata};
use geo_landmarks::processing::{OverlappingStrategy, SceneGraph, SceneIndex};
use geo_landmarks::session::MockTrackingSession;
use geo_landmarks::utils::ConfigurationManager;
use nalgebra::Vector2;
use std::collections::HashSet;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Screen pixels per meter of horizontal offset in the top-down demo projection
const PIXELS_PER_METER: f64 = 4.0;

const MARKER_SIZE: f64 = 48.0;

/// Landmarks around a small city square, east/north of the walk's start
const LANDMARKS: &[(&str, f64, f64)] = &[
    ("Clock tower", 45.42150, -75.69720),
    ("Fountain", 45.42160, -75.69715),
    ("Library", 45.42210, -75.69650),
    ("Bridge", 45.41980, -75.69400),
];

fn walk() -> Vec<GeodeticPoint> {
    (0..12)
        .map(|step| {
            let t = step as f64;
            GeodeticPoint::new(45.42100 + t * 0.00006, -75.69800 + t * 0.00004)
                .with_accuracy(if step == 3 { 120.0 } else { 4.0 })
                .with_timestamp(step * 1_000)
        })
        .collect()
}

/// Attach scene nodes for every landmark the scene does not show yet
fn attach_new_nodes(landmarker: &mut Landmarker<MockTrackingSession, SceneIndex>, attached: &mut HashSet<AnchorId>) {
    attached.retain(|id| landmarker.landmark(*id).is_some());
    let fresh: Vec<_> = landmarker
        .current_landmarks()
        .into_iter()
        .filter(|landmark| !attached.contains(&landmark.id))
        .collect();

    for landmark in fresh {
        let translation = landmark.transform.translation();
        let screen = Vector2::new(translation.x, translation.z) * PIXELS_PER_METER;
        let scene = landmarker.scene_mut();
        let root = scene.add_anchor_node(landmark.id, screen);
        scene.add_node(Some(root), Vector2::zeros(), Vector2::new(MARKER_SIZE, MARKER_SIZE));
        attached.insert(landmark.id);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut config = ConfigurationManager::new();
    match args.len() {
        1 => {}
        2 => {
            let content = std::fs::read_to_string(&args[1])?;
            config.load_json(&content)?;
        }
        _ => {
            eprintln!("Usage: {} [config.json]", args.first().map_or("geo-landmarks", |s| s.as_str()));
            return Err("Invalid arguments".into());
        }
    }
    config.set_overlapping_strategy(OverlappingStrategy::ShowNearest);

    let delegate = CallbackDelegate::new()
        .on_added(|ticket, landmark| info!(%ticket, id = %landmark.id, distance = landmark.distance, "Landmark placed"))
        .on_failure(|error| info!(%error, "Landmarker reported a failure"))
        .on_recenter(|report| info!(recreated = report.recreated.len(), "Recentered"))
        .on_update(|landmark, location| {
            info!(id = %landmark.id, latitude = location.latitude, longitude = location.longitude, "Observer moved");
            None
        });

    let mut landmarker = Landmarker::new(MockTrackingSession::new(), SceneIndex::new(), config.config().clone())?
        .with_delegate(delegate);

    for (index, (name, latitude, longitude)) in LANDMARKS.iter().enumerate() {
        let mut metadata = Metadata::new();
        metadata.insert("name".to_string(), serde_json::json!(name));
        landmarker.submit_landmark(metadata, ContentHandle(index as u64), GeodeticPoint::new(*latitude, *longitude));
    }

    let sender = landmarker.event_sender();
    let mut attached = HashSet::new();

    for fix in walk() {
        sender.send(LandmarkerEvent::LocationUpdate(vec![fix]))?;
        landmarker.pump();
        attach_new_nodes(&mut landmarker, &mut attached);

        let decisions = landmarker.run_probe_cycle();
        let hidden = decisions.iter().filter(|d| d.hidden).count();
        info!(
            latitude = fix.latitude,
            longitude = fix.longitude,
            landmarks = landmarker.current_landmarks().len(),
            hidden,
            "Walk step"
        );
    }

    for landmark in landmarker.current_landmarks() {
        let name = landmark.metadata.get("name").and_then(|v| v.as_str()).unwrap_or("?");
        let scene = landmarker.scene();
        let node = scene
            .node_for_anchor(landmark.id)
            .and_then(|root| scene.children(root).first().copied());
        let hidden = node.and_then(|n| scene.is_hidden(n)).unwrap_or(true);
        println!(
            "{:<12} {:>8.1} m  {}",
            name,
            landmark.distance,
            if hidden { "hidden" } else { "visible" }
        );
    }

    Ok(())
}
