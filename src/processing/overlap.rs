//! Visibility decisions for overlapping landmark nodes

use crate::core::{AnchorId, Landmark};
use crate::processing::intersection::{anchor_for_node, Intersections, NodeId, SceneGraph};
use crate::processing::view_scale::z_position_for;
use crate::utils::config::LandmarkerConfig;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Callback for [`OverlappingStrategy::Custom`]: overlapping groups, then independents
pub type OverlapCallback = Arc<dyn Fn(&[Vec<Landmark>], &[Landmark]) + Send + Sync>;

/// How to treat landmarks whose views overlap on screen
#[derive(Clone, Default)]
pub enum OverlappingStrategy {
    /// Show every landmark unchanged
    #[default]
    ShowAll,
    /// Hide all but the nearest landmark of each group
    ShowNearest,
    /// Hide all but the farthest landmark of each group
    ShowFarthest,
    /// Leave visibility to the caller
    Custom(OverlapCallback),
}

impl OverlappingStrategy {
    pub fn custom<F>(callback: F) -> Self
    where
        F: Fn(&[Vec<Landmark>], &[Landmark]) + Send + Sync + 'static,
    {
        OverlappingStrategy::Custom(Arc::new(callback))
    }

    pub fn name(&self) -> &'static str {
        match self {
            OverlappingStrategy::ShowAll => "show_all",
            OverlappingStrategy::ShowNearest => "show_nearest",
            OverlappingStrategy::ShowFarthest => "show_farthest",
            OverlappingStrategy::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for OverlappingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverlappingStrategy::ShowAll => "ShowAll",
            OverlappingStrategy::ShowNearest => "ShowNearest",
            OverlappingStrategy::ShowFarthest => "ShowFarthest",
            OverlappingStrategy::Custom(_) => "Custom(..)",
        })
    }
}

/// Landmark lookup by anchor identifier
pub trait LandmarkLookup {
    fn landmark(&self, id: AnchorId) -> Option<&Landmark>;
}

impl LandmarkLookup for HashMap<AnchorId, Landmark> {
    fn landmark(&self, id: AnchorId) -> Option<&Landmark> {
        self.get(&id)
    }
}

/// Distance band, inclusive at both ends, in which landmarks are shown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRange {
    pub minimum: f64,
    pub maximum: f64,
}

impl VisibleRange {
    pub fn new(minimum: f64, maximum: f64) -> Self {
        Self { minimum, maximum }
    }

    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.minimum && distance <= self.maximum
    }
}

impl Default for VisibleRange {
    fn default() -> Self {
        Self::new(0.0, f64::MAX)
    }
}

/// Visibility and draw order chosen for one node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityDecision {
    pub node: NodeId,
    pub hidden: bool,
    pub z_position: f64,
}

/// Applies the visible-range filter and an overlap strategy to a scan result
#[derive(Debug, Clone)]
pub struct OverlapResolver {
    strategy: OverlappingStrategy,
    visible_range: VisibleRange,
}

impl Default for OverlapResolver {
    fn default() -> Self {
        Self::new(OverlappingStrategy::ShowAll, VisibleRange::default())
    }
}

struct Resolved<'a> {
    node: NodeId,
    landmark: &'a Landmark,
    eligible: bool,
}

impl OverlapResolver {
    pub fn new(strategy: OverlappingStrategy, visible_range: VisibleRange) -> Self {
        Self { strategy, visible_range }
    }

    pub fn from_config(config: &LandmarkerConfig) -> Self {
        Self::new(config.overlapping_strategy.clone(), config.visible_range())
    }

    pub fn strategy(&self) -> &OverlappingStrategy {
        &self.strategy
    }

    pub fn visible_range(&self) -> VisibleRange {
        self.visible_range
    }

    /// Decide visibility for every scanned node that maps to a live landmark.
    ///
    /// Nodes outside the visible range are always hidden. Under `Custom` the
    /// remaining nodes get no decision and the callback is invoked instead.
    pub fn resolve<S, L>(&self, scene: &S, landmarks: &L, intersections: &Intersections) -> Vec<VisibilityDecision>
    where
        S: SceneGraph + ?Sized,
        L: LandmarkLookup + ?Sized,
    {
        let lookup = |node: NodeId| {
            anchor_for_node(scene, node, intersections.generation)
                .and_then(|id| landmarks.landmark(id))
                .map(|landmark| Resolved {
                    node,
                    landmark,
                    eligible: self.visible_range.contains(landmark.distance),
                })
        };
        let groups: Vec<Vec<Resolved>> = intersections
            .groups
            .iter()
            .map(|group| group.iter().filter_map(|&node| lookup(node)).collect())
            .collect();
        let independents: Vec<Resolved> = intersections.independents.iter().filter_map(|&node| lookup(node)).collect();

        let mut decisions = Vec::with_capacity(intersections.node_count());
        let decide = |entry: &Resolved, hidden: bool| VisibilityDecision {
            node: entry.node,
            hidden,
            z_position: z_position_for(entry.landmark.distance),
        };

        for entry in groups.iter().flatten().chain(independents.iter()) {
            if !entry.eligible {
                decisions.push(decide(entry, true));
            }
        }

        match &self.strategy {
            OverlappingStrategy::ShowAll => {
                for entry in groups.iter().flatten().chain(independents.iter()).filter(|e| e.eligible) {
                    decisions.push(decide(entry, false));
                }
            }
            OverlappingStrategy::ShowNearest | OverlappingStrategy::ShowFarthest => {
                let nearest = matches!(self.strategy, OverlappingStrategy::ShowNearest);
                for group in &groups {
                    let mut eligible: Vec<&Resolved> = group.iter().filter(|e| e.eligible).collect();
                    if nearest {
                        eligible.sort_by(|a, b| a.landmark.distance.total_cmp(&b.landmark.distance));
                    } else {
                        eligible.sort_by(|a, b| b.landmark.distance.total_cmp(&a.landmark.distance));
                    }
                    for (rank, entry) in eligible.into_iter().enumerate() {
                        decisions.push(decide(entry, rank > 0));
                    }
                }
                for entry in independents.iter().filter(|e| e.eligible) {
                    decisions.push(decide(entry, false));
                }
            }
            OverlappingStrategy::Custom(callback) => {
                let overlapping: Vec<Vec<Landmark>> = groups
                    .iter()
                    .map(|group| group.iter().filter(|e| e.eligible).map(|e| e.landmark.clone()).collect())
                    .filter(|group: &Vec<Landmark>| !group.is_empty())
                    .collect();
                let free: Vec<Landmark> = independents
                    .iter()
                    .filter(|e| e.eligible)
                    .map(|e| e.landmark.clone())
                    .collect();
                callback(&overlapping, &free);
            }
        }

        decisions
    }

    /// Push decisions to the scene
    pub fn apply<S: SceneGraph + ?Sized>(scene: &mut S, decisions: &[VisibilityDecision]) {
        for decision in decisions {
            scene.set_hidden(decision.node, decision.hidden);
            scene.set_z_position(decision.node, decision.z_position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ContentHandle, GeodeticPoint, Metadata, PlacementTransform};
    use crate::processing::intersection::{IntersectionProbe, SceneIndex};
    use nalgebra::Vector2;
    use std::sync::Mutex;

    struct Fixture {
        scene: SceneIndex,
        landmarks: HashMap<AnchorId, Landmark>,
        nodes: Vec<NodeId>,
    }

    /// One landmark node per distance, all stacked on the same screen spot
    /// unless `spread` pushes them apart
    fn fixture(distances: &[f64], spread: f64) -> Fixture {
        let mut scene = SceneIndex::new();
        let mut landmarks = HashMap::new();
        let mut nodes = Vec::new();

        for (i, &distance) in distances.iter().enumerate() {
            let id = AnchorId::new();
            let root = scene.add_anchor_node(id, Vector2::new(i as f64 * spread, 0.0));
            let node = scene
                .add_node(Some(root), Vector2::zeros(), Vector2::new(10.0, 10.0))
                .unwrap();
            landmarks.insert(
                id,
                Landmark {
                    id,
                    content: ContentHandle(i as u64),
                    location: GeodeticPoint::new(0.0, 0.0),
                    metadata: Metadata::new(),
                    transform: PlacementTransform::identity(),
                    distance,
                },
            );
            nodes.push(node);
        }

        Fixture { scene, landmarks, nodes }
    }

    fn visible(decisions: &[VisibilityDecision]) -> Vec<NodeId> {
        decisions.iter().filter(|d| !d.hidden).map(|d| d.node).collect()
    }

    fn run(fixture: &mut Fixture, resolver: &OverlapResolver) -> Vec<VisibilityDecision> {
        let scan = IntersectionProbe::new(1).scan(&fixture.scene);
        let decisions = resolver.resolve(&fixture.scene, &fixture.landmarks, &scan);
        OverlapResolver::apply(&mut fixture.scene, &decisions);
        decisions
    }

    #[test]
    fn test_show_nearest_keeps_only_nearest() {
        let mut fx = fixture(&[4.0, 8.0, 5.0, 10.0], 1.0);
        let resolver = OverlapResolver::new(OverlappingStrategy::ShowNearest, VisibleRange::new(0.0, f64::MAX));

        let decisions = run(&mut fx, &resolver);
        assert_eq!(decisions.len(), 4);
        assert_eq!(visible(&decisions), vec![fx.nodes[0]]);
        assert_eq!(fx.scene.is_hidden(fx.nodes[0]), Some(false));
        for node in &fx.nodes[1..] {
            assert_eq!(fx.scene.is_hidden(*node), Some(true));
        }
    }

    #[test]
    fn test_show_farthest_keeps_only_farthest() {
        let mut fx = fixture(&[4.0, 8.0, 5.0, 10.0], 1.0);
        let resolver = OverlapResolver::new(OverlappingStrategy::ShowFarthest, VisibleRange::new(0.0, f64::MAX));

        let decisions = run(&mut fx, &resolver);
        assert_eq!(visible(&decisions), vec![fx.nodes[3]]);
    }

    #[test]
    fn test_ties_keep_scan_order() {
        let mut fx = fixture(&[6.0, 6.0, 6.0], 1.0);
        let resolver = OverlapResolver::new(OverlappingStrategy::ShowNearest, VisibleRange::new(0.0, f64::MAX));

        let decisions = run(&mut fx, &resolver);
        assert_eq!(visible(&decisions), vec![fx.nodes[0]]);
    }

    #[test]
    fn test_show_all_reveals_everything() {
        let mut fx = fixture(&[4.0, 8.0, 5.0], 1.0);
        let hide_all = OverlapResolver::new(OverlappingStrategy::ShowNearest, VisibleRange::new(0.0, f64::MAX));
        run(&mut fx, &hide_all);

        let resolver = OverlapResolver::new(OverlappingStrategy::ShowAll, VisibleRange::new(0.0, f64::MAX));
        let decisions = run(&mut fx, &resolver);
        assert_eq!(visible(&decisions).len(), 3);
        assert!(fx.nodes.iter().all(|n| fx.scene.is_hidden(*n) == Some(false)));
    }

    #[test]
    fn test_out_of_range_hidden_under_every_strategy() {
        for strategy in [
            OverlappingStrategy::ShowAll,
            OverlappingStrategy::ShowNearest,
            OverlappingStrategy::ShowFarthest,
            OverlappingStrategy::custom(|_, _| {}),
        ] {
            // Spread apart so every node is independent
            let mut fx = fixture(&[2.0, 20.0, 200.0], 100.0);
            let resolver = OverlapResolver::new(strategy, VisibleRange::new(5.0, 100.0));
            let decisions = run(&mut fx, &resolver);

            assert_eq!(fx.scene.is_hidden(fx.nodes[0]), Some(true));
            assert_eq!(fx.scene.is_hidden(fx.nodes[1]), Some(false));
            assert_eq!(fx.scene.is_hidden(fx.nodes[2]), Some(true));
            assert!(decisions.iter().filter(|d| d.hidden).count() == 2);
        }
    }

    #[test]
    fn test_nearest_ignores_ineligible_members() {
        // The 2m landmark is nearest but below the visible range
        let mut fx = fixture(&[2.0, 9.0, 7.0], 1.0);
        let resolver = OverlapResolver::new(OverlappingStrategy::ShowNearest, VisibleRange::new(5.0, f64::MAX));

        let decisions = run(&mut fx, &resolver);
        assert_eq!(visible(&decisions), vec![fx.nodes[2]]);
    }

    #[test]
    fn test_custom_receives_eligible_landmarks() {
        let seen: Arc<Mutex<Vec<(Vec<Vec<f64>>, Vec<f64>)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let strategy = OverlappingStrategy::custom(move |groups, free| {
            let groups = groups
                .iter()
                .map(|g| g.iter().map(|l| l.distance).collect())
                .collect();
            let free = free.iter().map(|l| l.distance).collect();
            sink.lock().unwrap().push((groups, free));
        });

        let mut fx = fixture(&[4.0, 8.0], 1.0);
        let far_root = fx.scene.add_anchor_node(AnchorId::new(), Vector2::new(500.0, 500.0));
        fx.scene
            .add_node(Some(far_root), Vector2::zeros(), Vector2::new(10.0, 10.0))
            .unwrap();

        let resolver = OverlapResolver::new(strategy, VisibleRange::new(0.0, 6.0));
        let decisions = run(&mut fx, &resolver);

        // Only the 8m node is decided; the callback owns the rest
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].node, fx.nodes[1]);
        assert!(decisions[0].hidden);

        let calls = seen.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, vec![vec![4.0]]);
        // The node with no registered landmark is skipped
        assert!(calls[0].1.is_empty());
    }

    #[test]
    fn test_z_positions_follow_distance() {
        let mut fx = fixture(&[4.0, 8.0], 100.0);
        let resolver = OverlapResolver::default();
        run(&mut fx, &resolver);

        let near = fx.scene.z_position(fx.nodes[0]).unwrap();
        let far = fx.scene.z_position(fx.nodes[1]).unwrap();
        assert!(near > far);
    }

    #[test]
    fn test_strategy_debug_and_name() {
        assert_eq!(format!("{:?}", OverlappingStrategy::ShowNearest), "ShowNearest");
        assert_eq!(format!("{:?}", OverlappingStrategy::custom(|_, _| {})), "Custom(..)");
        assert_eq!(OverlappingStrategy::default().name(), "show_all");
    }
}
