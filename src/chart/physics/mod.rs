mod forces;
mod quadtree;

use eframe::egui::Vec2;

use forces::ChargeParams;
use quadtree::QuadNode;

use super::lifecycle::{Node, NodeState};
use super::regions::ClassifierRegion;

/// Energy injected by `restart`; decays geometrically each tick.
const START_ALPHA: f32 = 0.1;
const ALPHA_DECAY: f32 = 0.99;
const ALPHA_MIN: f32 = 0.005;

/// Exiting opacity decays toward this, never exactly zero.
const OPACITY_FLOOR: f32 = 1e-6;

/// Force primitive constants. Gravity pulls toward the canvas center,
/// charge repels within the calibrated cutoff, friction damps the charge
/// nudges, and the velocity factor scales per-frame target seeking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceConfig {
    pub gravity: f32,
    pub charge: f32,
    pub friction: f32,
    pub velocity_factor: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            gravity: 0.0,
            charge: -100.0,
            friction: 0.8,
            velocity_factor: 0.8,
        }
    }
}

/// The host force primitive: owns the alpha schedule and the forces that are
/// not node-state aware (charge, gravity). Restarting re-energizes motion
/// without touching positions; the loop goes idle as alpha decays under
/// `ALPHA_MIN`.
#[derive(Debug)]
pub(in crate::chart) struct Simulation {
    alpha: f32,
    charge_distance: f32,
    center: Vec2,
    config: ForceConfig,
}

impl Simulation {
    pub(in crate::chart) fn new(config: ForceConfig, center: Vec2) -> Self {
        Self {
            alpha: 0.0,
            charge_distance: 0.0,
            center,
            config,
        }
    }

    pub(in crate::chart) fn restart(&mut self) {
        self.alpha = START_ALPHA;
    }

    pub(in crate::chart) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(in crate::chart) fn is_active(&self) -> bool {
        self.alpha >= ALPHA_MIN
    }

    pub(in crate::chart) fn set_charge_distance(&mut self, distance: f32) {
        self.charge_distance = distance.max(0.0);
    }

    pub(in crate::chart) fn set_center(&mut self, center: Vec2) {
        self.center = center;
    }

    fn cool(&mut self) -> Option<f32> {
        if !self.is_active() {
            return None;
        }
        let alpha = self.alpha;
        self.alpha *= ALPHA_DECAY;
        Some(alpha)
    }
}

/// Per-frame buffers, reused across ticks.
#[derive(Debug, Default)]
pub(in crate::chart) struct LayoutScratch {
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    nudges: Vec<Vec2>,
    sources: Vec<usize>,
}

/// The target a node seeks: the exit point while Exiting, otherwise the
/// center of its classifier's region. Pure in the node, the current regions
/// and the configured points.
pub(in crate::chart) fn target_position(
    node: &Node,
    regions: &[ClassifierRegion],
    exit_point: Vec2,
    fallback: Vec2,
) -> Vec2 {
    match node.state {
        NodeState::Exiting => exit_point,
        NodeState::Entering | NodeState::Updating => regions
            .iter()
            .find(|region| region.name == node.classifier)
            .map(|region| region.center().to_vec2())
            .unwrap_or(fallback),
    }
}

/// One integration step: charge and gravity from the force primitive, then
/// state-aware target seeking and opacity decay, then the collision pass.
/// Returns the alpha the frame ran at, or None when the schedule is idle.
pub(in crate::chart) fn step_layout(
    sim: &mut Simulation,
    nodes: &mut [Node],
    regions: &[ClassifierRegion],
    exit_point: Vec2,
    max_radius: f32,
    scratch: &mut LayoutScratch,
) -> Option<f32> {
    let alpha = sim.cool()?;
    let velocity = alpha * sim.config.velocity_factor;

    scratch.positions.clear();
    scratch.radii.clear();
    for node in nodes.iter() {
        scratch.positions.push(node.pos);
        scratch.radii.push(node.radius);
    }

    if sim.config.charge != 0.0 && sim.charge_distance > 0.0 {
        let params = ChargeParams {
            strength: sim.config.charge,
            max_distance_sq: sim.charge_distance * sim.charge_distance,
            alpha,
        };
        let all = (0..scratch.positions.len()).collect::<Vec<_>>();
        if let Some(tree) = QuadNode::build(&scratch.positions, all) {
            scratch.nudges.clear();
            scratch.nudges.resize(scratch.positions.len(), Vec2::ZERO);
            for (index, nudge) in scratch.nudges.iter_mut().enumerate() {
                forces::accumulate_charge(&tree, index, &scratch.positions, params, nudge);
            }
            for (position, nudge) in scratch.positions.iter_mut().zip(&scratch.nudges) {
                *position += *nudge * sim.config.friction;
            }
        }
    }

    if sim.config.gravity > 0.0 {
        let pull = sim.config.gravity * alpha;
        for position in scratch.positions.iter_mut() {
            *position += (sim.center - *position) * pull;
        }
    }

    for (index, node) in nodes.iter_mut().enumerate() {
        let target = target_position(node, regions, exit_point, sim.center);
        let current = scratch.positions[index];
        scratch.positions[index] += (target - current) * velocity;
        if node.state == NodeState::Exiting {
            node.opacity += (OPACITY_FLOOR - node.opacity) * velocity;
        }
    }

    scratch.sources.clear();
    scratch.sources.extend(
        nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.state == NodeState::Updating)
            .map(|(index, _)| index),
    );
    if let Some(tree) = QuadNode::build(&scratch.positions, scratch.sources.clone()) {
        forces::resolve_collisions(
            &mut scratch.positions,
            &scratch.radii,
            &tree,
            max_radius,
            velocity,
        );
    }

    for (node, &position) in nodes.iter_mut().zip(&scratch.positions) {
        node.pos = position;
    }

    Some(alpha)
}
