use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

const BARNES_HUT_THETA: f32 = 0.81;
const MIN_DISTANCE_SQ: f32 = 1.0;

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    /// Signed charge; negative repels (the original's -100).
    pub(super) strength: f32,
    /// Interactions beyond this distance are dropped, keeping repulsion
    /// inside a classifier region.
    pub(super) max_distance_sq: f32,
    pub(super) alpha: f32,
}

fn charge_between(point: Vec2, other: Vec2, mass: f32, params: ChargeParams) -> Vec2 {
    let delta = point - other;
    let distance_sq = delta.length_sq();
    if distance_sq > params.max_distance_sq {
        return Vec2::ZERO;
    }
    let distance_sq = distance_sq.max(MIN_DISTANCE_SQ);
    delta * (-params.strength * mass * params.alpha / distance_sq)
}

/// Accumulates the charge nudge on one node, Barnes-Hut style: distant cells
/// act as their center of mass, near cells are descended.
pub(super) fn accumulate_charge(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    nudge: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            *nudge += charge_between(point, positions[other_index], 1.0, params);
        }
        return;
    }

    let delta = point - node.center_of_mass;
    let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
    let distance = distance_sq.sqrt();
    let can_approximate = !node.bounds.contains(point)
        && ((node.bounds.side_length() / distance) < BARNES_HUT_THETA)
        && node.mass > 1.0;

    if can_approximate {
        *nudge += charge_between(point, node.center_of_mass, node.mass, params);
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_charge(child, index, positions, params, nudge);
    }
}

/// Deterministic direction for coincident centers.
fn separation_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * TAU;
    vec2(angle.cos(), angle.sin())
}

/// Pairwise overlap correction. `tree` indexes collision sources (Updating
/// nodes only); every node queries a reach box of `own + 2 × max_radius` and
/// any candidate closer than `own + other + max_radius` pushes both apart
/// along the connecting line, scaled by the frame velocity. The outer node
/// applies the correction to itself immediately, so passes are
/// order-dependent but converge over successive frames.
pub(super) fn resolve_collisions(
    positions: &mut [Vec2],
    radii: &[f32],
    tree: &QuadNode,
    max_radius: f32,
    velocity: f32,
) {
    for index in 0..positions.len() {
        let reach = radii[index] + 2.0 * max_radius;
        let min = positions[index] - vec2(reach, reach);
        let max = positions[index] + vec2(reach, reach);

        tree.visit_within(min, max, &mut |other| {
            if other == index {
                return;
            }

            let delta = positions[index] - positions[other];
            let distance = delta.length();
            let min_distance = radii[index] + radii[other] + max_radius;
            if distance >= min_distance {
                return;
            }

            let direction = if distance > 1e-4 {
                delta / distance
            } else {
                separation_direction(index, other)
            };
            let shift = direction * ((distance - min_distance) * velocity);
            positions[index] -= shift;
            positions[other] += shift;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_repels_within_cutoff_and_not_beyond() {
        let positions = vec![vec2(0.0, 0.0), vec2(30.0, 0.0)];
        let tree = QuadNode::build(&positions, vec![0, 1]).unwrap();
        let params = ChargeParams {
            strength: -100.0,
            max_distance_sq: 100.0 * 100.0,
            alpha: 0.1,
        };

        let mut nudge = Vec2::ZERO;
        accumulate_charge(&tree, 0, &positions, params, &mut nudge);
        assert!(nudge.x < 0.0, "node 0 should be pushed away from node 1");

        let far = ChargeParams {
            max_distance_sq: 10.0 * 10.0,
            ..params
        };
        let mut nudge = Vec2::ZERO;
        accumulate_charge(&tree, 0, &positions, far, &mut nudge);
        assert_eq!(nudge, Vec2::ZERO);
    }

    #[test]
    fn overlapping_nodes_separate_monotonically_until_clear() {
        let mut positions = vec![vec2(100.0, 100.0), vec2(104.0, 100.0)];
        let radii = vec![10.0, 8.0];
        let max_radius = 10.0;
        let velocity = 0.08;
        let min_distance = radii[0] + radii[1] + max_radius;

        let mut previous = (positions[0] - positions[1]).length();
        for _ in 0..400 {
            let tree = QuadNode::build(&positions, vec![0, 1]).unwrap();
            resolve_collisions(&mut positions, &radii, &tree, max_radius, velocity);
            let separation = (positions[0] - positions[1]).length();
            if separation >= min_distance - 1e-3 {
                return;
            }
            assert!(
                separation > previous,
                "separation must strictly increase while overlapping"
            );
            previous = separation;
        }
        panic!("nodes never cleared the overlap");
    }

    #[test]
    fn coincident_nodes_still_separate() {
        let mut positions = vec![vec2(50.0, 50.0), vec2(50.0, 50.0)];
        let radii = vec![6.0, 6.0];
        for _ in 0..600 {
            let tree = QuadNode::build(&positions, vec![0, 1]).unwrap();
            resolve_collisions(&mut positions, &radii, &tree, 6.0, 0.08);
        }
        assert!((positions[0] - positions[1]).length() > 1.0);
    }

    #[test]
    fn separated_nodes_are_left_alone() {
        let mut positions = vec![vec2(0.0, 0.0), vec2(500.0, 0.0)];
        let radii = vec![5.0, 5.0];
        let tree = QuadNode::build(&positions, vec![0, 1]).unwrap();
        resolve_collisions(&mut positions, &radii, &tree, 5.0, 0.08);
        assert_eq!(positions[0], vec2(0.0, 0.0));
        assert_eq!(positions[1], vec2(500.0, 0.0));
    }
}
