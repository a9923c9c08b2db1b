use std::collections::HashMap;

use eframe::egui::{Color32, Rect, Vec2, pos2, vec2};

use crate::data::{self, DataRecord};
use crate::error::ChartError;

mod fill;
mod lifecycle;
mod physics;
mod regions;
mod scale;

pub use fill::{CATEGORY_PALETTE, FillRegistry};
pub use lifecycle::{Node, NodeState};
pub use physics::ForceConfig;
pub use regions::ClassifierRegion;
pub use scale::RadiusScale;

use lifecycle::ReconcileParams;
use physics::{LayoutScratch, Simulation};

/// Chart construction options. Field names refer to keys of the incoming
/// [`DataRecord`]s.
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Canvas size in pixels.
    pub width: f32,
    pub height: f32,
    /// Initial dataset; may be empty.
    pub data: Vec<DataRecord>,
    /// Ordered fields whose joined values form a node's unique key.
    pub identity_fields: Vec<String>,
    /// Ordered fields joined into the tooltip text.
    pub tooltip_fields: Vec<String>,
    /// Field grouping nodes into regions.
    pub classifier_field: String,
    /// Field driving bubble radius.
    pub size_field: String,
    /// Field driving the fill category.
    pub color_field: String,
    /// Where entering nodes spawn.
    pub origin: Vec2,
    /// Where exiting nodes drift while fading out.
    pub exit_point: Vec2,
    pub force: ForceConfig,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 600.0,
            data: Vec::new(),
            identity_fields: Vec::new(),
            tooltip_fields: Vec::new(),
            classifier_field: String::new(),
            size_field: String::new(),
            color_field: String::new(),
            origin: Vec2::ZERO,
            exit_point: Vec2::ZERO,
            force: ForceConfig::default(),
        }
    }
}

impl ChartOptions {
    fn validate(&self) -> Result<(), ChartError> {
        if !(self.width.is_finite() && self.width > 0.0)
            || !(self.height.is_finite() && self.height > 0.0)
        {
            return Err(ChartError::Configuration(format!(
                "canvas size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.identity_fields.is_empty()
            || self.identity_fields.iter().any(|field| field.trim().is_empty())
        {
            return Err(ChartError::Configuration(
                "identity_fields must name at least one non-empty field".to_string(),
            ));
        }
        if self.classifier_field.trim().is_empty() {
            return Err(ChartError::Configuration(
                "classifier_field must be set".to_string(),
            ));
        }
        if self.size_field.trim().is_empty() {
            return Err(ChartError::Configuration("size_field must be set".to_string()));
        }
        Ok(())
    }
}

/// Visual collaborator. The engine hands out read-only node and region
/// borrows; whatever bookkeeping the renderer needs (key to visual handle,
/// fade progress) lives on its side of this trait.
pub trait Renderer {
    fn node_entered(&mut self, node: &Node);
    fn node_updated(&mut self, node: &Node);
    fn node_exited(&mut self, node: &Node);
    fn region_entered(&mut self, region: &ClassifierRegion);
    fn region_updated(&mut self, region: &ClassifierRegion);
    fn region_exited(&mut self, region: &ClassifierRegion);
}

#[derive(Debug)]
enum RegionEvent {
    Entered(ClassifierRegion),
    Updated(ClassifierRegion),
    Exited(ClassifierRegion),
}

/// The chart engine: node lifecycle, region partition, radius scale and the
/// frame loop. All mutation happens through the public operations and
/// [`BubbleChart::step`]; renderers only ever observe.
#[derive(Debug)]
pub struct BubbleChart {
    width: f32,
    height: f32,
    identity_fields: Vec<String>,
    tooltip_fields: Vec<String>,
    classifier_field: String,
    size_field: String,
    color_field: String,
    origin: Vec2,
    exit_point: Vec2,
    nodes: Vec<Node>,
    index_by_key: HashMap<String, usize>,
    regions: Vec<ClassifierRegion>,
    region_events: Vec<RegionEvent>,
    radius_scale: RadiusScale,
    max_radius: f32,
    fills: FillRegistry,
    sim: Simulation,
    scratch: LayoutScratch,
}

impl BubbleChart {
    pub fn new(options: ChartOptions) -> Result<Self, ChartError> {
        options.validate()?;
        let ChartOptions {
            width,
            height,
            data,
            identity_fields,
            tooltip_fields,
            classifier_field,
            size_field,
            color_field,
            origin,
            exit_point,
            force,
        } = options;

        let center = vec2(width, height) * 0.5;
        let mut chart = Self {
            width,
            height,
            identity_fields,
            tooltip_fields,
            classifier_field,
            size_field,
            color_field,
            origin,
            exit_point,
            nodes: Vec::new(),
            index_by_key: HashMap::new(),
            regions: Vec::new(),
            region_events: Vec::new(),
            radius_scale: RadiusScale::default(),
            max_radius: 0.0,
            fills: FillRegistry::default(),
            sim: Simulation::new(force, center),
            scratch: LayoutScratch::default(),
        };
        chart.ingest(&data)?;
        Ok(chart)
    }

    /// Replaces the dataset: reconciles the node set, recomputes regions and
    /// the radius scale, and restarts the simulation. On error the previous
    /// state stands untouched.
    pub fn set_data(&mut self, records: &[DataRecord]) -> Result<&mut Self, ChartError> {
        self.ingest(records)?;
        Ok(self)
    }

    /// Changes the grouping field. Every node's classifier is re-derived
    /// from its current data, then regions and scale recompute.
    pub fn set_classifier(&mut self, field: &str) -> Result<&mut Self, ChartError> {
        if field.trim().is_empty() {
            return Err(ChartError::Configuration(
                "classifier_field must be set".to_string(),
            ));
        }
        self.classifier_field = field.to_string();
        for node in &mut self.nodes {
            node.classifier = data::derive_classifier(&node.data, field);
        }
        self.refresh_layout();
        self.sim.restart();
        Ok(self)
    }

    pub fn set_width(&mut self, px: f32) -> Result<&mut Self, ChartError> {
        if !(px.is_finite() && px > 0.0) {
            return Err(ChartError::Configuration(format!(
                "width must be positive, got {px}"
            )));
        }
        self.width = px;
        self.reinitialize();
        Ok(self)
    }

    pub fn set_height(&mut self, px: f32) -> Result<&mut Self, ChartError> {
        if !(px.is_finite() && px > 0.0) {
            return Err(ChartError::Configuration(format!(
                "height must be positive, got {px}"
            )));
        }
        self.height = px;
        self.reinitialize();
        Ok(self)
    }

    /// One simulation tick. Returns false once alpha has decayed to idle;
    /// positions then stand still until a mutating call restarts the
    /// schedule.
    pub fn step(&mut self) -> bool {
        physics::step_layout(
            &mut self.sim,
            &mut self.nodes,
            &self.regions,
            self.exit_point,
            self.max_radius,
            &mut self.scratch,
        )
        .is_some()
    }

    /// Surfaces the current frame to the renderer: region changes recorded
    /// since the last frame, then every node. Entering nodes flip to
    /// Updating once their enter callback has run.
    pub fn run_frame<R: Renderer>(&mut self, renderer: &mut R) {
        for event in self.region_events.drain(..) {
            match event {
                RegionEvent::Exited(region) => renderer.region_exited(&region),
                RegionEvent::Entered(region) => renderer.region_entered(&region),
                RegionEvent::Updated(region) => renderer.region_updated(&region),
            }
        }

        for node in &mut self.nodes {
            match node.state {
                NodeState::Entering => {
                    renderer.node_entered(node);
                    node.state = NodeState::Updating;
                }
                NodeState::Updating => renderer.node_updated(node),
                NodeState::Exiting => renderer.node_exited(node),
            }
        }
    }

    /// Renderer confirmation that an Exiting node has visually settled.
    /// Removes it from the store; false when the key is unknown or the node
    /// is not exiting.
    pub fn confirm_exit(&mut self, key: &str) -> bool {
        let Some(&index) = self.index_by_key.get(key) else {
            return false;
        };
        if self.nodes[index].state != NodeState::Exiting {
            return false;
        }

        self.index_by_key.remove(key);
        self.nodes.swap_remove(index);
        if index < self.nodes.len() {
            let moved = self.nodes[index].key.clone();
            self.index_by_key.insert(moved, index);
        }
        true
    }

    /// Configured tooltip fields of the record joined with newlines.
    pub fn tooltip_text(&self, record: &DataRecord) -> String {
        data::tooltip_text(record, &self.tooltip_fields)
    }

    /// Stable per-category fill color.
    pub fn fill_color(&mut self, category: &str) -> Color32 {
        self.fills.color_for(category)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, key: &str) -> Option<&Node> {
        self.index_by_key.get(key).map(|&index| &self.nodes[index])
    }

    pub fn regions(&self) -> &[ClassifierRegion] {
        &self.regions
    }

    pub fn alpha(&self) -> f32 {
        self.sim.alpha()
    }

    pub fn is_active(&self) -> bool {
        self.sim.is_active()
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn classifier_field(&self) -> &str {
        &self.classifier_field
    }

    fn ingest(&mut self, records: &[DataRecord]) -> Result<(), ChartError> {
        let params = ReconcileParams {
            identity_fields: &self.identity_fields,
            classifier_field: &self.classifier_field,
            color_field: &self.color_field,
            origin: self.origin,
        };
        let (nodes, index) = lifecycle::reconcile(&self.nodes, records, &params, &mut self.fills)?;
        self.nodes = nodes;
        self.index_by_key = index;
        self.refresh_layout();
        self.sim.restart();
        Ok(())
    }

    fn reinitialize(&mut self) {
        self.sim.set_center(vec2(self.width, self.height) * 0.5);
        self.refresh_layout();
        self.sim.restart();
    }

    fn canvas(&self) -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), vec2(self.width, self.height))
    }

    /// Recomputes regions, charge distance, radius scale and node radii from
    /// the current non-exiting population, recording region changes for the
    /// next frame.
    fn refresh_layout(&mut self) {
        let classifiers = self
            .nodes
            .iter()
            .filter(|node| node.state != NodeState::Exiting)
            .map(|node| node.classifier.clone())
            .collect::<Vec<_>>();
        let next = regions::partition(classifiers, self.canvas());

        for old in &self.regions {
            if !next.iter().any(|region| region.name == old.name) {
                self.region_events.push(RegionEvent::Exited(old.clone()));
            }
        }
        for region in &next {
            let existed = self.regions.iter().any(|old| old.name == region.name);
            self.region_events.push(if existed {
                RegionEvent::Updated(region.clone())
            } else {
                RegionEvent::Entered(region.clone())
            });
        }
        self.regions = next;

        self.sim
            .set_charge_distance(scale::charge_distance(&self.regions));

        let members = self
            .nodes
            .iter()
            .filter(|node| node.state != NodeState::Exiting)
            .map(|node| {
                (
                    node.classifier.as_str(),
                    data::size_value(&node.data, &self.size_field),
                )
            });
        self.radius_scale = scale::calibrate(members, &self.regions);

        let mut max_radius = 0.0f32;
        for node in &mut self.nodes {
            let size = data::size_value(&node.data, &self.size_field);
            node.radius = self.radius_scale.radius(size);
            if node.state != NodeState::Exiting {
                max_radius = max_radius.max(node.radius);
            }
        }
        self.max_radius = max_radius;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct CountingRenderer {
        entered: Vec<String>,
        updated: Vec<String>,
        exited: Vec<String>,
        regions_entered: Vec<String>,
        regions_exited: Vec<String>,
    }

    impl Renderer for CountingRenderer {
        fn node_entered(&mut self, node: &Node) {
            self.entered.push(node.key.clone());
        }
        fn node_updated(&mut self, node: &Node) {
            self.updated.push(node.key.clone());
        }
        fn node_exited(&mut self, node: &Node) {
            self.exited.push(node.key.clone());
        }
        fn region_entered(&mut self, region: &ClassifierRegion) {
            self.regions_entered.push(region.name.clone());
        }
        fn region_updated(&mut self, _region: &ClassifierRegion) {}
        fn region_exited(&mut self, region: &ClassifierRegion) {
            self.regions_exited.push(region.name.clone());
        }
    }

    fn record(value: serde_json::Value) -> DataRecord {
        serde_json::from_value(value).unwrap()
    }

    fn options(data: Vec<DataRecord>) -> ChartOptions {
        ChartOptions {
            data,
            identity_fields: vec!["id".to_string()],
            tooltip_fields: vec!["id".to_string(), "size".to_string()],
            classifier_field: "group".to_string(),
            size_field: "size".to_string(),
            color_field: "group".to_string(),
            ..ChartOptions::default()
        }
    }

    fn one_record() -> Vec<DataRecord> {
        vec![record(json!({"id": "a", "size": 10, "group": "X"}))]
    }

    fn two_records() -> Vec<DataRecord> {
        vec![
            record(json!({"id": "a", "size": 10, "group": "X"})),
            record(json!({"id": "b", "size": 5, "group": "Y"})),
        ]
    }

    #[test]
    fn construction_rejects_missing_required_options() {
        let err = BubbleChart::new(ChartOptions::default()).unwrap_err();
        assert!(matches!(err, ChartError::Configuration(_)));

        let mut opts = options(Vec::new());
        opts.width = 0.0;
        assert!(BubbleChart::new(opts).is_err());
    }

    #[test]
    fn enter_then_update_scenario() {
        let mut chart = BubbleChart::new(options(one_record())).unwrap();
        let a = chart.node("a").expect("node a tracked");
        assert_eq!(a.state, NodeState::Entering);
        assert_eq!(a.classifier, "X");
        assert_eq!(chart.regions().len(), 1);

        let mut renderer = CountingRenderer::default();
        chart.run_frame(&mut renderer);
        assert_eq!(renderer.entered, vec!["a"]);

        chart.set_data(&two_records()).unwrap();
        assert_eq!(chart.node("a").unwrap().state, NodeState::Updating);
        assert_eq!(chart.node("a").unwrap().classifier, "X");
        assert_eq!(chart.node("b").unwrap().state, NodeState::Entering);
        assert_eq!(chart.node("b").unwrap().classifier, "Y");

        let canvas_area = chart.width() * chart.height();
        assert_eq!(chart.regions().len(), 2);
        for region in chart.regions() {
            assert!((region.area() - canvas_area / 2.0).abs() < 1.0);
        }
    }

    #[test]
    fn identical_dataset_is_idempotent() {
        let mut chart = BubbleChart::new(options(two_records())).unwrap();
        let mut renderer = CountingRenderer::default();
        chart.run_frame(&mut renderer);

        let positions_before = chart
            .nodes()
            .iter()
            .map(|node| (node.key.clone(), node.pos))
            .collect::<Vec<_>>();

        chart.set_data(&two_records()).unwrap();
        assert!(
            chart
                .nodes()
                .iter()
                .all(|node| node.state == NodeState::Updating)
        );
        for (key, pos) in positions_before {
            assert_eq!(chart.node(&key).unwrap().pos, pos);
        }

        let mut second = CountingRenderer::default();
        chart.run_frame(&mut second);
        assert!(second.entered.is_empty());
        assert!(second.exited.is_empty());
        assert_eq!(second.updated.len(), 2);
    }

    #[test]
    fn empty_dataset_exits_everything_and_clears_regions() {
        let mut chart = BubbleChart::new(options(two_records())).unwrap();
        chart.set_data(&[]).unwrap();

        assert_eq!(chart.nodes().len(), 2);
        for node in chart.nodes() {
            assert_eq!(node.state, NodeState::Exiting);
            assert_eq!(node.opacity, 1.0);
        }
        assert!(chart.regions().is_empty());
    }

    #[test]
    fn removing_one_record_exits_exactly_one_node() {
        let mut chart = BubbleChart::new(options(two_records())).unwrap();
        let mut renderer = CountingRenderer::default();
        chart.run_frame(&mut renderer);

        chart.set_data(&one_record()).unwrap();
        let exiting = chart
            .nodes()
            .iter()
            .filter(|node| node.state == NodeState::Exiting)
            .collect::<Vec<_>>();
        assert_eq!(exiting.len(), 1);
        assert_eq!(exiting[0].key, "b");
        assert_eq!(chart.nodes().len(), 2);
    }

    #[test]
    fn confirm_exit_removes_only_settled_exiting_nodes() {
        let mut chart = BubbleChart::new(options(two_records())).unwrap();
        let mut renderer = CountingRenderer::default();
        chart.run_frame(&mut renderer);
        chart.set_data(&one_record()).unwrap();

        assert!(!chart.confirm_exit("a"), "updating node must not be removed");
        assert!(!chart.confirm_exit("missing"));
        assert!(chart.confirm_exit("b"));
        assert!(chart.node("b").is_none());
        assert_eq!(chart.nodes().len(), 1);
        assert_eq!(chart.node("a").unwrap().key, "a");
    }

    #[test]
    fn set_classifier_regroups_all_nodes() {
        let records = vec![
            record(json!({"id": "a", "size": 10, "group": "X", "tier": "gold"})),
            record(json!({"id": "b", "size": 5, "group": "Y", "tier": "gold"})),
        ];
        let mut chart = BubbleChart::new(options(records)).unwrap();
        assert_eq!(chart.regions().len(), 2);

        chart.set_classifier("tier").unwrap();
        assert_eq!(chart.regions().len(), 1);
        assert_eq!(chart.regions()[0].name, "gold");
        assert!(chart.nodes().iter().all(|node| node.classifier == "gold"));
        assert!(chart.set_classifier("  ").is_err());
    }

    #[test]
    fn duplicate_keys_leave_state_untouched() {
        let mut chart = BubbleChart::new(options(one_record())).unwrap();
        let duplicate = vec![
            record(json!({"id": "a", "size": 1, "group": "X"})),
            record(json!({"id": "a", "size": 2, "group": "Y"})),
        ];
        assert!(matches!(
            chart.set_data(&duplicate),
            Err(ChartError::DuplicateKey { .. })
        ));
        assert_eq!(chart.nodes().len(), 1);
        assert_eq!(chart.regions().len(), 1);
    }

    #[test]
    fn region_diffs_reach_the_renderer() {
        let mut chart = BubbleChart::new(options(one_record())).unwrap();
        let mut renderer = CountingRenderer::default();
        chart.run_frame(&mut renderer);
        assert_eq!(renderer.regions_entered, vec!["X"]);

        chart.set_data(&two_records()).unwrap();
        chart.set_data(&one_record()).unwrap();
        let mut renderer = CountingRenderer::default();
        chart.run_frame(&mut renderer);
        assert!(renderer.regions_entered.contains(&"Y".to_string()));
        assert!(renderer.regions_exited.contains(&"Y".to_string()));
    }

    #[test]
    fn resize_restarts_and_repartitions() {
        let mut chart = BubbleChart::new(options(two_records())).unwrap();
        while chart.step() {}
        assert!(!chart.is_active());

        chart.set_width(1200.0).unwrap();
        assert!(chart.is_active());
        let total: f32 = chart.regions().iter().map(ClassifierRegion::area).sum();
        assert!((total - 1200.0 * 600.0).abs() < 2.0);
        assert!(chart.set_height(-5.0).is_err());
    }

    #[test]
    fn simulation_moves_nodes_toward_regions_and_settles() {
        let mut chart = BubbleChart::new(options(two_records())).unwrap();
        let mut renderer = CountingRenderer::default();
        chart.run_frame(&mut renderer);

        let mut ticks = 0usize;
        while chart.step() {
            ticks += 1;
            assert!(ticks < 10_000);
        }
        assert!(ticks > 0);

        // Each node has drifted toward its own region's center.
        for node in chart.nodes() {
            let region = chart
                .regions()
                .iter()
                .find(|region| region.name == node.classifier)
                .unwrap();
            assert!(region.rect.expand(region.rect.width()).contains(pos2(node.pos.x, node.pos.y)));
        }
    }
}
