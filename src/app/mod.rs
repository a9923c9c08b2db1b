use std::collections::HashMap;

use eframe::egui::{
    self, Align2, Color32, Context, FontId, Pos2, Rect, Sense, Stroke, StrokeKind, Vec2, pos2,
};

use crate::chart::{BubbleChart, ClassifierRegion, Node, NodeState, Renderer};
use crate::data::{self, DataRecord};
use crate::util::ellipsize;

mod controls;
mod sample;

pub use sample::sample_records;

use controls::DataAction;

/// An exit fade below this opacity counts as settled; the app then confirms
/// removal back into the engine.
const EXIT_SETTLED_OPACITY: f32 = 0.01;

const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
const REGION_STROKE: Color32 = Color32::from_rgba_premultiplied(110, 130, 150, 160);
const LABEL_COLOR: Color32 = Color32::from_rgb(205, 214, 224);

/// Renderer-side record of one bubble. The app never reaches back into the
/// engine to identify visuals; this map, fed by the lifecycle callbacks, is
/// its own bookkeeping.
struct NodeVisual {
    pos: Vec2,
    radius: f32,
    fill: Color32,
    opacity: f32,
    exiting: bool,
    tooltip: String,
}

struct RegionVisual {
    rect: Rect,
    label: String,
}

/// Demo shell around the chart engine: egui painting, dataset scenario
/// buttons and a classifier switcher.
pub struct ChartDemoApp {
    chart: BubbleChart,
    all_records: Vec<DataRecord>,
    classifier_fields: Vec<String>,
    tooltip_fields: Vec<String>,
    visuals: HashMap<String, NodeVisual>,
    region_visuals: HashMap<String, RegionVisual>,
    error: Option<String>,
}

impl ChartDemoApp {
    pub fn new(
        chart: BubbleChart,
        all_records: Vec<DataRecord>,
        tooltip_fields: Vec<String>,
    ) -> Self {
        let classifier_fields = classifier_candidates(&all_records);
        Self {
            chart,
            all_records,
            classifier_fields,
            tooltip_fields,
            visuals: HashMap::new(),
            region_visuals: HashMap::new(),
            error: None,
        }
    }

    fn apply(&mut self, action: DataAction) {
        let result = match action {
            DataAction::Replace(records) => self.chart.set_data(&records).map(|_| ()),
            DataAction::Classifier(field) => self.chart.set_classifier(&field).map(|_| ()),
        };
        match result {
            Ok(()) => self.error = None,
            Err(err) => {
                tracing::warn!(%err, "chart rejected the request");
                self.error = Some(err.to_string());
            }
        }
    }

    fn sync_canvas_size(&mut self, size: Vec2) {
        if size.x < 50.0 || size.y < 50.0 {
            return;
        }
        if (size.x - self.chart.width()).abs() > 1.0
            && let Err(err) = self.chart.set_width(size.x)
        {
            tracing::warn!(%err, "canvas width rejected");
        }
        if (size.y - self.chart.height()).abs() > 1.0
            && let Err(err) = self.chart.set_height(size.y)
        {
            tracing::warn!(%err, "canvas height rejected");
        }
    }

    fn confirm_settled_exits(&mut self) {
        let settled = self
            .visuals
            .iter()
            .filter(|(_, visual)| visual.exiting && visual.opacity <= EXIT_SETTLED_OPACITY)
            .map(|(key, _)| key.clone())
            .collect::<Vec<_>>();
        for key in settled {
            if self.chart.confirm_exit(&key) {
                self.visuals.remove(&key);
            }
        }
    }

    fn paint(&self, painter: &egui::Painter, canvas: Rect) {
        painter.rect_filled(canvas, 0.0, BACKGROUND);

        for visual in self.region_visuals.values() {
            let rect = visual.rect.translate(canvas.min.to_vec2());
            painter.rect_stroke(rect, 0.0, Stroke::new(1.0, REGION_STROKE), StrokeKind::Inside);
            painter.text(
                pos2(rect.center().x, rect.top() + 20.0),
                Align2::CENTER_CENTER,
                &visual.label,
                FontId::proportional(14.0),
                LABEL_COLOR,
            );
        }

        let mut order = self.visuals.values().collect::<Vec<_>>();
        order.sort_by(|a, b| {
            b.radius
                .partial_cmp(&a.radius)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for visual in order {
            let center = canvas.min + visual.pos;
            let fill = visual.fill.gamma_multiply(visual.opacity);
            let stroke = Stroke::new(1.5, darker(visual.fill).gamma_multiply(visual.opacity));
            painter.circle(center, visual.radius, fill, stroke);
        }
    }

    fn hovered_tooltip(&self, canvas: Rect, pointer: Pos2) -> Option<&str> {
        // Smallest hit wins, matching what sits on top visually.
        self.visuals
            .values()
            .filter(|visual| {
                let center = canvas.min + visual.pos;
                (pointer - center).length() <= visual.radius
            })
            .min_by(|a, b| {
                a.radius
                    .partial_cmp(&b.radius)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|visual| visual.tooltip.as_str())
    }
}

impl eframe::App for ChartDemoApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut action = None;
        egui::TopBottomPanel::top("chart-controls").show(ctx, |ui| {
            action = self.draw_controls(ui);
        });
        if let Some(action) = action {
            self.apply(action);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), Sense::hover());
            self.sync_canvas_size(response.rect.size());

            self.chart.step();
            let mut sync = VisualSync {
                visuals: &mut self.visuals,
                regions: &mut self.region_visuals,
                tooltip_fields: &self.tooltip_fields,
            };
            self.chart.run_frame(&mut sync);
            self.confirm_settled_exits();

            self.paint(&painter, response.rect);

            if let Some(pointer) = response.hover_pos()
                && let Some(tooltip) = self.hovered_tooltip(response.rect, pointer)
            {
                let text = tooltip.to_string();
                response.clone().on_hover_text_at_pointer(text);
            }

            if self.chart.is_active() {
                ui.ctx().request_repaint();
            }
        });
    }
}

struct VisualSync<'a> {
    visuals: &'a mut HashMap<String, NodeVisual>,
    regions: &'a mut HashMap<String, RegionVisual>,
    tooltip_fields: &'a [String],
}

impl VisualSync<'_> {
    fn upsert(&mut self, node: &Node) {
        let tooltip = data::tooltip_text(&node.data, self.tooltip_fields);
        self.visuals.insert(
            node.key.clone(),
            NodeVisual {
                pos: node.pos,
                radius: node.radius,
                fill: node.fill,
                opacity: node.opacity,
                exiting: node.state == NodeState::Exiting,
                tooltip,
            },
        );
    }
}

impl Renderer for VisualSync<'_> {
    fn node_entered(&mut self, node: &Node) {
        self.upsert(node);
    }

    fn node_updated(&mut self, node: &Node) {
        self.upsert(node);
    }

    fn node_exited(&mut self, node: &Node) {
        self.upsert(node);
    }

    fn region_entered(&mut self, region: &ClassifierRegion) {
        self.regions.insert(
            region.name.clone(),
            RegionVisual {
                rect: region.rect,
                label: ellipsize(&region.name, region.rect.width()),
            },
        );
    }

    fn region_updated(&mut self, region: &ClassifierRegion) {
        self.region_entered(region);
    }

    fn region_exited(&mut self, region: &ClassifierRegion) {
        self.regions.remove(&region.name);
    }
}

/// Fields usable as a classifier: any field seen with a string value.
/// Sorted for a stable combo box.
pub fn classifier_candidates(records: &[DataRecord]) -> Vec<String> {
    let mut candidates = Vec::new();
    for record in records {
        for (name, value) in record.fields() {
            if value.is_string() && !candidates.iter().any(|existing| existing == name) {
                candidates.push(name.to_string());
            }
        }
    }
    candidates.sort();
    candidates
}

fn darker(color: Color32) -> Color32 {
    let factor = 0.55;
    Color32::from_rgb(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
    )
}
