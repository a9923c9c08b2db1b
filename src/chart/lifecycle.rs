use std::collections::HashMap;

use eframe::egui::{Color32, Vec2, vec2};

use crate::data::{self, DataRecord};
use crate::error::ChartError;
use crate::util::stable_pair;

use super::fill::FillRegistry;

/// Jitter applied around the origin so simultaneously entering nodes do not
/// spawn on the exact same point.
const ENTER_JITTER: f32 = 1.0;

/// Where a node is in its enter/update/exit lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    /// Created this reconcile pass; becomes Updating after its first render.
    Entering,
    /// Live and seeking its classifier region's center.
    Updating,
    /// Dropped from the dataset; fading out toward the exit point until the
    /// renderer confirms removal.
    Exiting,
}

/// One tracked bubble.
#[derive(Clone, Debug)]
pub struct Node {
    pub key: String,
    pub data: DataRecord,
    pub state: NodeState,
    /// Current position in canvas coordinates.
    pub pos: Vec2,
    /// On-screen radius, recomputed whenever the radius scale recalibrates.
    pub radius: f32,
    /// Meaningful while Exiting; decays toward zero.
    pub opacity: f32,
    /// Fixed at creation; re-derived only when the classifier field itself
    /// changes or the node is resurrected from Exiting.
    pub classifier: String,
    pub fill: Color32,
}

pub(crate) struct ReconcileParams<'a> {
    pub identity_fields: &'a [String],
    pub classifier_field: &'a str,
    pub color_field: &'a str,
    pub origin: Vec2,
}

/// Diffs the incoming dataset against the previous node set.
///
/// Produces a fresh store containing carried-forward nodes (data swapped,
/// identity and position kept), new Entering nodes at the origin, and the
/// previous nodes now absent from the data tagged Exiting. Exiting nodes
/// whose key reappears are resurrected to Updating. Nothing is committed on
/// error: a duplicate key rejects the whole dataset.
pub(crate) fn reconcile(
    previous: &[Node],
    records: &[DataRecord],
    params: &ReconcileParams<'_>,
    fills: &mut FillRegistry,
) -> Result<(Vec<Node>, HashMap<String, usize>), ChartError> {
    let prev_by_key: HashMap<&str, &Node> = previous
        .iter()
        .map(|node| (node.key.as_str(), node))
        .collect();

    let mut nodes = Vec::with_capacity(records.len());
    let mut index = HashMap::with_capacity(records.len());
    let mut entered = 0usize;
    let mut resurrected = 0usize;

    for record in records {
        let key = data::derive_key(record, params.identity_fields);
        if index.contains_key(&key) {
            return Err(ChartError::DuplicateKey { key });
        }

        let fill = fill_for(record, params.color_field, fills);
        let node = match prev_by_key.get(key.as_str()) {
            Some(&existing) => {
                let mut carried = existing.clone();
                carried.data = record.clone();
                carried.fill = fill;
                if carried.state == NodeState::Exiting {
                    carried.state = NodeState::Updating;
                    carried.opacity = 1.0;
                    carried.classifier = data::derive_classifier(record, params.classifier_field);
                    resurrected += 1;
                }
                carried
            }
            None => {
                entered += 1;
                let (jx, jy) = stable_pair(&key);
                Node {
                    key: key.clone(),
                    data: record.clone(),
                    state: NodeState::Entering,
                    pos: params.origin + vec2(jx, jy) * ENTER_JITTER,
                    radius: 0.0,
                    opacity: 1.0,
                    classifier: data::derive_classifier(record, params.classifier_field),
                    fill,
                }
            }
        };

        index.insert(key, nodes.len());
        nodes.push(node);
    }

    let mut exiting_new = 0usize;
    for node in previous {
        if index.contains_key(&node.key) {
            continue;
        }
        let mut leaving = node.clone();
        if leaving.state != NodeState::Exiting {
            leaving.state = NodeState::Exiting;
            leaving.opacity = 1.0;
            exiting_new += 1;
        }
        index.insert(leaving.key.clone(), nodes.len());
        nodes.push(leaving);
    }

    tracing::debug!(
        total = nodes.len(),
        entered,
        exiting_new,
        resurrected,
        "reconciled dataset"
    );

    Ok((nodes, index))
}

fn fill_for(record: &DataRecord, color_field: &str, fills: &mut FillRegistry) -> Color32 {
    let category = record
        .field_text(color_field)
        .unwrap_or(std::borrow::Cow::Borrowed(""));
    fills.color_for(&category)
}
