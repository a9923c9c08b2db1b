//! Force-directed grouped bubble chart: diffs datasets into entering,
//! updating and exiting bubbles, partitions the canvas into classifier
//! regions sized by aggregate bubble area, and animates nodes toward their
//! region with collision avoidance. Rendering happens behind
//! [`chart::Renderer`]; an egui demo shell lives in [`app`].

pub mod app;
pub mod chart;
pub mod data;
pub mod error;
pub mod util;

pub use chart::{
    BubbleChart, ChartOptions, ClassifierRegion, ForceConfig, Node, NodeState, Renderer,
};
pub use data::DataRecord;
pub use error::ChartError;
