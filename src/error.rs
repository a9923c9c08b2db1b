use thiserror::Error;

/// Failures surfaced by the chart engine. All are synchronous and local to
/// the call that produced them; the engine never carries an error across a
/// frame boundary.
#[derive(Debug, Error)]
pub enum ChartError {
    /// A required option is missing or invalid. Raised by `BubbleChart::new`
    /// and by the setters before any state is touched.
    #[error("invalid chart configuration: {0}")]
    Configuration(String),

    /// Two records in one incoming dataset resolved to the same unique key.
    /// The dataset is rejected as a whole; the previous node set stands.
    #[error("duplicate unique key `{key}` in incoming dataset")]
    DuplicateKey { key: String },
}
