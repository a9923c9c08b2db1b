use serde_json::json;

use crate::data::DataRecord;

/// Bundled demo dataset: a shelf of well-known crates with download counts
/// (in millions) driving bubble size. Used when no `--data` file is given.
pub fn sample_records() -> Vec<DataRecord> {
    let rows = json!([
        {"name": "serde", "category": "encoding", "license": "MIT", "downloads": 52.0},
        {"name": "serde_json", "category": "encoding", "license": "MIT", "downloads": 44.0},
        {"name": "bincode", "category": "encoding", "license": "MIT", "downloads": 12.0},
        {"name": "toml", "category": "encoding", "license": "Apache-2.0", "downloads": 18.0},
        {"name": "tokio", "category": "async", "license": "MIT", "downloads": 38.0},
        {"name": "futures", "category": "async", "license": "Apache-2.0", "downloads": 30.0},
        {"name": "async-std", "category": "async", "license": "Apache-2.0", "downloads": 8.0},
        {"name": "clap", "category": "cli", "license": "Apache-2.0", "downloads": 34.0},
        {"name": "structopt", "category": "cli", "license": "MIT", "downloads": 9.0},
        {"name": "indicatif", "category": "cli", "license": "MIT", "downloads": 11.0},
        {"name": "axum", "category": "web", "license": "MIT", "downloads": 14.0},
        {"name": "hyper", "category": "web", "license": "MIT", "downloads": 28.0},
        {"name": "reqwest", "category": "web", "license": "Apache-2.0", "downloads": 26.0},
        {"name": "actix-web", "category": "web", "license": "Apache-2.0", "downloads": 10.0},
        {"name": "nom", "category": "parsing", "license": "MIT", "downloads": 21.0},
        {"name": "regex", "category": "parsing", "license": "Apache-2.0", "downloads": 41.0},
        {"name": "pest", "category": "parsing", "license": "MPL-2.0", "downloads": 6.0},
        {"name": "wgpu", "category": "graphics", "license": "MPL-2.0", "downloads": 5.0},
        {"name": "image", "category": "graphics", "license": "MIT", "downloads": 16.0},
        {"name": "egui", "category": "graphics", "license": "Apache-2.0", "downloads": 7.0}
    ]);

    serde_json::from_value(rows).expect("bundled sample dataset is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_parses_and_has_the_demo_fields() {
        let records = sample_records();
        assert!(records.len() >= 12);
        for record in &records {
            assert!(record.field_text("name").is_some());
            assert!(record.field_text("category").is_some());
            assert!(record.field_number("downloads").is_some());
        }
    }
}
