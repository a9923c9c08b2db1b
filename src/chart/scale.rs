use std::collections::HashMap;
use std::f32::consts::PI;

use super::regions::ClassifierRegion;

/// Share of a region's area the busiest classifier is allowed to fill, in
/// the worst case, before spacing. The rest is breathing room for the
/// collision pass.
const MAX_REGION_FILL: f32 = 0.6;

/// Maps a raw size value to an on-screen radius via a linear area map:
/// `[0, busiest classifier's data area]` → `[0, 60% of one region]`.
/// Calibrated so even the most crowded region roughly fits its bubbles.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RadiusScale {
    data_area_max: f32,
    pixel_area_max: f32,
}

impl RadiusScale {
    pub fn radius(&self, size_value: f32) -> f32 {
        if self.data_area_max <= 0.0 || self.pixel_area_max <= 0.0 {
            return 0.0;
        }
        let data_area = PI * size_value * size_value;
        let pixel_area = data_area / self.data_area_max * self.pixel_area_max;
        (pixel_area / PI).sqrt() / 2.0
    }
}

/// Builds the scale from the non-exiting population. `members` yields each
/// node's classifier and raw size value; regions are the current partition
/// (all equal-area, any one serves as the sample).
pub(crate) fn calibrate<'a>(
    members: impl IntoIterator<Item = (&'a str, f32)>,
    regions: &[ClassifierRegion],
) -> RadiusScale {
    let mut area_by_classifier: HashMap<&str, f32> = HashMap::new();
    for (classifier, size) in members {
        *area_by_classifier.entry(classifier).or_insert(0.0) += PI * size * size;
    }

    let data_area_max = area_by_classifier.values().copied().fold(0.0, f32::max);
    let pixel_area_max = regions
        .first()
        .map(|region| region.area() * MAX_REGION_FILL)
        .unwrap_or(0.0);

    tracing::debug!(data_area_max, pixel_area_max, "calibrated radius scale");

    RadiusScale {
        data_area_max,
        pixel_area_max,
    }
}

/// Cutoff radius for inter-node repulsion: half the diagonal of the largest
/// region width and height. Keeps charge from acting across region
/// boundaries.
pub(crate) fn charge_distance(regions: &[ClassifierRegion]) -> f32 {
    let mut max_width = 0.0f32;
    let mut max_height = 0.0f32;
    for region in regions {
        max_width = max_width.max(region.rect.width());
        max_height = max_height.max(region.rect.height());
    }
    (max_width * max_width + max_height * max_height).sqrt() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{Rect, pos2, vec2};
    use proptest::prelude::*;

    fn region(name: &str, x: f32, y: f32, w: f32, h: f32) -> ClassifierRegion {
        ClassifierRegion {
            name: name.to_string(),
            rect: Rect::from_min_size(pos2(x, y), vec2(w, h)),
        }
    }

    #[test]
    fn busiest_region_fits_within_its_budget() {
        let regions = vec![
            region("Y", 0.0, 0.0, 300.0, 600.0),
            region("X", 300.0, 0.0, 300.0, 600.0),
        ];
        let members = [("X", 10.0), ("X", 8.0), ("X", 3.0), ("Y", 2.0)];
        let scale = calibrate(members.iter().map(|&(c, v)| (c, v)), &regions);

        let occupied: f32 = members
            .iter()
            .filter(|(c, _)| *c == "X")
            .map(|&(_, v)| {
                let r = scale.radius(v);
                PI * r * r
            })
            .sum();
        assert!(occupied > 0.0);
        assert!(occupied <= regions[0].area() * MAX_REGION_FILL);
    }

    #[test]
    fn empty_population_yields_zero_radius() {
        let scale = calibrate(std::iter::empty(), &[]);
        assert_eq!(scale.radius(42.0), 0.0);
    }

    #[test]
    fn charge_distance_is_half_the_max_diagonal() {
        let regions = vec![
            region("a", 0.0, 0.0, 300.0, 600.0),
            region("b", 300.0, 0.0, 300.0, 600.0),
        ];
        let expected = (300.0f32 * 300.0 + 600.0 * 600.0).sqrt() / 2.0;
        assert!((charge_distance(&regions) - expected).abs() < 1e-3);
        assert_eq!(charge_distance(&[]), 0.0);
    }

    proptest! {
        #[test]
        fn radius_is_strictly_monotonic(
            v1 in 0.01f32..1000.0,
            delta in 0.01f32..1000.0,
        ) {
            let regions = vec![region("only", 0.0, 0.0, 600.0, 600.0)];
            let scale = calibrate([("only", 1000.0f32)], &regions);
            let v2 = v1 + delta;
            prop_assert!(scale.radius(v1) < scale.radius(v2));
        }
    }
}
