use eframe::egui::{Pos2, Rect, pos2, vec2};

/// A rectangular screen partition assigned to one classifier value. Regions
/// tile the canvas; bubbles of a classifier seek their region's center.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifierRegion {
    pub name: String,
    pub rect: Rect,
}

impl ClassifierRegion {
    pub fn area(&self) -> f32 {
        self.rect.area()
    }

    pub fn center(&self) -> Pos2 {
        self.rect.center()
    }
}

/// Partitions the canvas into one equal-area region per distinct classifier
/// value using the squarified treemap algorithm (Bruls et al.). Names are
/// sorted descending as the deterministic tie-break. The last strip and the
/// last rect of every strip absorb floating-point slack, so the union covers
/// the canvas exactly and pairwise overlap is zero.
pub(crate) fn partition(mut names: Vec<String>, canvas: Rect) -> Vec<ClassifierRegion> {
    names.sort_by(|a, b| b.cmp(a));
    names.dedup();

    if names.is_empty() || canvas.width() <= 0.0 || canvas.height() <= 0.0 {
        return Vec::new();
    }

    let per_region = (canvas.area() as f64) / names.len() as f64;
    let areas = vec![per_region; names.len()];
    let rects = squarify(
        &areas,
        canvas.left() as f64,
        canvas.top() as f64,
        canvas.width() as f64,
        canvas.height() as f64,
    );

    tracing::debug!(regions = names.len(), "partitioned canvas");

    names
        .into_iter()
        .zip(rects)
        .map(|(name, tile)| ClassifierRegion {
            name,
            rect: Rect::from_min_size(
                pos2(tile.x as f32, tile.y as f32),
                vec2(tile.w as f32, tile.h as f32),
            ),
        })
        .collect()
}

#[derive(Clone, Copy, Debug)]
struct Tile {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

/// Squarified layout: keep adding items to the current strip while the worst
/// aspect ratio improves, then cut the strip off the remaining rectangle.
fn squarify(areas: &[f64], mut x: f64, mut y: f64, mut w: f64, mut h: f64) -> Vec<Tile> {
    let mut result = Vec::with_capacity(areas.len());

    let mut idx = 0usize;
    let mut row_start = 0usize;
    let mut row_sum = 0.0;
    let mut row_min = f64::INFINITY;
    let mut row_max = 0.0;

    while idx < areas.len() {
        if w <= 1e-9 || h <= 1e-9 {
            break;
        }

        let candidate = areas[idx];
        let side = w.min(h);
        let current = worst_aspect_ratio(row_min, row_max, row_sum, side);
        let next = worst_aspect_ratio(
            row_min.min(candidate),
            row_max.max(candidate),
            row_sum + candidate,
            side,
        );

        if row_sum <= 0.0 || next <= current {
            row_sum += candidate;
            row_min = row_min.min(candidate);
            row_max = row_max.max(candidate);
            idx += 1;
            continue;
        }

        layout_strip(
            &areas[row_start..idx],
            row_sum,
            false,
            &mut x,
            &mut y,
            &mut w,
            &mut h,
            &mut result,
        );
        row_start = idx;
        row_sum = 0.0;
        row_min = f64::INFINITY;
        row_max = 0.0;
    }

    if row_sum > 0.0 && row_start < idx {
        layout_strip(
            &areas[row_start..idx],
            row_sum,
            true,
            &mut x,
            &mut y,
            &mut w,
            &mut h,
            &mut result,
        );
    }

    result
}

/// Lays one strip along the shorter side of the remaining rectangle. The
/// final strip takes the whole remaining thickness and the final tile of
/// every strip takes the whole remaining length.
fn layout_strip(
    strip: &[f64],
    strip_sum: f64,
    last_strip: bool,
    x: &mut f64,
    y: &mut f64,
    w: &mut f64,
    h: &mut f64,
    out: &mut Vec<Tile>,
) {
    if strip.is_empty() || strip_sum <= 0.0 || *w <= 1e-12 || *h <= 1e-12 {
        return;
    }

    let horizontal = *w <= *h;
    let short = if horizontal { *w } else { *h };
    let mut thickness = strip_sum / short;
    if last_strip {
        thickness = if horizontal { *h } else { *w };
    }
    if !thickness.is_finite() || thickness <= 0.0 {
        return;
    }

    let mut offset = 0.0;
    for (i, &area) in strip.iter().enumerate() {
        // The last strip is stretched to the remaining thickness, so its
        // lengths come from the strip's own proportions.
        let mut length = if last_strip {
            (area / strip_sum) * short
        } else {
            area / thickness
        };
        if !length.is_finite() || length <= 0.0 {
            continue;
        }
        if i == strip.len() - 1 {
            let remaining = short - offset;
            if remaining.is_finite() && remaining > 0.0 {
                length = remaining;
            }
        }

        let tile = if horizontal {
            Tile {
                x: *x + offset,
                y: *y,
                w: length,
                h: thickness,
            }
        } else {
            Tile {
                x: *x,
                y: *y + offset,
                w: thickness,
                h: length,
            }
        };
        out.push(tile);
        offset += length;
    }

    if horizontal {
        *y += thickness;
        *h = (*h - thickness).max(0.0);
    } else {
        *x += thickness;
        *w = (*w - thickness).max(0.0);
    }
}

fn worst_aspect_ratio(min_area: f64, max_area: f64, sum: f64, side: f64) -> f64 {
    if sum <= 0.0 || side <= 0.0 || min_area <= 0.0 || max_area <= 0.0 {
        return f64::INFINITY;
    }
    let side_sq = side * side;
    let sum_sq = sum * sum;
    let a = (side_sq * max_area) / sum_sq;
    let b = sum_sq / (side_sq * min_area);
    a.max(b)
}
