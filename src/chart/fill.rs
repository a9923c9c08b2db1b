use std::collections::{HashMap, VecDeque};

use eframe::egui::Color32;

/// The classic 20-color categorical palette.
pub const CATEGORY_PALETTE: [Color32; 20] = [
    Color32::from_rgb(31, 119, 180),
    Color32::from_rgb(174, 199, 232),
    Color32::from_rgb(255, 127, 14),
    Color32::from_rgb(255, 187, 120),
    Color32::from_rgb(44, 160, 44),
    Color32::from_rgb(152, 223, 138),
    Color32::from_rgb(214, 39, 40),
    Color32::from_rgb(255, 152, 150),
    Color32::from_rgb(148, 103, 189),
    Color32::from_rgb(197, 176, 213),
    Color32::from_rgb(140, 86, 75),
    Color32::from_rgb(196, 156, 148),
    Color32::from_rgb(227, 119, 194),
    Color32::from_rgb(247, 182, 210),
    Color32::from_rgb(127, 127, 127),
    Color32::from_rgb(199, 199, 199),
    Color32::from_rgb(188, 189, 34),
    Color32::from_rgb(219, 219, 141),
    Color32::from_rgb(23, 190, 207),
    Color32::from_rgb(158, 218, 229),
];

const DEFAULT_CAPACITY: usize = 64;

/// Stable category→color assignment that persists across data changes.
/// Bounded: above `capacity` distinct categories the oldest assignment is
/// evicted (FIFO); palette slots repeat modulo the palette length.
#[derive(Clone, Debug)]
pub struct FillRegistry {
    slots: HashMap<String, Color32>,
    order: VecDeque<String>,
    assigned: usize,
    capacity: usize,
}

impl FillRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: HashMap::new(),
            order: VecDeque::new(),
            assigned: 0,
            capacity: capacity.max(1),
        }
    }

    /// The color for a category, assigning the next palette slot on first
    /// sight.
    pub fn color_for(&mut self, category: &str) -> Color32 {
        if let Some(&color) = self.slots.get(category) {
            return color;
        }

        if self.order.len() >= self.capacity
            && let Some(evicted) = self.order.pop_front()
        {
            self.slots.remove(&evicted);
        }

        let color = CATEGORY_PALETTE[self.assigned % CATEGORY_PALETTE.len()];
        self.assigned += 1;
        self.slots.insert(category.to_string(), color);
        self.order.push_back(category.to_string());
        color
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for FillRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_are_stable_across_interleaved_lookups() {
        let mut registry = FillRegistry::default();
        let first = registry.color_for("gpl");
        let second = registry.color_for("mit");
        assert_ne!(first, second);
        assert_eq!(registry.color_for("gpl"), first);
        assert_eq!(registry.color_for("mit"), second);
    }

    #[test]
    fn registry_stays_bounded() {
        let mut registry = FillRegistry::new(4);
        for i in 0..20 {
            registry.color_for(&format!("category-{i}"));
        }
        assert_eq!(registry.len(), 4);
        // Survivors keep their colors.
        let color = registry.color_for("category-19");
        assert_eq!(registry.color_for("category-19"), color);
    }

    #[test]
    fn palette_wraps_past_twenty_categories() {
        let mut registry = FillRegistry::default();
        let colors = (0..25)
            .map(|i| registry.color_for(&format!("c{i}")))
            .collect::<Vec<_>>();
        assert_eq!(colors[20], colors[0]);
        assert_eq!(colors[24], colors[4]);
    }
}
