use crate::style::{ColorBy, COLOR_SCALE};

/// Static color key, built once when the session starts
#[derive(Clone, Debug, PartialEq)]
pub struct Legend {
    pub title: &'static str,
    pub entries: Vec<LegendEntry>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    pub hex: &'static str,
    pub label: &'static str,
}

impl Legend {
    pub fn new(color_by: ColorBy) -> Self {
        Self {
            title: color_by.title(),
            entries: COLOR_SCALE
                .iter()
                .map(|stop| LegendEntry {
                    hex: stop.hex,
                    label: stop.label,
                })
                .collect(),
        }
    }

    /// Widest row in characters (swatch, space, label)
    pub fn content_width(&self) -> usize {
        self.entries
            .iter()
            .map(|e| 2 + e.label.chars().count())
            .chain(std::iter::once(self.title.chars().count()))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::choose_color;

    #[test]
    fn test_legend_mirrors_color_ladder() {
        let legend = Legend::new(ColorBy::Magnitude);
        assert_eq!(legend.title, "Magnitude");
        let labels: Vec<_> = legend.entries.iter().map(|e| e.label).collect();
        assert_eq!(labels, [">9", "7-9", "5-7", "3-5", "1-3", "<1"]);

        // A sample from inside each bucket resolves to that row's color
        let samples = [9.5, 8.0, 6.0, 4.0, 2.0, 0.5];
        for (entry, sample) in legend.entries.iter().zip(samples) {
            assert_eq!(choose_color(sample), entry.hex);
        }
    }

    #[test]
    fn test_depth_title() {
        let legend = Legend::new(ColorBy::Depth);
        assert_eq!(legend.title, "Depth (km)");
        assert_eq!(legend.content_width(), 10);
    }
}
