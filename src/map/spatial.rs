use std::collections::HashMap;

/// Hash grid over point features for radius queries (popup hit-testing).
/// Items keep their insertion index, so callers can map hits back to the
/// layer group they were built from.
pub struct PointIndex<T> {
    /// Grid cells indexed by (cell_x, cell_y)
    cells: HashMap<(i32, i32), Vec<usize>>,
    entries: Vec<(f64, f64, T)>,
    /// Cell size in degrees
    cell_size: f64,
}

impl<T> PointIndex<T> {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            entries: Vec::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Insert an item at a geographic position, returning its index
    pub fn insert(&mut self, lon: f64, lat: f64, item: T) -> usize {
        let idx = self.entries.len();
        self.entries.push((lon, lat, item));

        let cell = self.to_cell(lon, lat);
        self.cells.entry(cell).or_default().push(idx);
        idx
    }

    /// Indices of items whose cell lies within `radius_degrees` of (lon, lat).
    /// Conservative: may include items slightly outside the radius.
    pub fn query_radius(&self, lon: f64, lat: f64, radius_degrees: f64) -> Vec<usize> {
        let center = self.to_cell(lon, lat);
        let reach = (radius_degrees / self.cell_size).ceil().max(0.0);
        // A reach spanning the whole globe matches everything
        if reach.is_nan() || reach * self.cell_size >= 360.0 {
            return (0..self.entries.len()).collect();
        }
        let reach = reach as i32;

        let mut results = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if let Some(indices) = self.cells.get(&(center.0 + dx, center.1 + dy)) {
                    results.extend_from_slice(indices);
                }
            }
        }
        results.sort_unstable();
        results
    }

    /// Position and payload of an item
    pub fn get(&self, idx: usize) -> Option<(f64, f64, &T)> {
        self.entries.get(idx).map(|(lon, lat, item)| (*lon, *lat, item))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
    }
}
