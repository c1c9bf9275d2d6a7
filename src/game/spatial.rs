//! Uniform grid broadphase.
//!
//! Rectangles are bucketed into every cell they cover; a query returns the
//! candidates sharing a cell with the query rectangle, already filtered by
//! an exact overlap test. Rebuilt every physics step.

use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;
use super::geometry::Rect;

pub struct SpatialGrid<K> {
    cell_size: f32,
    /// Inclusive cell index limits; rects past them share the edge cells
    limits: Option<(i32, i32, i32, i32)>,
    entries: Vec<(K, Rect)>,
    cells: FxHashMap<(i32, i32), Vec<usize>>,
}

impl<K: Copy + Eq + Hash> SpatialGrid<K> {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(0.01),
            limits: None,
            entries: Vec::new(),
            cells: FxHashMap::default(),
        }
    }

    /// Clamp cell coverage to `area`, so a huge rectangle costs at most the
    /// cells of the area.
    pub fn set_bounds(&mut self, area: Rect) {
        self.limits = Some((
            (area.x / self.cell_size).floor() as i32,
            (area.y / self.cell_size).floor() as i32,
            (area.right() / self.cell_size).floor() as i32,
            (area.top() / self.cell_size).floor() as i32,
        ));
        self.clear();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cells.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn cell_range(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        let x0 = (rect.x / self.cell_size).floor() as i32;
        let y0 = (rect.y / self.cell_size).floor() as i32;
        let x1 = (rect.right() / self.cell_size).floor() as i32;
        let y1 = (rect.top() / self.cell_size).floor() as i32;
        match self.limits {
            Some((lx0, ly0, lx1, ly1)) => (
                x0.clamp(lx0, lx1),
                y0.clamp(ly0, ly1),
                x1.clamp(lx0, lx1),
                y1.clamp(ly0, ly1),
            ),
            None => (x0, y0, x1, y1),
        }
    }

    pub fn insert(&mut self, key: K, rect: Rect) {
        let idx = self.entries.len();
        self.entries.push((key, rect));
        let (x0, y0, x1, y1) = self.cell_range(&rect);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                self.cells.entry((cx, cy)).or_default().push(idx);
            }
        }
    }

    /// Keys whose rectangles overlap `area`, each reported once, in insertion order.
    pub fn query(&self, area: &Rect) -> Vec<(K, Rect)> {
        let mut seen: FxHashSet<usize> = FxHashSet::default();
        let (x0, y0, x1, y1) = self.cell_range(area);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                if let Some(ids) = self.cells.get(&(cx, cy)) {
                    seen.extend(ids.iter().copied());
                }
            }
        }
        let mut hits: Vec<usize> = seen
            .into_iter()
            .filter(|&idx| self.entries[idx].1.overlaps(area))
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|idx| self.entries[idx]).collect()
    }

    /// All overlapping pairs, each pair once, lower insertion index first.
    pub fn overlapping_pairs(&self) -> Vec<(K, K)> {
        let mut pairs = Vec::new();
        let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();
        for ids in self.cells.values() {
            for (i, &a) in ids.iter().enumerate() {
                for &b in &ids[i + 1..] {
                    let pair = if a < b { (a, b) } else { (b, a) };
                    if seen.contains(&pair) {
                        continue;
                    }
                    seen.insert(pair);
                    if self.entries[pair.0].1.overlaps(&self.entries[pair.1].1) {
                        pairs.push(pair);
                    }
                }
            }
        }
        pairs.sort_unstable();
        pairs
            .into_iter()
            .map(|(a, b)| (self.entries[a].0, self.entries[b].0))
            .collect()
    }
}
