//! Borehole layouts and the size-ordered layout catalogs searched by the sizer.
//!
//! A [`LayoutDomain`] is ordered from the most compact field (index 0) to the
//! most sprawling one (index N-1). A [`NestedLayoutDomain`] stacks several such
//! domains, one per outer search level.

use crate::Point;
use anyhow::{Result, bail, ensure};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::ops::Index;
use tracing::warn;

/// Fixed set of planar borehole positions.
///
/// Coordinates are finite and no two boreholes coincide. Deserialization goes
/// through [`Layout::new`] as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Layout {
    points: Vec<Point>,
}

impl Layout {
    /// Creates a layout.
    ///
    /// Fails if there are no boreholes, a coordinate is not finite or two
    /// boreholes share a position.
    pub fn new(points: Vec<Point>) -> Result<Self> {
        ensure!(!points.is_empty(), "Layout must contain at least one borehole");
        if let Some(p) = points.iter().find(|p| !p.is_finite()) {
            bail!("Layout contains a non-finite borehole position: {p}");
        }
        for (i, a) in points.iter().enumerate() {
            if let Some(j) = points[i + 1..].iter().position(|b| a.is_close(b)) {
                bail!("Boreholes {i} and {} share the position {a}", i + j + 1);
            }
        }
        Ok(Self { points })
    }

    /// Regular `nx` by `ny` grid with spacings `bx` and `by`, anchored at the origin.
    pub fn rectangle(nx: usize, ny: usize, bx: f64, by: f64) -> Result<Self> {
        let mut points = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                points.push(Point::new(i as f64 * bx, j as f64 * by));
            }
        }
        Self::new(points)
    }

    /// Number of boreholes.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false, a layout holds at least one borehole.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Smallest center-to-center distance between two boreholes.
    ///
    /// Returns `None` for a single-borehole field.
    pub fn spacing(&self) -> Option<f64> {
        let mut spacing: Option<f64> = None;
        for (i, a) in self.points.iter().enumerate() {
            for b in &self.points[i + 1..] {
                let d = a.distance(b);
                spacing = Some(spacing.map_or(d, |s| s.min(d)));
            }
        }
        spacing
    }
}

impl TryFrom<Vec<Point>> for Layout {
    type Error = anyhow::Error;

    fn try_from(points: Vec<Point>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<Layout> for Vec<Point> {
    fn from(layout: Layout) -> Self {
        layout.points
    }
}

// Finite coordinates make the float comparison reflexive
impl Eq for Layout {}

impl Hash for Layout {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.points.len().hash(state);
        for p in &self.points {
            // -0.0 + 0.0 is 0.0, so equal coordinates hash alike
            (p.x + 0.0).to_bits().hash(state);
            (p.y + 0.0).to_bits().hash(state);
        }
    }
}

/// Layouts ordered by non-decreasing field size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutDomain {
    layouts: Vec<Layout>,
}

impl LayoutDomain {
    /// Creates a domain from layouts ordered compact to large.
    ///
    /// The ordering is produced by whoever built the catalog. A decrease in
    /// borehole count is logged, not rejected, since footprint and count need
    /// not agree for every catalog.
    pub fn new(layouts: Vec<Layout>) -> Result<Self> {
        ensure!(!layouts.is_empty(), "Layout domain must contain at least one layout");
        for (i, pair) in layouts.windows(2).enumerate() {
            if pair[1].len() < pair[0].len() {
                warn!(
                    index = i + 1,
                    boreholes = pair[1].len(),
                    previous = pair[0].len(),
                    "layout domain is not ordered by borehole count"
                );
            }
        }
        Ok(Self { layouts })
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Always false, a domain holds at least one layout.
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Layout> {
        self.layouts.get(index)
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    /// Most compact layout.
    pub fn smallest(&self) -> &Layout {
        &self.layouts[0]
    }

    /// Largest layout.
    pub fn largest(&self) -> &Layout {
        &self.layouts[self.layouts.len() - 1]
    }

    pub fn last_index(&self) -> usize {
        self.layouts.len() - 1
    }
}

impl Index<usize> for LayoutDomain {
    type Output = Layout;

    fn index(&self, index: usize) -> &Self::Output {
        &self.layouts[index]
    }
}

/// One size-ordered domain per outer search level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedLayoutDomain {
    levels: Vec<LayoutDomain>,
}

impl NestedLayoutDomain {
    pub fn new(levels: Vec<LayoutDomain>) -> Result<Self> {
        ensure!(
            !levels.is_empty(),
            "Nested layout domain must contain at least one level"
        );
        Ok(Self { levels })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false, a nested domain holds at least one level.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[LayoutDomain] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Option<&LayoutDomain> {
        self.levels.get(index)
    }

    /// Domain of outer candidates: the smallest layout of level 0 followed by
    /// the largest layout of every level.
    ///
    /// Outer index `k >= 1` stands for level `k - 1`.
    pub fn outer_domain(&self) -> Result<LayoutDomain> {
        let mut layouts = Vec::with_capacity(self.levels.len() + 1);
        layouts.push(self.levels[0].smallest().clone());
        for level in &self.levels {
            layouts.push(level.largest().clone());
        }
        LayoutDomain::new(layouts)
    }
}

impl Index<usize> for NestedLayoutDomain {
    type Output = LayoutDomain;

    fn index(&self, index: usize) -> &Self::Output {
        &self.levels[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_layout_is_rejected() {
        assert!(Layout::new(vec![]).is_err());
        assert!(Layout::new(vec![Point::new(f64::INFINITY, 0.0)]).is_err());
    }

    #[test]
    fn test_coincident_boreholes_are_rejected() {
        let err = Layout::new(vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(5.0, 1e-12),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("Boreholes 1 and 2"));
    }

    #[test]
    fn test_deserialization_is_validated() {
        let layout: Layout = serde_json::from_str(r#"[{"x": 0.0, "y": 0.0}, {"x": 5.0, "y": 0.0}]"#)
            .unwrap();
        assert_eq!(layout.len(), 2);
        assert!(serde_json::from_str::<Layout>("[]").is_err());
        assert!(
            serde_json::from_str::<Layout>(r#"[{"x": 1.0, "y": 1.0}, {"x": 1.0, "y": 1.0}]"#)
                .is_err()
        );
    }

    #[test]
    fn test_signed_zero_layouts_share_a_hash() {
        use std::collections::HashSet;

        let a = Layout::new(vec![Point::new(0.0, 5.0)]).unwrap();
        let b = Layout::new(vec![Point::new(-0.0, 5.0)]).unwrap();
        assert_eq!(a, b);
        let set: HashSet<Layout> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_rectangle() {
        let layout = Layout::rectangle(3, 2, 5.0, 6.0).unwrap();
        assert_eq!(layout.len(), 6);
        assert!(layout.points()[5].is_close(&Point::new(10.0, 6.0)));
        assert!((layout.spacing().unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_borehole_has_no_spacing() {
        let layout = Layout::new(vec![Point::new(1.0, 1.0)]).unwrap();
        assert!(layout.spacing().is_none());
    }

    #[test]
    fn test_spacing_uses_closest_pair() {
        let layout = Layout::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 4.0),
        ])
        .unwrap();
        assert!((layout.spacing().unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_domain_accessors() {
        let domain = LayoutDomain::new(vec![
            Layout::rectangle(1, 1, 5.0, 5.0).unwrap(),
            Layout::rectangle(2, 2, 5.0, 5.0).unwrap(),
            Layout::rectangle(3, 3, 5.0, 5.0).unwrap(),
        ])
        .unwrap();
        assert_eq!(domain.len(), 3);
        assert_eq!(domain.smallest().len(), 1);
        assert_eq!(domain.largest().len(), 9);
        assert_eq!(domain[1].len(), 4);
        assert_eq!(domain.last_index(), 2);
        assert!(domain.get(3).is_none());
        assert!(LayoutDomain::new(vec![]).is_err());
    }

    #[test]
    fn test_outer_domain() {
        let level = |n: usize| {
            LayoutDomain::new(vec![
                Layout::rectangle(n, 1, 5.0, 5.0).unwrap(),
                Layout::rectangle(n, 2, 5.0, 5.0).unwrap(),
            ])
            .unwrap()
        };
        let nested = NestedLayoutDomain::new(vec![level(2), level(3), level(4)]).unwrap();
        let outer = nested.outer_domain().unwrap();
        let sizes: Vec<usize> = outer.layouts().iter().map(Layout::len).collect();
        assert_eq!(sizes, vec![2, 4, 6, 8]);
        assert_eq!(nested[2].len(), 2);
    }
}
