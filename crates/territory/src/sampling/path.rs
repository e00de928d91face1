//! Append-only store of accepted points for one capture session.

use super::types::PathPoint;
use crate::geo::{haversine_m, polygon_area_m2, GeoPoint};

/// Insertion-ordered accepted points plus the distance walked between them.
/// No removal API: the accumulator lives and dies with its session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathAccumulator {
    points: Vec<PathPoint>,
    walked_m: f64,
}

impl PathAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, point: PathPoint) {
        if let Some(last) = self.points.last() {
            self.walked_m += haversine_m(last.point, point.point);
        }
        self.points.push(point);
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    #[inline]
    pub fn first(&self) -> Option<&PathPoint> {
        self.points.first()
    }

    #[inline]
    pub fn last(&self) -> Option<&PathPoint> {
        self.points.last()
    }

    /// Sum of haversine steps between consecutive points.
    #[inline]
    pub fn walked_m(&self) -> f64 {
        self.walked_m
    }

    pub fn vertices(&self) -> Vec<GeoPoint> {
        self.points.iter().map(|p| p.point).collect()
    }

    /// Area the path would enclose if it closed now.
    pub fn estimated_area_m2(&self) -> f64 {
        polygon_area_m2(&self.vertices())
    }
}
