//! Point-in-polygon by ray casting (even-odd rule).

use super::types::GeoPoint;

/// Whether `point` lies inside the open ring `polygon`.
///
/// A ray is cast from `point` toward increasing longitude and ring-edge crossings
/// are counted; an odd count means inside. Works directly in degrees: crossing
/// parity is invariant under the monotone lat/lon → plane map at city scale.
///
/// Notes
/// - Returns `false` for fewer than 3 vertices.
/// - A repeated closing vertex (first == last) is harmless: its zero-length edge
///   never crosses the ray.
/// - Points exactly on an edge may land on either side.
pub fn contains(point: GeoPoint, polygon: &[GeoPoint]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let (x, y) = (point.longitude, point.latitude);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (polygon[i].longitude, polygon[i].latitude);
        let (xj, yj) = (polygon[j].longitude, polygon[j].latitude);
        // The straddle test guarantees yi != yj, so the division is safe.
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
