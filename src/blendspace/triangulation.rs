use glam::Vec2;
use smallvec::SmallVec;

/// Triangles whose doubled area falls below this are treated as degenerate.
pub const DEGENERATE_AREA_EPS: f32 = 1.0e-6;
/// Slack on the barycentric sign test so points on an edge still count as
/// inside.
pub const CONTAINMENT_EPS: f32 = 1.0e-4;

const DUPLICATE_POSITION_EPS: f32 = 1.0e-10;

/// Barycentric coordinates of `point` in the triangle `(p0, p1, p2)`.
/// `None` when the triangle is degenerate. The weights always sum to one.
pub fn barycentric(p0: Vec2, p1: Vec2, p2: Vec2, point: Vec2) -> Option<(f32, f32, f32)> {
    let e0 = p1 - p0;
    let e1 = p2 - p0;
    let ep = point - p0;
    let denom = e0.x * e1.y - e1.x * e0.y;
    if denom.abs() < DEGENERATE_AREA_EPS {
        return None;
    }
    let inv = 1.0 / denom;
    let v = (ep.x * e1.y - e1.x * ep.y) * inv;
    let w = (e0.x * ep.y - ep.x * e0.y) * inv;
    let u = 1.0 - v - w;
    Some((u, v, w))
}

/// Barycentric weights when `point` lies inside (or within `CONTAINMENT_EPS`
/// of) the triangle, `None` otherwise.
pub fn triangle_contains(p0: Vec2, p1: Vec2, p2: Vec2, point: Vec2) -> Option<(f32, f32, f32)> {
    let (u, v, w) = barycentric(p0, p1, p2, point)?;
    if u >= -CONTAINMENT_EPS && v >= -CONTAINMENT_EPS && w >= -CONTAINMENT_EPS {
        Some((u, v, w))
    } else {
        None
    }
}

fn doubled_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a).abs()
}

/// Bowyer-Watson incremental Delaunay triangulation.
///
/// `points` carries `(caller_index, position)` pairs; output triangles refer
/// to the caller indices, each triple sorted ascending and the list sorted,
/// so the result is deterministic for a given input. Fewer than three usable
/// points, or a fully collinear set, yields no triangles. Non-finite and
/// duplicate positions are dropped before insertion.
pub fn delaunay(points: &[(usize, Vec2)]) -> Vec<[usize; 3]> {
    let mut kept: Vec<(usize, Vec2)> = Vec::with_capacity(points.len());
    for &(index, position) in points {
        if !position.is_finite() {
            continue;
        }
        let duplicate = kept
            .iter()
            .any(|&(_, existing)| existing.distance_squared(position) < DUPLICATE_POSITION_EPS);
        if duplicate {
            continue;
        }
        kept.push((index, position));
    }
    if kept.len() < 3 {
        return Vec::new();
    }

    let mut min = kept[0].1;
    let mut max = kept[0].1;
    for &(_, position) in &kept[1..] {
        min = min.min(position);
        max = max.max(position);
    }
    let center = (min + max) * 0.5;
    let extent = (max - min).max_element().max(1.0) * 20.0;

    // Vertices 0..n are the kept samples; the super-triangle takes n..n+3.
    let n = kept.len();
    let mut vertices: Vec<Vec2> = kept.iter().map(|&(_, position)| position).collect();
    vertices.push(center + Vec2::new(-extent, -extent));
    vertices.push(center + Vec2::new(extent, -extent));
    vertices.push(center + Vec2::new(0.0, extent));

    let mut triangles: Vec<[usize; 3]> = vec![[n, n + 1, n + 2]];
    for point in 0..n {
        let position = vertices[point];
        let mut cavity: SmallVec<[(usize, usize); 32]> = SmallVec::new();
        let mut index = 0;
        while index < triangles.len() {
            let [a, b, c] = triangles[index];
            if circumcircle_contains(vertices[a], vertices[b], vertices[c], position) {
                push_cavity_edge(&mut cavity, a, b);
                push_cavity_edge(&mut cavity, b, c);
                push_cavity_edge(&mut cavity, c, a);
                triangles.swap_remove(index);
            } else {
                index += 1;
            }
        }
        for &(a, b) in cavity.iter() {
            triangles.push([a, b, point]);
        }
    }

    let mut result: Vec<[usize; 3]> = Vec::with_capacity(triangles.len());
    for [a, b, c] in triangles {
        if a >= n || b >= n || c >= n {
            continue;
        }
        if doubled_area(vertices[a], vertices[b], vertices[c]) < DEGENERATE_AREA_EPS {
            continue;
        }
        let mut triple = [kept[a].0, kept[b].0, kept[c].0];
        triple.sort_unstable();
        result.push(triple);
    }
    result.sort_unstable();
    result
}

/// Edges shared by two removed triangles are interior to the cavity and
/// cancel out; only boundary edges survive to be re-joined with the new
/// point.
fn push_cavity_edge(cavity: &mut SmallVec<[(usize, usize); 32]>, a: usize, b: usize) {
    let edge = (a.min(b), a.max(b));
    if let Some(found) = cavity.iter().position(|&existing| existing == edge) {
        cavity.swap_remove(found);
    } else {
        cavity.push(edge);
    }
}

/// Strict in-circle test in f64. Points exactly on the circle count as
/// outside, which keeps cospherical grids (squares) stable.
fn circumcircle_contains(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> bool {
    let ax = a.x as f64 - p.x as f64;
    let ay = a.y as f64 - p.y as f64;
    let bx = b.x as f64 - p.x as f64;
    let by = b.y as f64 - p.y as f64;
    let cx = c.x as f64 - p.x as f64;
    let cy = c.y as f64 - p.y as f64;
    let det = (ax * ax + ay * ay) * (bx * cy - cx * by)
        - (bx * bx + by * by) * (ax * cy - cx * ay)
        + (cx * cx + cy * cy) * (ax * by - bx * ay);
    let orientation = (b.x as f64 - a.x as f64) * (c.y as f64 - a.y as f64)
        - (b.y as f64 - a.y as f64) * (c.x as f64 - a.x as f64);
    if orientation >= 0.0 {
        det > 0.0
    } else {
        det < 0.0
    }
}
