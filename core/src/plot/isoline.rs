use ndarray::ArrayView2;

/// Point in grid coordinates: `x` is the column index, `y` the row index
pub type Point = (f64, f64);

/// Straight piece of an isoline
pub type Segment = [Point; 2];

/// Traces the isoline at `level` through a 2-D grid with marching squares
///
/// Grid values sit at integer coordinates; crossings are placed by linear
/// interpolation along cell edges. Cells touching a NaN are skipped.
/// Ambiguous saddle cells are resolved with the mean of the four corners.
pub fn isolines(grid: ArrayView2<'_, f64>, level: f64) -> Vec<Segment> {
    let (rows, cols) = grid.dim();
    let mut segments = Vec::new();
    if rows < 2 || cols < 2 {
        return segments;
    }

    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            // counter-clockwise from (c, r)
            let corners: [(Point, f64); 4] = [
                ((c as f64, r as f64), grid[[r, c]]),
                (((c + 1) as f64, r as f64), grid[[r, c + 1]]),
                (((c + 1) as f64, (r + 1) as f64), grid[[r + 1, c + 1]]),
                ((c as f64, (r + 1) as f64), grid[[r + 1, c]]),
            ];
            if corners.iter().any(|(_, v)| v.is_nan()) {
                continue;
            }

            let above = corners.map(|(_, v)| v >= level);

            // crossing on edge i, which joins corner i and corner i + 1
            let crossing = |i: usize| -> Option<Point> {
                let j = (i + 1) % 4;
                if above[i] == above[j] {
                    return None;
                }
                let ((x0, y0), v0) = corners[i];
                let ((x1, y1), v1) = corners[j];
                let t = (level - v0) / (v1 - v0);
                Some((x0 + t * (x1 - x0), y0 + t * (y1 - y0)))
            };
            let edges: Vec<Point> = (0..4).filter_map(crossing).collect();

            match edges.len() {
                2 => segments.push([edges[0], edges[1]]),
                4 => {
                    let centre = corners.iter().map(|(_, v)| v).sum::<f64>() / 4.0;
                    let centre_above = centre >= level;
                    let (e0, e1, e2, e3) = (edges[0], edges[1], edges[2], edges[3]);
                    if above[0] != centre_above {
                        segments.push([e3, e0]);
                        segments.push([e1, e2]);
                    } else {
                        segments.push([e0, e1]);
                        segments.push([e2, e3]);
                    }
                }
                _ => {}
            }
        }
    }

    segments
}
