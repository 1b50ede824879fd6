use super::CellKey;

/// Cells at Chebyshev distance exactly `radius` from `center`, inside a grid of
/// `cells` per axis. Radius 0 yields the center cell itself.
pub fn shell_cells(center: CellKey, radius: u32, cells: u32) -> Vec<CellKey> {
    let r = radius as i64;
    let n = cells as i64;
    let [cx, cy, cz] = center.map(i64::from);
    let mut out = Vec::new();
    for x in (cx - r).max(0)..=(cx + r).min(n - 1) {
        for y in (cy - r).max(0)..=(cy + r).min(n - 1) {
            let on_face = (x - cx).abs() == r || (y - cy).abs() == r;
            if on_face {
                for z in (cz - r).max(0)..=(cz + r).min(n - 1) {
                    out.push([x as u32, y as u32, z as u32]);
                }
            } else {
                for z in [cz - r, cz + r] {
                    if (0..n).contains(&z) {
                        out.push([x as u32, y as u32, z as u32]);
                    }
                }
            }
        }
    }
    out
}

/// Cells in an unclipped shell of `radius`: `(2r+1)^3 - (2r-1)^3`.
pub fn shell_size(radius: u32) -> u64 {
    if radius == 0 {
        return 1;
    }
    let r = u64::from(radius);
    (2 * r + 1).pow(3) - (2 * r - 1).pow(3)
}
