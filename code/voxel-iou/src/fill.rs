//! Interior fill along one `(x, y)` column.
//!
//! A front-facing run followed by empty cells and then a back-facing run is
//! read as entering and leaving a solid, and the empty cells between them are
//! filled. This approximates a parity test without casting rays. It is a
//! heuristic: open or self-intersecting surfaces can leave interiors unfilled
//! or, where facings are ambiguous, fill spans a true parity test would not.

use std::ops::Range;

use crate::grid::Facing;

/// Returns the z ranges to fill. `cell(z)` is `None` for an empty cell.
pub(crate) fn interior_spans(depth: u32, cell: impl Fn(u32) -> Option<Facing>) -> Vec<Range<u32>> {
    let mut spans = Vec::new();
    let mut z = 0;
    while z < depth {
        // Only a front face opens a span.
        if cell(z) != Some(Facing::Front) {
            z += 1;
            continue;
        }
        while z < depth && cell(z) == Some(Facing::Front) {
            z += 1;
        }
        let start = z;
        while z < depth && cell(z).is_none() {
            z += 1;
        }
        if z >= depth {
            break;
        }
        if cell(z) == Some(Facing::Back) {
            if start < z {
                spans.push(start..z);
            }
            while z < depth && cell(z) == Some(Facing::Back) {
                z += 1;
            }
        }
        // A front face right after the gap: start over from it.
    }
    spans
}
