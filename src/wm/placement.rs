//! Placement Module
//!
//! The tiling layout: every managed window gets an equal-width column spanning
//! the full screen height, in registry order.

use crate::shared::Geometry;

/// Equal-width vertical split of a `width` x `height` screen into `count`
/// columns.
///
/// Column `i` starts at `i * (width / count)`. The division remainder is left
/// uncovered at the right edge.
pub fn split_vertical(count: usize, width: u32, height: u32) -> Vec<Geometry> {
    if count == 0 {
        return Vec::new();
    }

    let tile_width = width / count as u32;

    (0..count)
        .map(|i| Geometry::new((i as u32 * tile_width) as i32, 0, tile_width, height))
        .collect()
}
