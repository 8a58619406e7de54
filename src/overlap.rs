//! Ranking links by geometric overlap with a search match

use crate::regions::Region;
use crate::types::PixelRect;

/// Minimum `intersection / min(areas)` ratio for a search position to
/// count as "on a link"
pub const MIN_OVERLAP_RATIO: f64 = 0.5;

fn intersection_area(a: &PixelRect, b: &PixelRect) -> u64 {
    a.intersection(b).map_or(0, |r| r.area())
}

/// Regions overlapping `match_rect`, best overlap first.
///
/// Zero-intersection regions are dropped; the rest are sorted descending
/// by intersection area. Ties keep no particular order.
#[must_use]
pub fn pick<'a>(match_rect: &PixelRect, regions: &'a [Region]) -> Vec<&'a Region> {
    let mut hits: Vec<(u64, &Region)> = regions
        .iter()
        .filter_map(|region| {
            let area = intersection_area(match_rect, &region.rect);
            (area > 0).then_some((area, region))
        })
        .collect();

    hits.sort_by(|a, b| b.0.cmp(&a.0));
    hits.into_iter().map(|(_, region)| region).collect()
}

/// Overlap ratio normalized by the smaller of the two rects, so a tiny
/// match fully inside a large link (or vice versa) scores 1.0
#[must_use]
pub fn overlap_ratio(a: &PixelRect, b: &PixelRect) -> f64 {
    let denom = a.area().min(b.area());
    if denom == 0 {
        return 0.0;
    }
    intersection_area(a, b) as f64 / denom as f64
}

/// Whether a search match sits on this region, for restricting a search
/// to link positions
#[must_use]
pub fn overlapping(match_rect: &PixelRect, region: &Region) -> bool {
    overlap_ratio(match_rect, &region.rect) > MIN_OVERLAP_RATIO
}
