//! Splitting a preprocessed page into per-question regions.
//!
//! Every strategy cuts the page into full-width horizontal slices whose row
//! ranges are disjoint and together cover the whole page height.

use grademark_core::model::{region_id, LayoutTemplate};
use image::{imageops, GrayImage};

/// Pixels darker than this count as ink when looking for blank rows.
const INK_THRESHOLD: u8 = 128;

/// Rectangle in source page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One question's answer area cut out of a page.
#[derive(Debug, Clone)]
pub struct Region {
    pub question_id: String,
    pub image: GrayImage,
    pub bounds: BoundingBox,
}

impl Region {
    pub fn is_empty(&self) -> bool {
        self.bounds.width == 0 || self.bounds.height == 0
    }
}

/// How a page is divided into regions.
pub trait SegmentationStrategy: Send + Sync {
    /// Regions in top-to-bottom order.
    fn segment(&self, page: &GrayImage) -> Vec<Region>;
}

/// `N` equal horizontal bands named `q1..qN` top to bottom.
#[derive(Debug, Clone)]
pub struct FixedBands {
    bands: u32,
}

impl FixedBands {
    pub fn new(bands: u32) -> Self {
        Self {
            bands: bands.max(1),
        }
    }
}

impl SegmentationStrategy for FixedBands {
    fn segment(&self, page: &GrayImage) -> Vec<Region> {
        let height = u64::from(page.height());
        let n = u64::from(self.bands);
        // floor(i·H/N): heights differ by at most one row
        let boundary = |i: u64| (i * height / n) as u32;

        (0..self.bands)
            .map(|i| {
                let top = boundary(u64::from(i));
                let bottom = boundary(u64::from(i) + 1);
                cut(page, region_id(i + 1), top, bottom)
            })
            .collect()
    }
}

/// Regions placed by a layout template, with each boundary moved to the
/// emptiest nearby row so cuts fall between lines of writing.
#[derive(Debug, Clone)]
pub struct TemplateGuided {
    template: LayoutTemplate,
    search_radius: f64,
}

impl TemplateGuided {
    /// `None` when the template has no anchors to place.
    pub fn new(template: LayoutTemplate, search_radius: f64) -> Option<Self> {
        if template.anchors.is_empty() {
            return None;
        }
        Some(Self {
            template,
            search_radius,
        })
    }

    /// Start row of every region. The first is always 0 and the sequence is
    /// strictly increasing while the page has rows to spare.
    fn boundaries(&self, page: &GrayImage) -> Vec<u32> {
        let height = page.height();
        let count = self.template.anchors.len();
        let ink = row_ink(page);
        let radius = (self.search_radius * f64::from(height)).ceil() as i64;

        let mut starts = Vec::with_capacity(count);
        starts.push(0u32);

        for (i, anchor) in self.template.anchors.iter().enumerate().skip(1) {
            let previous = starts[i - 1];
            let remaining = (count - 1 - i) as u32;
            let lowest = previous.saturating_add(1);
            // leave one row for each region still to come
            let highest = height.saturating_sub(1).saturating_sub(remaining);

            if height == 0 || lowest > highest {
                starts.push(lowest.min(height));
                continue;
            }

            let expected = (anchor.start.clamp(0.0, 1.0) * f64::from(height)).round() as i64;
            let window_low = (expected - radius).max(i64::from(lowest));
            let window_high = (expected + radius).min(i64::from(highest));

            let boundary = if window_low > window_high {
                expected.clamp(i64::from(lowest), i64::from(highest)) as u32
            } else {
                (window_low..=window_high)
                    .min_by_key(|&row| (ink[row as usize], (row - expected).abs(), row))
                    .map_or(lowest, |row| row as u32)
            };
            starts.push(boundary);
        }

        starts
    }
}

impl SegmentationStrategy for TemplateGuided {
    fn segment(&self, page: &GrayImage) -> Vec<Region> {
        let starts = self.boundaries(page);
        let height = page.height();

        self.template
            .anchors
            .iter()
            .enumerate()
            .map(|(i, anchor)| {
                let top = starts[i];
                let bottom = starts.get(i + 1).copied().unwrap_or(height).max(top);
                cut(page, anchor.question_id.clone(), top, bottom)
            })
            .collect()
    }
}

/// Number of ink pixels in each row.
fn row_ink(page: &GrayImage) -> Vec<u32> {
    page.rows()
        .map(|row| row.filter(|p| p[0] < INK_THRESHOLD).count() as u32)
        .collect()
}

fn cut(page: &GrayImage, question_id: String, top: u32, bottom: u32) -> Region {
    let height = bottom.saturating_sub(top);
    let bounds = BoundingBox {
        x: 0,
        y: top,
        width: page.width(),
        height,
    };
    let image = imageops::crop_imm(page, 0, top, page.width(), height).to_image();
    tracing::debug!(%question_id, top, height, "region cut");
    Region {
        question_id,
        image,
        bounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grademark_core::model::TemplateAnchor;
    use image::Luma;

    fn blank(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([255]))
    }

    fn ink_rows(page: &mut GrayImage, rows: std::ops::RangeInclusive<u32>) {
        for y in rows {
            for x in 2..page.width() - 2 {
                page.put_pixel(x, y, Luma([0]));
            }
        }
    }

    fn template(anchors: &[(&str, f64)]) -> LayoutTemplate {
        LayoutTemplate {
            anchors: anchors
                .iter()
                .map(|(id, start)| TemplateAnchor {
                    question_id: id.to_string(),
                    start: *start,
                })
                .collect(),
        }
    }

    /// Regions tile [0, H) without gaps or overlaps.
    fn assert_lossless(regions: &[Region], height: u32) {
        let mut next = 0;
        for r in regions {
            assert_eq!(r.bounds.y, next, "gap or overlap at {}", r.question_id);
            assert_eq!(r.image.height(), r.bounds.height);
            next = r.bounds.y + r.bounds.height;
        }
        assert_eq!(next, height);
    }

    #[test]
    fn five_bands_partition_the_page() {
        let regions = FixedBands::new(5).segment(&blank(40, 100));
        let ids: Vec<&str> = regions.iter().map(|r| r.question_id.as_str()).collect();
        assert_eq!(ids, ["q1", "q2", "q3", "q4", "q5"]);
        assert!(regions.iter().all(|r| r.bounds.height == 20));
        assert!(regions.iter().all(|r| r.image.width() == 40));
        assert_lossless(&regions, 100);
    }

    #[test]
    fn uneven_heights_lose_no_rows() {
        let regions = FixedBands::new(5).segment(&blank(10, 103));
        let heights: Vec<u32> = regions.iter().map(|r| r.bounds.height).collect();
        assert_eq!(heights, [20, 21, 20, 21, 21]);
        assert_lossless(&regions, 103);
    }

    #[test]
    fn more_bands_than_rows() {
        let regions = FixedBands::new(5).segment(&blank(10, 3));
        assert_eq!(regions.len(), 5);
        assert!(regions.iter().any(Region::is_empty));
        assert_lossless(&regions, 3);
    }

    #[test]
    fn zero_bands_behaves_as_one() {
        let regions = FixedBands::new(0).segment(&blank(10, 10));
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].question_id, "q1");
    }

    #[test]
    fn boundary_snaps_to_nearest_blank_row() {
        let mut page = blank(50, 100);
        ink_rows(&mut page, 28..=33);
        let strategy = TemplateGuided::new(template(&[("q1", 0.0), ("q2", 0.3)]), 0.05).unwrap();

        let regions = strategy.segment(&page);
        assert_eq!(regions[1].question_id, "q2");
        assert_eq!(regions[1].bounds.y, 27);
        assert_lossless(&regions, 100);
    }

    #[test]
    fn blank_page_keeps_expected_boundaries() {
        let strategy = TemplateGuided::new(
            template(&[("q1", 0.0), ("q2", 0.25), ("q3", 0.5), ("q4", 0.75)]),
            0.05,
        )
        .unwrap();
        let regions = strategy.segment(&blank(20, 200));
        let tops: Vec<u32> = regions.iter().map(|r| r.bounds.y).collect();
        assert_eq!(tops, [0, 50, 100, 150]);
        assert_lossless(&regions, 200);
    }

    #[test]
    fn first_region_always_starts_at_top() {
        let strategy = TemplateGuided::new(template(&[("q1", 0.2), ("q2", 0.6)]), 0.05).unwrap();
        let regions = strategy.segment(&blank(10, 50));
        assert_eq!(regions[0].bounds.y, 0);
        assert_lossless(&regions, 50);
    }

    #[test]
    fn boundaries_are_strictly_increasing() {
        let strategy = TemplateGuided::new(
            template(&[("q1", 0.0), ("q2", 0.5), ("q3", 0.5), ("q4", 0.4)]),
            0.05,
        )
        .unwrap();
        let regions = strategy.segment(&blank(10, 60));
        for pair in regions.windows(2) {
            assert!(pair[1].bounds.y > pair[0].bounds.y);
        }
        assert_lossless(&regions, 60);
    }

    #[test]
    fn tiny_page_with_many_anchors_stays_lossless() {
        let strategy = TemplateGuided::new(
            template(&[("q1", 0.0), ("q2", 0.3), ("q3", 0.6), ("q4", 0.9)]),
            0.05,
        )
        .unwrap();
        let regions = strategy.segment(&blank(5, 2));
        assert_eq!(regions.len(), 4);
        assert_lossless(&regions, 2);
    }

    #[test]
    fn empty_template_is_rejected() {
        assert!(TemplateGuided::new(LayoutTemplate::default(), 0.05).is_none());
    }
}
