//! Pagination and paper layout.
//!
//! Pages are stacked vertically in canvas pixels. One millimeter is
//! [`MM_TO_PX`] pixels at scale 1 (96 DPI).

use crate::schema::Schema;
use kurbo::{Point, Rect, Size, Vec2};

/// Pixels per millimeter at 96 DPI.
pub const MM_TO_PX: f64 = 3.7795275591;

/// Space reserved left of and above the pages for rulers, in pixels.
pub const RULER_OFFSET: f64 = 30.0;

/// Where the first page starts, with or without rulers.
pub fn ruler_origin(has_rulers: bool) -> Point {
    if has_rulers {
        Point::new(RULER_OFFSET, RULER_OFFSET)
    } else {
        Point::ZERO
    }
}

/// Where and how large one page is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperFrame {
    /// Page index.
    pub index: usize,
    /// Unscaled page size in pixels (millimeters times [`MM_TO_PX`]).
    pub paper_size: Size,
    /// Top-left corner of the page in canvas pixels.
    pub offset: Point,
    /// Zoom scale applied to `paper_size`.
    pub scale: f64,
}

impl PaperFrame {
    /// Page rectangle in canvas pixels.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.offset, self.paper_size * self.scale)
    }

    /// Convert a canvas pixel position to page millimeters.
    pub fn to_mm(&self, point: Point) -> Point {
        let local = point - self.offset;
        (local / (MM_TO_PX * self.scale)).to_point()
    }

    /// Convert a page millimeter position to canvas pixels.
    pub fn to_px(&self, point: Point) -> Point {
        self.offset + point.to_vec2() * (MM_TO_PX * self.scale)
    }

    /// Convert a rectangle in page millimeters to canvas pixels.
    pub fn rect_to_px(&self, rect: Rect) -> Rect {
        Rect::from_points(self.to_px(rect.origin()), self.to_px(Point::new(rect.x1, rect.y1)))
    }

    /// Convert a canvas pixel distance to millimeters.
    pub fn len_to_mm(&self, px: f64) -> f64 {
        px / (MM_TO_PX * self.scale)
    }

    /// Convert a canvas pixel delta to millimeters.
    pub fn delta_to_mm(&self, delta: Vec2) -> Vec2 {
        delta / (MM_TO_PX * self.scale)
    }
}

/// Stack pages vertically, separated by `gap` pixels.
///
/// `page_sizes` are in millimeters.
pub fn page_frames(page_sizes: &[Size], scale: f64, gap: f64) -> Vec<PaperFrame> {
    page_frames_at(page_sizes, scale, gap, Point::ZERO)
}

/// Like [`page_frames`], with the first page at `origin`.
pub fn page_frames_at(page_sizes: &[Size], scale: f64, gap: f64, origin: Point) -> Vec<PaperFrame> {
    let mut y = origin.y;
    page_sizes
        .iter()
        .enumerate()
        .map(|(index, size)| {
            let frame = PaperFrame {
                index,
                paper_size: *size * MM_TO_PX,
                offset: Point::new(origin.x, y),
                scale,
            };
            y += frame.rect().height() + gap;
            frame
        })
        .collect()
}

/// Page rectangles in canvas pixels.
pub fn page_rects(page_sizes: &[Size], scale: f64, gap: f64) -> Vec<Rect> {
    page_frames(page_sizes, scale, gap)
        .iter()
        .map(PaperFrame::rect)
        .collect()
}

/// Find the page under a canvas pixel position.
pub fn frame_at(frames: &[PaperFrame], point: Point) -> Option<&PaperFrame> {
    frames.iter().find(|f| f.rect().contains(point))
}

/// Scale that fits the widest page into the container, times `zoom`.
///
/// The fit part never enlarges and is floored to two decimals.
pub fn fit_scale(container_width: f64, page_sizes: &[Size], zoom: f64) -> f64 {
    let widest = page_sizes.iter().map(|s| s.width * MM_TO_PX).fold(0.0, f64::max);
    if widest <= 0.0 || container_width <= 0.0 {
        return zoom;
    }
    let fit = (container_width / widest).min(1.0);
    (fit * 100.0).floor() / 100.0 * zoom
}

/// The parallel page arrays driving per-page rendering.
///
/// Pages render only when all three arrays have the same length; during
/// asset loading they may briefly disagree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaperLayout {
    /// Schemas per page.
    pub schemas_list: Vec<Vec<Schema>>,
    /// Page sizes in millimeters.
    pub page_sizes: Vec<Size>,
    /// Background image reference per page.
    pub backgrounds: Vec<String>,
    /// Canvas position of the first page.
    pub origin: Point,
}

impl PaperLayout {
    pub fn new(schemas_list: Vec<Vec<Schema>>, page_sizes: Vec<Size>, backgrounds: Vec<String>) -> Self {
        Self {
            schemas_list,
            page_sizes,
            backgrounds,
            origin: Point::ZERO,
        }
    }

    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    /// Check that the three arrays have equal length.
    pub fn is_consistent(&self) -> bool {
        self.schemas_list.len() == self.page_sizes.len()
            && self.page_sizes.len() == self.backgrounds.len()
    }

    pub fn page_count(&self) -> usize {
        if self.is_consistent() {
            self.page_sizes.len()
        } else {
            0
        }
    }

    /// Page frames, or none when the arrays disagree.
    pub fn frames(&self, scale: f64, gap: f64) -> Vec<PaperFrame> {
        if !self.is_consistent() {
            return Vec::new();
        }
        page_frames_at(&self.page_sizes, scale, gap, self.origin)
    }

    /// Walk every page and schema.
    ///
    /// Calls `paper` once per page with its frame and background, then
    /// `schema` once per schema with its index on the page. Calls nothing
    /// when the arrays disagree. Returns the number of pages visited.
    pub fn render(
        &self,
        scale: f64,
        gap: f64,
        mut paper: impl FnMut(&PaperFrame, &str),
        mut schema: impl FnMut(&PaperFrame, usize, &Schema),
    ) -> usize {
        let frames = self.frames(scale, gap);
        for frame in &frames {
            paper(frame, &self.backgrounds[frame.index]);
            for (index, s) in self.schemas_list[frame.index].iter().enumerate() {
                schema(frame, index, s);
            }
        }
        frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_template;

    fn a4() -> Size {
        Size::new(210.0, 297.0)
    }

    #[test]
    fn test_paper_size_uses_conversion_factor() {
        let template = sample_template(1);
        let layout = PaperLayout::new(template.schemas.clone(), vec![a4()], vec!["bg".into()]);

        let mut papers = Vec::new();
        let mut schemas = Vec::new();
        layout.render(
            1.0,
            0.0,
            |frame, bg| papers.push((frame.index, frame.paper_size, bg.to_string())),
            |_, index, s| schemas.push((index, s.id.clone())),
        );

        assert_eq!(papers.len(), 1);
        assert!((papers[0].1.width - 210.0 * MM_TO_PX).abs() < 1e-9);
        assert!((papers[0].1.height - 297.0 * MM_TO_PX).abs() < 1e-9);
        assert_eq!(papers[0].2, "bg");
        assert_eq!(schemas, vec![(0, "schema-1".to_string())]);
    }

    #[test]
    fn test_mismatched_arrays_render_nothing() {
        let template = sample_template(2);
        let cases = [
            PaperLayout::new(template.schemas.clone(), vec![a4(), a4()], vec!["a".into()]),
            PaperLayout::new(template.schemas.clone(), vec![], vec!["a".into()]),
            PaperLayout::new(vec![], vec![a4()], vec!["a".into()]),
        ];
        for layout in cases {
            let calls = std::cell::Cell::new(0);
            let pages = layout.render(1.0, 0.0, |_, _| calls.set(calls.get() + 1), |_, _, _| calls.set(calls.get() + 1));
            assert_eq!(pages, 0);
            assert_eq!(calls.get(), 0);
        }
    }

    #[test]
    fn test_pages_stack_with_gap() {
        let rects = page_rects(&[a4(), a4()], 0.5, 30.0);
        let height = 297.0 * MM_TO_PX * 0.5;
        assert!((rects[0].y1 - height).abs() < 1e-9);
        assert!((rects[1].y0 - (height + 30.0)).abs() < 1e-9);
    }

    #[test]
    fn test_mm_px_conversion() {
        let frames = page_frames(&[a4(), a4()], 2.0, 10.0);
        let frame = frames[1];
        let px = frame.to_px(Point::new(10.0, 20.0));
        let back = frame.to_mm(px);
        assert!((back.x - 10.0).abs() < 1e-9);
        assert!((back.y - 20.0).abs() < 1e-9);
        assert!((frame.len_to_mm(MM_TO_PX * 2.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_frame_at() {
        let frames = page_frames(&[a4(), a4()], 1.0, 30.0);
        let second_top = frames[1].offset.y;
        assert_eq!(frame_at(&frames, Point::new(5.0, second_top + 5.0)).map(|f| f.index), Some(1));
        assert!(frame_at(&frames, Point::new(5.0, second_top - 10.0)).is_none());
    }

    #[test]
    fn test_ruler_origin_shifts_pages() {
        let layout = PaperLayout::new(vec![Vec::new(), Vec::new()], vec![a4(), a4()], vec![String::new(); 2])
            .with_origin(ruler_origin(true));
        let frames = layout.frames(1.0, 10.0);

        assert_eq!(frames[0].offset, Point::new(RULER_OFFSET, RULER_OFFSET));
        assert!((frames[1].offset.y - (RULER_OFFSET + 297.0 * MM_TO_PX + 10.0)).abs() < 1e-9);
        assert_eq!(frames[1].offset.x, RULER_OFFSET);
        let px = frames[0].to_px(Point::new(10.0, 0.0));
        assert!((frames[0].to_mm(px).x - 10.0).abs() < 1e-9);
        assert_eq!(ruler_origin(false), Point::ZERO);
    }

    #[test]
    fn test_fit_scale() {
        let width = 210.0 * MM_TO_PX;
        assert!((fit_scale(width * 2.0, &[a4()], 1.0) - 1.0).abs() < 1e-9);
        assert!((fit_scale(width / 2.0, &[a4()], 1.0) - 0.5).abs() < 1e-9);
        assert!((fit_scale(width / 2.0, &[a4()], 2.0) - 1.0).abs() < 1e-9);
        assert!((fit_scale(0.0, &[a4()], 1.5) - 1.5).abs() < 1e-9);
    }
}
