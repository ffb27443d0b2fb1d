use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::{ImageFormat, RgbImage};
use log::info;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::color::generate_palette;
use crate::config::VennOptions;
use crate::overlap::OverlapCounts;

// ---------------------------------------------------------------------------
// Diagram geometry
// ---------------------------------------------------------------------------

/// Space reserved above the circles for the title.
const TITLE_HEIGHT: u32 = 50;
/// Circle radius as a fraction of the drawing area's shorter side.
const RADIUS_FRACTION: f64 = 0.26;
/// Distance of each circle centre from the diagram centre, in radii.
const CENTRE_OFFSET: f64 = 0.6;

/// Pixel positions of an unweighted three-circle Venn diagram.
///
/// Circles A and B sit on the upper left and right, C below; the centres form
/// an equilateral triangle around the middle of the area under the title.
#[derive(Debug, Clone, PartialEq)]
pub struct VennLayout {
    pub centres: [(i32, i32); 3],
    pub radius: i32,
    /// Count label positions: A, B, C, AB, AC, BC, ABC.
    pub region_labels: [(i32, i32); 7],
    /// Set name positions just outside each circle.
    pub set_labels: [(i32, i32); 3],
    pub title: (i32, i32),
}

impl VennLayout {
    pub fn new(width: u32, height: u32) -> Self {
        let area = height.saturating_sub(TITLE_HEIGHT);
        let cx = width as f64 / 2.0;
        let cy = TITLE_HEIGHT as f64 + area as f64 / 2.0;
        let r = RADIUS_FRACTION * width.min(area) as f64;
        let offset = CENTRE_OFFSET * r;

        // Unit vectors from the diagram centre towards A, B, C (y grows down).
        let dirs = [(-0.866, -0.5), (0.866, -0.5), (0.0, 1.0)];
        let at = |(dx, dy): (f64, f64), dist: f64| {
            ((cx + dx * dist).round() as i32, (cy + dy * dist).round() as i32)
        };
        // Pair regions lie opposite the third circle.
        let opposite = |(dx, dy): (f64, f64)| (-dx, -dy);

        let centres = dirs.map(|d| at(d, offset));
        let single = r;
        let pair = 0.75 * r;

        VennLayout {
            centres,
            radius: r.round() as i32,
            region_labels: [
                at(dirs[0], single),
                at(dirs[1], single),
                at(dirs[2], single),
                at(opposite(dirs[2]), pair),
                at(opposite(dirs[1]), pair),
                at(opposite(dirs[0]), pair),
                at((0.0, 0.0), 0.0),
            ],
            set_labels: dirs.map(|d| at(d, offset + r + 20.0)),
            title: (cx.round() as i32, (TITLE_HEIGHT / 2) as i32),
        }
    }

    /// Whether a point lies strictly inside circle `i`.
    #[cfg(test)]
    pub fn contains(&self, i: usize, (x, y): (i32, i32)) -> bool {
        let (cx, cy) = self.centres[i];
        let (dx, dy) = ((x - cx) as i64, (y - cy) as i64);
        dx * dx + dy * dy < (self.radius as i64).pow(2)
    }
}

fn region_values(counts: &OverlapCounts) -> [usize; 7] {
    [
        counts.only_a,
        counts.only_b,
        counts.only_c,
        counts.ab,
        counts.ac,
        counts.bc,
        counts.abc,
    ]
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn draw_err<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> anyhow::Error {
    anyhow!("drawing overlap diagram: {err}")
}

/// Draw the overlap diagram for three named sets and write it as PNG.
pub fn render_venn(
    path: &Path,
    labels: [&str; 3],
    counts: &OverlapCounts,
    options: &VennOptions,
) -> Result<()> {
    let (width, height) = (options.width, options.height);
    let layout = VennLayout::new(width, height);
    let colours = generate_palette(3);
    let mut buffer = vec![0u8; width as usize * height as usize * 3];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        for (centre, colour) in layout.centres.iter().zip(&colours) {
            root.draw(&Circle::new(*centre, layout.radius, colour.mix(0.4).filled()))
                .map_err(draw_err)?;
            root.draw(&Circle::new(*centre, layout.radius, colour.stroke_width(2)))
                .map_err(draw_err)?;
        }

        let centred = Pos::new(HPos::Center, VPos::Center);
        for (pos, value) in layout.region_labels.iter().zip(region_values(counts)) {
            root.draw(&Text::new(
                value.to_string(),
                *pos,
                ("sans-serif", 18).into_font().color(&BLACK).pos(centred),
            ))
            .map_err(draw_err)?;
        }
        for (pos, label) in layout.set_labels.iter().zip(labels) {
            root.draw(&Text::new(
                label,
                *pos,
                ("sans-serif", 22).into_font().color(&BLACK).pos(centred),
            ))
            .map_err(draw_err)?;
        }
        root.draw(&Text::new(
            options.title.as_str(),
            layout.title,
            ("sans-serif", 20).into_font().color(&BLACK).pos(centred),
        ))
        .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
    }

    let image = RgbImage::from_raw(width, height, buffer)
        .context("overlap diagram buffer has the wrong size")?;
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))?;

    info!("Overlap diagram written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inside(layout: &VennLayout, pos: (i32, i32)) -> [bool; 3] {
        [0, 1, 2].map(|i| layout.contains(i, pos))
    }

    #[test]
    fn test_region_labels_fall_in_their_regions() {
        let layout = VennLayout::new(600, 600);
        let [a, b, c, ab, ac, bc, abc] = layout.region_labels;

        assert_eq!(inside(&layout, a), [true, false, false]);
        assert_eq!(inside(&layout, b), [false, true, false]);
        assert_eq!(inside(&layout, c), [false, false, true]);
        assert_eq!(inside(&layout, ab), [true, true, false]);
        assert_eq!(inside(&layout, ac), [true, false, true]);
        assert_eq!(inside(&layout, bc), [false, true, true]);
        assert_eq!(inside(&layout, abc), [true, true, true]);
    }

    #[test]
    fn test_diagram_fits_canvas() {
        for (w, h) in [(600, 600), (800, 500), (400, 700)] {
            let layout = VennLayout::new(w, h);
            for &(x, y) in &layout.centres {
                assert!(x - layout.radius >= 0 && x + layout.radius <= w as i32);
                assert!(y - layout.radius >= TITLE_HEIGHT as i32 && y + layout.radius <= h as i32);
            }
            for &(x, y) in &layout.set_labels {
                assert!(x > 0 && x < w as i32 && y > 0 && y < h as i32, "{w}x{h}: {x},{y}");
            }
        }
    }

    #[test]
    fn test_set_labels_are_outside_circles() {
        let layout = VennLayout::new(600, 600);
        for pos in layout.set_labels {
            assert_eq!(inside(&layout, pos), [false, false, false]);
        }
    }

    #[test]
    fn test_region_values_order() {
        let counts = OverlapCounts {
            only_a: 1,
            only_b: 2,
            only_c: 3,
            ab: 4,
            ac: 5,
            bc: 6,
            abc: 7,
        };
        assert_eq!(region_values(&counts), [1, 2, 3, 4, 5, 6, 7]);
    }
}
