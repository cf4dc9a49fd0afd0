//! Binning of extents into a magnified colour grid.
//!
//! [`render`] is a pure function of the index, the output size and the view.
//! The visible window starts `skip * span` bytes into the map and each
//! logical cell covers `bytes_per_pixel` bytes, laid out row-major. Extents
//! are painted in ascending start order, so when several extents fall into
//! the same cell the last one painted wins.

use crate::extent::ExtentIndex;
use crate::palette::{color_for, Color};
use crate::view::ViewState;

/// A rendered pixel buffer and the byte range it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    /// `width * height` colours, row-major.
    pub pixels: Vec<Color>,
    /// First byte of the visible window.
    pub skip_offset: u64,
    /// Offset of the last painted cell.
    pub end_offset: u64,
    pub bytes_per_pixel: u64,
}

impl Frame {
    /// Colour of the output pixel at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Bytes represented by one full row of output pixels.
    pub fn bytes_per_row(&self) -> u64 {
        self.bytes_per_pixel.saturating_mul(self.width as u64)
    }

    /// Human-readable description of the visible window.
    pub fn status_line(&self, label: &str) -> String {
        format!(
            "DB: {label}   {} - {}   (row: {}, pixel: {})",
            crate::format::render_size(self.skip_offset),
            crate::format::render_size(self.end_offset),
            crate::format::render_size(self.bytes_per_row()),
            crate::format::render_size(self.bytes_per_pixel),
        )
    }
}

/// Renders `index` into a `width × height` frame.
///
/// View parameters are clamped rather than rejected, so this always produces
/// a fully populated frame.
pub fn render(index: &ExtentIndex, width: usize, height: usize, view: &ViewState) -> Frame {
    let view = view.clone().clamped();
    let magnification = view.magnification as usize;

    let logical_width = width / magnification;
    let logical_height = height / magnification;
    let cells = logical_width * logical_height;

    let span = index.span();
    let skip_offset = (span as f64 * view.skip) as u64;
    let bytes_per_pixel = bytes_per_pixel(span, cells, view.zoom);

    let mut grid = vec![Color::FREE; cells];
    let mut last_filled: Option<usize> = None;

    for extent in &index.extents()[index.first_at_or_after(skip_offset)..] {
        let pixel_index = (extent.start - skip_offset) / bytes_per_pixel;
        if pixel_index >= cells as u64 {
            break;
        }
        if !view.visibility.is_visible(extent.table_id, extent.kind) {
            continue;
        }

        let pixel_index = pixel_index as usize;
        let num_pixels = 1 + extent.size / bytes_per_pixel;
        let end = (pixel_index as u64)
            .saturating_add(num_pixels)
            .min(cells as u64) as usize;

        grid[pixel_index..end].fill(color_for(extent.table_id, extent.kind));
        last_filled = Some(last_filled.map_or(end - 1, |last| last.max(end - 1)));
    }

    let trailing_from = last_filled.map_or(0, |last| last + 1);
    grid[trailing_from..].fill(Color::TRAILING);

    let end_offset = match last_filled {
        Some(last) => skip_offset.saturating_add(bytes_per_pixel.saturating_mul(last as u64)),
        None => skip_offset,
    };

    log::trace!(
        "rendered {width}x{height} (x{magnification}): {cells} cells, {bytes_per_pixel} bytes/cell, window {skip_offset}..{end_offset}"
    );

    Frame {
        width,
        height,
        pixels: magnify(&grid, logical_width, logical_height, magnification, width, height),
        skip_offset,
        end_offset,
        bytes_per_pixel,
    }
}

/// Bytes represented by one logical cell; always at least one.
fn bytes_per_pixel(span: u64, cells: usize, zoom: f64) -> u64 {
    let per_cell = span / cells.max(1) as u64;
    let zoomed = (per_cell as f64 / zoom).floor() as u64;
    zoomed.saturating_add(1).max(1)
}

/// Replicates each logical cell into a `magnification × magnification` block.
///
/// Output pixels outside the logical grid (the remainder when the output size
/// is not a multiple of the magnification) are marked as trailing.
fn magnify(
    grid: &[Color],
    logical_width: usize,
    logical_height: usize,
    magnification: usize,
    width: usize,
    height: usize,
) -> Vec<Color> {
    let mut pixels = vec![Color::TRAILING; width * height];
    if grid.is_empty() {
        return pixels;
    }

    for (y, row) in pixels.chunks_exact_mut(width).enumerate() {
        let cell_y = y / magnification;
        if cell_y >= logical_height {
            break;
        }
        let cells = &grid[cell_y * logical_width..(cell_y + 1) * logical_width];
        for (cell, block) in cells.iter().zip(row.chunks_exact_mut(magnification)) {
            block.fill(*cell);
        }
    }
    pixels
}

/// Caches the last frame and re-renders only when the inputs change.
#[derive(Debug, Default)]
pub struct FrameCache {
    last: Option<(usize, usize, ViewState, Frame)>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a frame for the inputs and whether it was freshly rendered.
    pub fn frame(
        &mut self,
        index: &ExtentIndex,
        width: usize,
        height: usize,
        view: &ViewState,
    ) -> (&Frame, bool) {
        let stale = match &self.last {
            Some((last_width, last_height, last_view, _)) => {
                *last_width != width || *last_height != height || last_view != view
            }
            None => true,
        };
        if stale {
            self.last = None;
        }
        let (_, _, _, frame) = self
            .last
            .get_or_insert_with(|| (width, height, view.clone(), render(index, width, height, view)));
        (&*frame, stale)
    }

    /// Forces the next call to re-render.
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}
