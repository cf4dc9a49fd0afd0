//! Binary PPM output of a rendered frame.

use std::io::{self, Write};

use lmdb_viz::{Color, Frame};

/// Colour shown behind translucent and free pixels, as RGB fractions.
pub const BACKGROUND: [f64; 3] = [0.45, 0.55, 0.60];

/// Blends `color` over [`BACKGROUND`] by its alpha.
pub fn composite(color: Color) -> [u8; 3] {
    let [r, g, b, a] = color.rgba();
    let alpha = f64::from(a) / 255.0;
    let blend = |channel: u8, background: f64| {
        (f64::from(channel) * alpha + background * 255.0 * (1.0 - alpha))
            .round()
            .clamp(0.0, 255.0) as u8
    };
    [
        blend(r, BACKGROUND[0]),
        blend(g, BACKGROUND[1]),
        blend(b, BACKGROUND[2]),
    ]
}

/// Writes `frame` as a P6 image.
pub fn write_ppm<W: Write>(frame: &Frame, mut writer: W) -> io::Result<()> {
    write!(writer, "P6\n{} {}\n255\n", frame.width, frame.height)?;
    let mut row = Vec::with_capacity(frame.width * 3);
    for pixels in frame.pixels.chunks(frame.width.max(1)) {
        row.clear();
        for pixel in pixels {
            row.extend_from_slice(&composite(*pixel));
        }
        writer.write_all(&row)?;
    }
    writer.flush()
}
