//! Fixed colour palette for tables and record kinds.
//!
//! Colours are packed RGBA8 values with the red channel in the low byte, the
//! layout expected by texture upload (`GL_RGBA` / `GL_UNSIGNED_BYTE` on a
//! little-endian host).

use serde::Serialize;

use crate::extent::RecordKind;

/// Base colours, indexed by `table_id % BASE_PALETTE.len()`.
pub static BASE_PALETTE: [u32; 15] = [
    0x00aedb, 0xa200ff, 0xf47835, 0xd41243, 0x8ec127, 0xff4e50, 0xfc913a, 0xf9d62e, 0xeae374,
    0xe2f4c7, 0xff00c1, 0x9600ff, 0x4900ff, 0x00b8ff, 0x70fff9,
];

/// Mask XORed into a table's base colour for value extents.
const VALUE_XOR_MASK: u32 = 0x666666;

const OPAQUE_ALPHA: u32 = 0xFF00_0000;

/// Opaque 32-bit colour of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    /// Unoccupied space inside the visible window.
    pub const FREE: Color = Color(0x0000_0000);

    /// Space after the last painted cell; no more data in the window.
    pub const TRAILING: Color = Color(0x30FF_FFFF);

    pub fn raw(self) -> u32 {
        self.0
    }

    /// Channels in `[r, g, b, a]` order.
    pub fn rgba(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub fn alpha(self) -> u8 {
        self.rgba()[3]
    }
}

/// Returns the colour used for extents of `kind` in table `table_id`.
pub fn color_for(table_id: u16, kind: RecordKind) -> Color {
    let mut color = BASE_PALETTE[usize::from(table_id) % BASE_PALETTE.len()];
    if kind == RecordKind::Value {
        color ^= VALUE_XOR_MASK;
    }
    Color(color | OPAQUE_ALPHA)
}
