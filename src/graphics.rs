use failure::{format_err, Error};
use serde::Serialize;

use crate::util::Grid;

/// Edge length of an assembled room tile in pixels.
pub const TILE_SIZE: usize = 16;
/// Edge length of a raw SNES graphics tile in pixels.
pub const SUB_TILE_SIZE: usize = 8;
/// A 4bpp 8x8 tile occupies 32 bytes, planar or packed.
pub const BYTES_PER_SUB_TILE: usize = (SUB_TILE_SIZE * SUB_TILE_SIZE) / 2;

/// Normalized RGBA color.  The default value doubles as the transparent
/// sentinel: alpha is 0 only for pixels whose palette index was 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Decode a blob of little-endian BGR555 entries into opaque colors.
pub fn decode_palette(data: &[u8]) -> Vec<Color> {
    data.chunks_exact(2)
        .map(|e| {
            let p = u16::from(e[0]) | u16::from(e[1]) << 8;
            Color {
                r: f32::from(p & 0x1f) / 31.0,
                g: f32::from(p >> 5 & 0x1f) / 31.0,
                b: f32::from(p >> 10 & 0x1f) / 31.0,
                a: 1.0,
            }
        })
        .collect()
}

// SNES 4bpp is a planar format: bitplanes 0 and 1 interleaved row by row in
// the first 16 bytes of a tile, bitplanes 2 and 3 in the second 16.  Pixel
// (x, y) gets bit j from bit (7 - x) of the byte at 2*y + (j & 1) + 16*(j >> 1).
// Reference: https://mrclick.zophar.net/TilEd/download/consolegfx.txt
fn planar_pixel(tile: &[u8], x: usize, y: usize) -> u8 {
    let x_shift = (7 - x) as u8;
    let mut b = 0;
    for bit in 0..4 {
        let offset = y * 2 + (bit & 0x1) + ((bit >> 1) * 16);
        if (tile[offset] & (1 << x_shift)) != 0 {
            b |= 1 << bit;
        }
    }
    b
}

/// Rewrite planar 4bpp tiles in place as packed pixel indices, two per byte,
/// low nibble first.  A trailing partial tile is left untouched.
pub fn deplanarize(data: &mut [u8]) {
    let num_tiles = data.len() / BYTES_PER_SUB_TILE;

    for tile_num in 0..num_tiles {
        let tile = &mut data[(tile_num * BYTES_PER_SUB_TILE)..];

        let mut packed = [0; BYTES_PER_SUB_TILE];
        for y in 0..SUB_TILE_SIZE {
            for x in 0..SUB_TILE_SIZE {
                let val = planar_pixel(tile, x, y);
                packed[y * 4 + x / 2] |= if x & 0x1 == 0x1 { val << 4 } else { val }
            }
        }

        tile[..BYTES_PER_SUB_TILE].copy_from_slice(&packed);
    }
}

/// Spread packed nibbles into one pixel index per byte, row major within each
/// 8x8 tile.  The result is twice as long as the input and every byte is in
/// 0..=15.
pub fn split_nibbles(data: &[u8]) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(data.len() * 2);
    for b in data {
        pixels.push(b & 0xf);
        pixels.push(b >> 4);
    }
    pixels
}

/// How four 8x8 subtiles compose one 16x16 tile.  Each descriptor packs a
/// subtile index (low 10 bits), palette high bits (0x1c00), an x flip
/// (0x4000) and a y flip (0x8000).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TileAssembler {
    pub ul: u16,
    pub ur: u16,
    pub dl: u16,
    pub dr: u16,
}

/// Parse a decompressed tile table, 8 bytes per assembler.  A trailing
/// partial record is dropped.
pub fn read_assemblers(data: &[u8]) -> Vec<TileAssembler> {
    data.chunks_exact(8)
        .map(|e| TileAssembler {
            ul: u16::from(e[0]) | u16::from(e[1]) << 8,
            ur: u16::from(e[2]) | u16::from(e[3]) << 8,
            dl: u16::from(e[4]) | u16::from(e[5]) << 8,
            dr: u16::from(e[6]) | u16::from(e[7]) << 8,
        })
        .collect()
}

/// Rasterize one subtile descriptor into `dest` with its upper left corner at
/// (x, y).  Pixel index 0 stays transparent.
pub fn draw_sub_tile(
    sub_tiles: &[u8],
    tile_info: u16,
    palette: &[Color],
    dest: &mut Grid<Color>,
    x: usize,
    y: usize,
) -> Result<(), Error> {
    let x_mask = if tile_info & 0x4000 != 0 { 7 } else { 0 };
    let y_mask = if tile_info & 0x8000 != 0 { 7 } else { 0 };
    let hi = (tile_info & 0x1c00) >> 6;
    let base = (tile_info & 0x3ff) as usize * 64;

    for ty in 0..SUB_TILE_SIZE {
        for tx in 0..SUB_TILE_SIZE {
            let lo = *sub_tiles
                .get(base + (tx ^ x_mask) + (ty ^ y_mask) * 8)
                .ok_or_else(|| format_err!("subtile {:#x} out of range", tile_info & 0x3ff))?;
            *dest.at_mut(x + tx, y + ty) = if lo == 0 {
                Color::default()
            } else {
                *palette
                    .get((hi | u16::from(lo)) as usize)
                    .ok_or_else(|| format_err!("palette index {:#x} out of range", hi | u16::from(lo)))?
            };
        }
    }
    Ok(())
}

/// Assemble the full tile set: one 16x16 color tile per assembler record.
pub fn build_tile_set(
    sub_tiles: &[u8],
    assemblers: &[TileAssembler],
    palette: &[Color],
) -> Result<Vec<Grid<Color>>, Error> {
    let mut tile_set = Vec::with_capacity(assemblers.len());
    for a in assemblers {
        let mut tile = Grid::new(TILE_SIZE, TILE_SIZE);
        draw_sub_tile(sub_tiles, a.ul, palette, &mut tile, 0, 0)?;
        draw_sub_tile(sub_tiles, a.ur, palette, &mut tile, TILE_SIZE / 2, 0)?;
        draw_sub_tile(sub_tiles, a.dl, palette, &mut tile, 0, TILE_SIZE / 2)?;
        draw_sub_tile(sub_tiles, a.dr, palette, &mut tile, TILE_SIZE / 2, TILE_SIZE / 2)?;
        tile_set.push(tile);
    }
    Ok(tile_set)
}

#[cfg(feature = "render")]
pub fn render_grid(grid: &Grid<Color>) -> image::RgbaImage {
    let mut img = image::RgbaImage::new(grid.width() as u32, grid.height() as u32);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let c = grid.at(x as usize, y as usize);
        *pixel = image::Rgba([
            (c.r * 255.0) as u8,
            (c.g * 255.0) as u8,
            (c.b * 255.0) as u8,
            (c.a * 255.0) as u8,
        ]);
    }
    img
}
