//! Reader for the room data of a Super Metroid (U) ROM image.
//!
//! `Rom` wraps the raw image; `Room::open` reconstructs one room from it:
//! header, selected state, decompressed tile layers with the BTS plane,
//! scroll grid, rebuilt 16x16 tile set and door records.

pub mod compression;
pub mod graphics;
pub mod rommap;
mod util;

use byteorder::{LittleEndian, ReadBytesExt};
use failure::{format_err, Error};
use num::FromPrimitive;
use num_derive::FromPrimitive;
use serde::Serialize;
use serde_hex::{SerHex, StrictPfx};
use std::cmp;
use std::io::Cursor;
use std::path::Path;

pub use crate::graphics::{Color, TileAssembler, TILE_SIZE};
pub use crate::rommap::{cpu_to_rom, ROOMS, ROOM_OFFSETS};
pub use crate::util::Grid;

macro_rules! is_bit_set {
    ($value:expr, $test:expr) => {
        ($value & $test) == $test
    };
}

/// Map cells per room screen, in both directions.
pub const CHUNK_SIZE: usize = 16;

#[derive(Clone, Copy, Debug, FromPrimitive, PartialEq, Serialize)]
#[repr(u8)]
pub enum Region {
    Crateria = 0x00,
    Brinstar = 0x01,
    Norfair = 0x02,
    WreckedShip = 0x03,
    Maridia = 0x04,
    Tourian = 0x05,
    Ceres = 0x06,
    Debug = 0x07,
}

#[derive(Clone, Copy, Debug, FromPrimitive, PartialEq, Serialize)]
#[repr(u8)]
pub enum BlockType {
    Air = 0x0,
    Slope = 0x1,
    SpikeAir = 0x2,
    SpecialAir = 0x3,
    ShootableAir = 0x4,
    HorizontalExtension = 0x5,
    UnusedAir = 0x6,
    BombableAir = 0x7,
    SolidBlock = 0x8,
    DoorBlock = 0x9,
    SpikeBlock = 0xa,
    SpecialBlock = 0xb,
    ShootableBlock = 0xc,
    VerticalExtension = 0xd,
    GrappleBlock = 0xe,
    BombableBlock = 0xf,
}

impl Default for BlockType {
    fn default() -> BlockType {
        BlockType::Air
    }
}

/// The 16 bit codes a room's state entry list is built from.  STANDARD is
/// the unconditional fallback and terminates the list; every other code
/// predicates its state on game progress or equipment.
#[derive(Clone, Copy, Debug, FromPrimitive, PartialEq, Serialize)]
#[repr(u16)]
pub enum StateCode {
    Standard = 0xe5e6,
    Doors = 0xe5eb,
    TourianBoss1 = 0xe5ff,
    Events = 0xe612,
    Bosses = 0xe629,
    Morph = 0xe640,
    MorphAndMissiles = 0xe652,
    PowerBombs = 0xe669,
    SpeedBooster = 0xe678,
}

impl StateCode {
    /// Whole entry size in bytes, the 2 byte code included.
    pub fn entry_size(self) -> usize {
        match self {
            StateCode::Standard => 2,
            StateCode::Doors => 6,
            StateCode::TourianBoss1
            | StateCode::Morph
            | StateCode::MorphAndMissiles
            | StateCode::PowerBombs
            | StateCode::SpeedBooster => 4,
            StateCode::Events | StateCode::Bosses => 5,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StateCode::Standard => "STANDARD",
            StateCode::Doors => "Doors",
            StateCode::TourianBoss1 => "Tourian Boss 1",
            StateCode::Events => "Events",
            StateCode::Bosses => "Bosses",
            StateCode::Morph => "Morph",
            StateCode::MorphAndMissiles => "Morph & Missiles",
            StateCode::PowerBombs => "Power Bombs",
            StateCode::SpeedBooster => "Speed Booster",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RoomHeader {
    pub index: u8,
    pub region: Region,
    pub x: u8,
    pub y: u8,
    /// Room size in screens of 16x16 map cells.
    pub width: u8,
    pub height: u8,
    pub up_scroller: u8,
    pub down_scroller: u8,
    pub graphics_flags: u8,
    /// Pointer to the door pointer list, bank $8F.
    pub doors: u16,
}

impl RoomHeader {
    pub const SIZE: usize = 11;

    fn read(data: &[u8]) -> Result<RoomHeader, Error> {
        let mut r = Cursor::new(data);
        Ok(RoomHeader {
            index: r.read_u8()?,
            region: Region::from_u8(r.read_u8()?)
                .ok_or_else(|| format_err!("unknown region"))?,
            x: r.read_u8()?,
            y: r.read_u8()?,
            width: r.read_u8()?,
            height: r.read_u8()?,
            up_scroller: r.read_u8()?,
            down_scroller: r.read_u8()?,
            graphics_flags: r.read_u8()?,
            doors: r.read_u16::<LittleEndian>()?,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RoomState {
    /// 24 bit CPU pointer to the compressed layer blob.
    #[serde(with = "SerHex::<StrictPfx>")]
    pub data: u32,
    pub tile_set: u8,
    pub music_track: u8,
    pub music_control: u8,
    pub fx1: u16,
    pub enemies: u16,
    pub enemy_set: u16,
    pub layer2: u16,
    /// Scroll grid pointer, bank $8F; values below 0x8000 mean no data.
    pub scroll: u16,
    pub unknown: u16,
    pub fx2: u16,
    pub plm: u16,
    pub background: u16,
    pub layer_handling: u16,
}

impl RoomState {
    fn read(data: &[u8]) -> Result<RoomState, Error> {
        let mut r = Cursor::new(data);
        Ok(RoomState {
            data: r.read_u24::<LittleEndian>()?,
            tile_set: r.read_u8()?,
            music_track: r.read_u8()?,
            music_control: r.read_u8()?,
            fx1: r.read_u16::<LittleEndian>()?,
            enemies: r.read_u16::<LittleEndian>()?,
            enemy_set: r.read_u16::<LittleEndian>()?,
            layer2: r.read_u16::<LittleEndian>()?,
            scroll: r.read_u16::<LittleEndian>()?,
            unknown: r.read_u16::<LittleEndian>()?,
            fx2: r.read_u16::<LittleEndian>()?,
            plm: r.read_u16::<LittleEndian>()?,
            background: r.read_u16::<LittleEndian>()?,
            layer_handling: r.read_u16::<LittleEndian>()?,
        })
    }
}

/// One 16 bit map cell entry: tile set index, flips and the block property
/// nibble.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TileLayer {
    pub index: u16,
    pub flip_h: bool,
    pub flip_v: bool,
    pub property: BlockType,
}

impl TileLayer {
    fn new(value: u16) -> Result<TileLayer, Error> {
        Ok(TileLayer {
            index: value & 0x3ff,
            flip_h: is_bit_set!(value, 0x400),
            flip_v: is_bit_set!(value, 0x800),
            property: BlockType::from_u8((value >> 12) as u8)
                .ok_or_else(|| format_err!("unknown block type"))?,
        })
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Tile {
    pub layer1: TileLayer,
    /// Behavior byte; the door list index when layer 1 is a door block.
    pub bts: u8,
    pub layer2: Option<TileLayer>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Door {
    /// File offset of the destination room header (copier header excluded),
    /// or 0 for an empty record.
    #[serde(with = "SerHex::<StrictPfx>")]
    pub room: u32,
    pub door_bit_flag: u8,
    pub direction: u8,
    pub illusion_x: u8,
    pub illusion_y: u8,
    pub x: u8,
    pub y: u8,
    pub distance: u16,
    pub scroll_data: u16,
}

impl Door {
    fn read(data: &[u8]) -> Result<Door, Error> {
        let mut r = Cursor::new(data);
        let room = r.read_u16::<LittleEndian>()?;
        // Record byte 2 is never used by the game.
        r.read_u8()?;
        Ok(Door {
            room: if room != 0 {
                cpu_to_rom(0x8f_0000 | u32::from(room)) as u32
            } else {
                0
            },
            door_bit_flag: r.read_u8()?,
            direction: r.read_u8()?,
            illusion_x: r.read_u8()?,
            illusion_y: r.read_u8()?,
            x: r.read_u8()?,
            y: r.read_u8()?,
            distance: r.read_u16::<LittleEndian>()?,
            scroll_data: r.read_u16::<LittleEndian>()?,
        })
    }
}

/// One corner of a room quad: pixel position plus texture coordinates into
/// a tile set atlas.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Vertex {
    pub x: u32,
    pub y: u32,
    pub tx: u32,
    pub ty: u32,
}

#[derive(Clone, Debug)]
pub struct Rom {
    buffer: Vec<u8>,
    header_length: usize,
}

impl Rom {
    /// Wrap a ROM image.  An image size that is not a multiple of 32 KiB
    /// means a 512 byte copier header is present.  PAL images are rejected.
    pub fn new(buffer: Vec<u8>) -> Result<Rom, Error> {
        let header_length = if buffer.len() % 0x8000 == 0 { 0 } else { 512 };
        let rom = Rom {
            buffer,
            header_length,
        };
        if rom.u8_at(header_length + rommap::PAL_FLAG)? >= 2 {
            return Err(format_err!("ROM is PAL. This doesn't work on PAL ROMs."));
        }
        Ok(rom)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Rom, Error> {
        Rom::new(std::fs::read(path)?)
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn header_length(&self) -> usize {
        self.header_length
    }

    fn slice_from(&self, offset: usize) -> Result<&[u8], Error> {
        self.buffer
            .get(offset..)
            .ok_or_else(|| format_err!("read past end of ROM at {:#x}", offset))
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8, Error> {
        self.buffer
            .get(offset)
            .copied()
            .ok_or_else(|| format_err!("read past end of ROM at {:#x}", offset))
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16, Error> {
        util::u16_at(&self.buffer, offset)
    }

    pub fn u24_at(&self, offset: usize) -> Result<u32, Error> {
        util::u24_at(&self.buffer, offset)
    }

    /// Read a 24 bit CPU pointer and map it to a file offset.
    pub fn pointer_at(&self, offset: usize) -> Result<usize, Error> {
        Ok(cpu_to_rom(self.u24_at(offset)?))
    }
}

#[derive(Debug, Serialize)]
pub struct Room {
    pub header: RoomHeader,
    pub state_codes: Vec<StateCode>,
    /// Predicate byte of the selected entry when its code is EVENTS or
    /// BOSSES.
    pub state_code_value: u8,
    pub state: RoomState,
    /// One byte per screen.
    pub scroll: Grid<u8>,
    /// One entry per map cell.
    pub tiles: Grid<Tile>,
    pub tile_set: Vec<Grid<Color>>,
    pub doors: Vec<Door>,
}

impl Room {
    /// Read one room.  `offset` comes from `ROOM_OFFSETS`; `state_index`
    /// selects an entry of the state list, `None` the STANDARD fallback.
    pub fn open(rom: &Rom, offset: usize, state_index: Option<usize>) -> Result<Room, Error> {
        let mut offset = offset + rom.header_length();

        let header = RoomHeader::read(rom.slice_from(offset)?)?;
        offset += RoomHeader::SIZE;

        // Scan the state entry list.  Every code is recorded; the chosen
        // entry is remembered by the offset just past it.  STANDARD both
        // terminates the list and doubles as the default choice.
        let mut state_codes = Vec::new();
        let mut state_code_value = 0;
        let mut found_state = false;
        let mut state_offset = 0;
        for i in 0.. {
            let raw = rom.u16_at(offset)?;
            let code = StateCode::from_u16(raw)
                .ok_or_else(|| format_err!("unknown state code {:#06x}", raw))?;
            offset += code.entry_size();
            state_codes.push(code);
            if state_index == Some(i) || (code == StateCode::Standard && !found_state) {
                found_state = true;
                state_offset = offset;
                if code == StateCode::Events || code == StateCode::Bosses {
                    state_code_value = rom.u8_at(offset - 3)?;
                }
            }
            if code == StateCode::Standard {
                break;
            }
        }
        // A non-STANDARD entry ends with a 16 bit pointer (bank $8F) to its
        // state block; STANDARD's block sits right after the code.
        if let Some(i) = state_index {
            if i < state_codes.len() && state_codes[i] != StateCode::Standard {
                state_offset = rom.header_length()
                    + cpu_to_rom(0x8f_0000 | u32::from(rom.u16_at(state_offset - 2)?));
            }
        }
        let state = RoomState::read(rom.slice_from(state_offset)?)?;

        let mut scroll = Grid::new(usize::from(header.width), usize::from(header.height));
        if state.scroll >= 0x8000 {
            let data = rom.slice_from(
                rom.header_length() + cpu_to_rom(0x8f_0000 | u32::from(state.scroll)),
            )?;
            let mut k = 0;
            for x in 0..scroll.width() {
                for y in 0..scroll.height() {
                    *scroll.at_mut(x, y) = *data
                        .get(k)
                        .ok_or_else(|| format_err!("scroll data past end of ROM"))?;
                    k += 1;
                }
            }
        }

        // Layer planes.  The blob leads with the layer 1 byte size; BTS is
        // one byte per cell; a second layer is present when the blob is long
        // enough to hold one.
        let blob = compression::decompress(rom.slice_from(cpu_to_rom(state.data))?)?;
        let room_data_size = usize::from(util::u16_at(&blob, 0)?);
        let has_layer2 = blob.len() > 2 + room_data_size + room_data_size / 2;
        let mut tiles = Grid::new(
            usize::from(header.width) * CHUNK_SIZE,
            usize::from(header.height) * CHUNK_SIZE,
        );
        let mut doors_in_room = 0;
        for x in 0..tiles.width() {
            for y in 0..tiles.height() {
                let cell = x + y * tiles.width();
                let layer1 = TileLayer::new(util::u16_at(&blob, 2 + 2 * cell)?)?;
                let bts = *blob
                    .get(2 + room_data_size + cell)
                    .ok_or_else(|| format_err!("layer blob too short"))?;
                let layer2 = if has_layer2 {
                    Some(TileLayer::new(util::u16_at(
                        &blob,
                        2 + room_data_size + room_data_size / 2 + 2 * cell,
                    )?)?)
                } else {
                    None
                };
                if layer1.property == BlockType::DoorBlock {
                    doors_in_room = cmp::max(doors_in_room, usize::from(bts) + 1);
                }
                *tiles.at_mut(x, y) = Tile { layer1, bts, layer2 };
            }
        }

        // Graphics: region tiles sized to a fixed buffer, CRE tiles
        // appended, then deplanarized and spread to one byte per pixel.
        let entry =
            rommap::TILESET_TABLE + usize::from(state.tile_set) * rommap::TILESET_ENTRY_SIZE;
        let mut gfx = compression::decompress(rom.slice_from(rom.pointer_at(entry + 3)?)?)?;
        gfx.resize(if state.tile_set == 26 { 0x8000 } else { 0x5000 }, 0);
        let cre = compression::decompress(rom.slice_from(rommap::CRE_TILES)?)?;
        gfx.extend_from_slice(&cre);
        graphics::deplanarize(&mut gfx);
        let sub_tiles = graphics::split_nibbles(&gfx);

        let palette = graphics::decode_palette(&compression::decompress(
            rom.slice_from(rom.pointer_at(entry + 6)?)?,
        )?);

        // Tile table: the shared CRE table first, except in Ceres, then the
        // region's own.
        let mut table = if header.region != Region::Ceres {
            compression::decompress(rom.slice_from(rommap::CRE_TILE_TABLE)?)?
        } else {
            Vec::new()
        };
        table.extend(compression::decompress(rom.slice_from(rom.pointer_at(entry)?)?)?);
        let tile_set =
            graphics::build_tile_set(&sub_tiles, &graphics::read_assemblers(&table), &palette)?;

        // Door records, through the pointer list in bank $8F to the records
        // in bank $83.
        let list = rom.header_length() + cpu_to_rom(0x8f_0000 | u32::from(header.doors));
        let mut doors = Vec::new();
        for i in 0..doors_in_room {
            let ptr = rom.u16_at(list + 2 * i)?;
            doors.push(Door::read(rom.slice_from(
                rom.header_length() + cpu_to_rom(0x83_0000 | u32::from(ptr)),
            )?)?);
        }

        Ok(Room {
            header,
            state_codes,
            state_code_value,
            state,
            scroll,
            tiles,
            tile_set,
            doors,
        })
    }

    /// The door behind map cell (x, y), when that cell is a door block.
    pub fn read_door(&self, x: usize, y: usize) -> Option<&Door> {
        let tile = self.tiles.get(x, y)?;
        if tile.layer1.property != BlockType::DoorBlock {
            return None;
        }
        self.doors.get(usize::from(tile.bts))
    }

    fn push_quad(
        vertices: &mut Vec<Vertex>,
        x: usize,
        y: usize,
        layer: &TileLayer,
        tiles_wide: usize,
    ) {
        let tile_x = usize::from(layer.index) % tiles_wide * TILE_SIZE;
        let tile_y = usize::from(layer.index) / tiles_wide * TILE_SIZE;
        let (txi, txf) = if layer.flip_h {
            (tile_x + TILE_SIZE - 1, tile_x)
        } else {
            (tile_x, tile_x + TILE_SIZE - 1)
        };
        let (tyi, tyf) = if layer.flip_v {
            (tile_y + TILE_SIZE - 1, tile_y)
        } else {
            (tile_y, tile_y + TILE_SIZE - 1)
        };
        let (x, y) = (x * TILE_SIZE, y * TILE_SIZE);
        vertices.push(Vertex {
            x: x as u32,
            y: y as u32,
            tx: txi as u32,
            ty: tyi as u32,
        });
        vertices.push(Vertex {
            x: (x + TILE_SIZE) as u32,
            y: y as u32,
            tx: txf as u32,
            ty: tyi as u32,
        });
        vertices.push(Vertex {
            x: (x + TILE_SIZE) as u32,
            y: (y + TILE_SIZE) as u32,
            tx: txf as u32,
            ty: tyf as u32,
        });
        vertices.push(Vertex {
            x: x as u32,
            y: (y + TILE_SIZE) as u32,
            tx: txi as u32,
            ty: tyf as u32,
        });
    }

    /// Quad vertices for the whole room, the layer 2 pass first so layer 1
    /// draws over it.  Texture coordinates index a tile set atlas
    /// `tiles_wide` tiles across; flips swap the coordinate extremes.
    pub fn quads(&self, tiles_wide: usize) -> Vec<Vertex> {
        let mut vertices = Vec::new();
        for x in 0..self.tiles.width() {
            for y in 0..self.tiles.height() {
                if let Some(layer2) = &self.tiles.at(x, y).layer2 {
                    Self::push_quad(&mut vertices, x, y, layer2, tiles_wide);
                }
            }
        }
        for x in 0..self.tiles.width() {
            for y in 0..self.tiles.height() {
                Self::push_quad(&mut vertices, x, y, &self.tiles.at(x, y).layer1, tiles_wide);
            }
        }
        vertices
    }

    /// Rasterize the tile set as one sheet, `tiles_wide` tiles per row.
    pub fn draw_tile_set(&self, tiles_wide: usize) -> Grid<Color> {
        let mut dest = Grid::new(
            tiles_wide * TILE_SIZE,
            (self.tile_set.len() / tiles_wide + 1) * TILE_SIZE,
        );
        for (i, tile) in self.tile_set.iter().enumerate() {
            let ox = i % tiles_wide * TILE_SIZE;
            let oy = i / tiles_wide * TILE_SIZE;
            for y in 0..TILE_SIZE {
                for x in 0..TILE_SIZE {
                    *dest.at_mut(ox + x, oy + y) = *tile.at(x, y);
                }
            }
        }
        dest
    }

    #[cfg(feature = "render")]
    pub fn render_tile_set(&self, tiles_wide: usize) -> image::RgbaImage {
        graphics::render_grid(&self.draw_tile_set(tiles_wide))
    }
}

pub fn music_control_description(music_control: u8) -> String {
    match music_control {
        0 => "No Change",
        1 => "Samus appear",
        2 => "Aquire item",
        3 => "Elevator",
        4 => "Hall before statues",
        5 => "No change/Song One",
        6 => "Song Two",
        7 => "Mute",
        _ => return format!("{}", music_control),
    }
    .to_string()
}

pub fn music_track_description(music_track: u8) -> String {
    match music_track {
        0x00 => "None",
        0x03 => "Title Screen",
        0x06 => "Empty Crateria",
        0x09 => "Space Pirate",
        0x0c => "Samus Theme",
        0x0f => "Green Brinstar",
        0x12 => "Red Brinstar",
        0x15 => "Upper Norfair",
        0x18 => "Lower Norfair",
        0x1b => "Maridia",
        0x1e => "Tourian",
        0x21 => "Mother Brain",
        0x24 => "Boss Fight 1(04,05,06,80)",
        0x27 => "Boss Fight 2(04,05,06)",
        0x2a => "Miniboss Fight",
        0x2d => "Ceres",
        0x30 => "Wrecked Ship",
        0x33 => "Zebes Boom",
        0x36 => "Intro",
        0x39 => "Death",
        0x3c => "Credits",
        0x3f => "The last metroid is in captivity",
        0x42 => "The galaxy is at peace",
        0x45 => "Large Metroid",
        0x48 => "Samus Theme",
        _ => return format!("{}", music_track),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_header_parsing() {
        let data = [
            0x5a, 0x01, 0x02, 0x03, 0x04, 0x05, 0x70, 0xa0, 0x00, 0x66, 0x92,
        ];
        let header = RoomHeader::read(&data).unwrap();
        assert_eq!(header.index, 0x5a);
        assert_eq!(header.region, Region::Brinstar);
        assert_eq!(header.width, 4);
        assert_eq!(header.height, 5);
        assert_eq!(header.doors, 0x9266);

        // Region bytes above 7 are a parse error.
        let mut bad = data;
        bad[1] = 0x08;
        assert!(RoomHeader::read(&bad).is_err());
    }

    #[test]
    fn room_state_parsing() {
        let mut data = [0u8; 26];
        data[0] = 0x00;
        data[1] = 0x80;
        data[2] = 0xa2;
        data[3] = 0x1a;
        data[4] = 0x09;
        data[5] = 0x05;
        data[14] = 0x00;
        data[15] = 0x81;
        let state = RoomState::read(&data).unwrap();
        assert_eq!(state.data, 0xa28000);
        assert_eq!(state.tile_set, 0x1a);
        assert_eq!(state.music_track, 0x09);
        assert_eq!(state.music_control, 0x05);
        assert_eq!(state.scroll, 0x8100);
        assert_eq!(state.layer_handling, 0);
    }

    #[test]
    fn tile_layer_parsing() {
        let layer = TileLayer::new(0x9001).unwrap();
        assert_eq!(layer.index, 1);
        assert!(!layer.flip_h);
        assert!(!layer.flip_v);
        assert_eq!(layer.property, BlockType::DoorBlock);

        let layer = TileLayer::new(0x0402).unwrap();
        assert_eq!(layer.index, 2);
        assert!(layer.flip_h);
        assert_eq!(layer.property, BlockType::Air);

        let layer = TileLayer::new(0x0bff).unwrap();
        assert_eq!(layer.index, 0x3ff);
        assert!(layer.flip_v);
    }

    #[test]
    fn door_parsing() {
        let data = [
            0xf8, 0x91, 0xaa, 0x40, 0x05, 0x01, 0x02, 0x03, 0x04, 0x00, 0x80, 0x34, 0x12,
        ];
        let door = Door::read(&data).unwrap();
        // The destination pointer resolves through bank $8F; byte 2 of the
        // record does not land in any field.
        assert_eq!(door.room, 0x791f8);
        assert_eq!(door.door_bit_flag, 0x40);
        assert_eq!(door.direction, 0x05);
        assert_eq!(door.illusion_x, 1);
        assert_eq!(door.illusion_y, 2);
        assert_eq!(door.x, 3);
        assert_eq!(door.y, 4);
        assert_eq!(door.distance, 0x8000);
        assert_eq!(door.scroll_data, 0x1234);

        let empty = Door::read(&[0u8; 13]).unwrap();
        assert_eq!(empty.room, 0);
    }

    #[test]
    fn state_code_tables() {
        assert_eq!(StateCode::from_u16(0xe5e6), Some(StateCode::Standard));
        assert_eq!(StateCode::from_u16(0xe612), Some(StateCode::Events));
        assert_eq!(StateCode::from_u16(0x1234), None);

        assert_eq!(StateCode::Standard.entry_size(), 2);
        assert_eq!(StateCode::Doors.entry_size(), 6);
        assert_eq!(StateCode::Events.entry_size(), 5);
        assert_eq!(StateCode::Bosses.entry_size(), 5);
        assert_eq!(StateCode::SpeedBooster.entry_size(), 4);

        assert_eq!(StateCode::Standard.description(), "STANDARD");
        assert_eq!(StateCode::MorphAndMissiles.description(), "Morph & Missiles");
    }

    #[test]
    fn music_descriptions() {
        assert_eq!(music_control_description(3), "Elevator");
        assert_eq!(music_control_description(9), "9");
        assert_eq!(music_track_description(0x2d), "Ceres");
        assert_eq!(music_track_description(0x1b), "Maridia");
        assert_eq!(music_track_description(0x01), "1");
    }

    fn put(rom: &mut [u8], offset: usize, bytes: &[u8]) {
        rom[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn put_compressed(rom: &mut [u8], mut offset: usize, data: &[u8]) {
        for chunk in data.chunks(1024) {
            let size = chunk.len() - 1;
            rom[offset] = 0xe0 | (size >> 8) as u8;
            rom[offset + 1] = size as u8;
            offset += 2;
            put(rom, offset, chunk);
            offset += chunk.len();
        }
        rom[offset] = 0xff;
    }

    /// A one screen room at `ROOM_OFFSETS[0]` with an EVENTS state, a
    /// STANDARD fallback, one door, a scroll byte and a two tile tile set.
    fn build_test_rom() -> Vec<u8> {
        let mut rom = vec![0u8; 0x300000];
        let room = ROOM_OFFSETS[0];

        // Header: 1x1 screens, Crateria, door list pointer $8F:9266.
        put(
            &mut rom,
            room,
            &[0x00, 0x00, 0x02, 0x03, 0x01, 0x01, 0x70, 0xa0, 0x00, 0x66, 0x92],
        );
        // EVENTS entry (predicate 0x05, state block at $8F:A000), then
        // STANDARD with its state block inline.
        put(
            &mut rom,
            room + RoomHeader::SIZE,
            &[0x12, 0xe6, 0x05, 0x00, 0xa0, 0xe6, 0xe5],
        );
        let mut default_state = [0u8; 26];
        put(&mut default_state, 0, &[0x00, 0x80, 0xa2, 0x00, 0x09, 0x05]);
        put(&mut default_state, 14, &[0x00, 0x81]); // scroll data at $8F:8100
        put(&mut rom, room + RoomHeader::SIZE + 7, &default_state);

        let mut event_state = [0u8; 26];
        put(&mut event_state, 0, &[0x00, 0x80, 0xa2, 0x00, 0x1b, 0x00]);
        put(&mut rom, 0x7a000, &event_state);

        rom[0x78100] = 0x02; // scroll byte for the single screen

        // Layer blob at $A2:8000: layer 1 (512 bytes) + BTS (256 bytes).
        // Cell (0, 0) is a door block over tile 1; cell (1, 0) is tile 2,
        // x flipped.
        let mut layer = vec![0u8; 2 + 512 + 256];
        put(&mut layer, 0, &[0x00, 0x02]);
        put(&mut layer, 2, &[0x01, 0x90, 0x02, 0x04]);
        put_compressed(&mut rom, 0x110000, &layer);

        // Tile set 0 entry: tile table $BA:0000, graphics $BB:0000, palette
        // $BC:0000.
        put(
            &mut rom,
            rommap::TILESET_TABLE,
            &[0x00, 0x00, 0xba, 0x00, 0x00, 0xbb, 0x00, 0x00, 0xbc],
        );

        // Region graphics: subtile 0 blank, subtile 1 with pixel index 1 at
        // (0, 0).
        let mut gfx = vec![0u8; 64];
        gfx[32] = 0x80;
        put_compressed(&mut rom, 0x1d8000, &gfx);

        // CRE graphics: one subtile, every pixel index 2.  It lands at
        // subtile index 0x280 after the 0x5000 byte region buffer.
        let mut cre = vec![0u8; 32];
        for y in 0..8 {
            cre[y * 2 + 1] = 0xff;
        }
        put_compressed(&mut rom, rommap::CRE_TILES, &cre);

        // Palette: entry 1 red, entry 2 green, entry 0x11 blue.
        let mut palette = vec![0u8; 512];
        palette[2] = 0x1f;
        palette[4] = 0xe0;
        palette[5] = 0x03;
        palette[0x23] = 0x7c;
        put_compressed(&mut rom, 0x1e0000, &palette);

        // Shared CRE tile table: assembler 0, fully transparent.  Region
        // table: assembler 1 exercising flips, palette bits and a CRE
        // subtile.
        put_compressed(&mut rom, rommap::CRE_TILE_TABLE, &[0u8; 8]);
        put_compressed(
            &mut rom,
            0x1d0000,
            &[0x01, 0x00, 0x01, 0x40, 0x01, 0x04, 0x80, 0x02],
        );

        // Door pointer list and the record it points at.
        put(&mut rom, 0x79266, &[0x00, 0x88]);
        put(
            &mut rom,
            0x18800,
            &[0xf8, 0x91, 0xaa, 0x40, 0x05, 0x01, 0x02, 0x03, 0x04, 0x00, 0x80, 0x34, 0x12],
        );

        rom
    }

    #[test]
    fn rom_header_detection() {
        let rom = Rom::new(build_test_rom()).unwrap();
        assert_eq!(rom.header_length(), 0);

        let mut headered = vec![0u8; 512];
        headered.extend(build_test_rom());
        let rom = Rom::new(headered).unwrap();
        assert_eq!(rom.header_length(), 512);
    }

    #[test]
    fn pal_rom_is_rejected() {
        let mut buffer = build_test_rom();
        buffer[rommap::PAL_FLAG] = 0x02;
        assert!(Rom::new(buffer).is_err());
    }

    #[test]
    fn open_default_state() {
        let rom = Rom::new(build_test_rom()).unwrap();
        let room = Room::open(&rom, ROOM_OFFSETS[0], None).unwrap();

        assert_eq!(room.header.region, Region::Crateria);
        assert_eq!(room.header.width, 1);
        assert_eq!(room.header.height, 1);
        assert_eq!(
            room.state_codes,
            vec![StateCode::Events, StateCode::Standard]
        );
        assert_eq!(*room.state_codes.last().unwrap(), StateCode::Standard);

        // The default selection is the STANDARD state.
        assert_eq!(room.state.music_track, 0x09);
        assert_eq!(room.state.music_control, 0x05);
        assert_eq!(room.state.data, 0xa28000);

        assert_eq!(room.scroll.width(), 1);
        assert_eq!(room.scroll.height(), 1);
        assert_eq!(*room.scroll.at(0, 0), 0x02);

        assert_eq!(room.tiles.width(), 16);
        assert_eq!(room.tiles.height(), 16);
        let tile = room.tiles.at(0, 0);
        assert_eq!(tile.layer1.index, 1);
        assert_eq!(tile.layer1.property, BlockType::DoorBlock);
        assert_eq!(tile.bts, 0);
        assert!(tile.layer2.is_none());
        let tile = room.tiles.at(1, 0);
        assert_eq!(tile.layer1.index, 2);
        assert!(tile.layer1.flip_h);
        assert_eq!(tile.layer1.property, BlockType::Air);
    }

    #[test]
    fn open_alternate_state() {
        let rom = Rom::new(build_test_rom()).unwrap();
        let room = Room::open(&rom, ROOM_OFFSETS[0], Some(0)).unwrap();

        // The EVENTS entry resolves through its trailing pointer and
        // records the predicate byte.
        assert_eq!(room.state.music_track, 0x1b);
        assert_eq!(room.state_code_value, 0x05);
        // That state has no scroll data.
        assert_eq!(*room.scroll.at(0, 0), 0);

        // An index past the list falls back to STANDARD.
        let room = Room::open(&rom, ROOM_OFFSETS[0], Some(7)).unwrap();
        assert_eq!(room.state.music_track, 0x09);
    }

    #[test]
    fn open_builds_the_tile_set() {
        let rom = Rom::new(build_test_rom()).unwrap();
        let room = Room::open(&rom, ROOM_OFFSETS[0], None).unwrap();

        assert_eq!(room.tile_set.len(), 2);
        // Assembler 0 references only blank subtiles.
        assert_eq!(room.tile_set[0].at(0, 0).a, 0.0);

        let tile = &room.tile_set[1];
        // Upper left: pixel (0, 0) is palette entry 1.
        assert_eq!(tile.at(0, 0).r, 1.0);
        assert_eq!(tile.at(0, 0).a, 1.0);
        assert_eq!(tile.at(1, 0).a, 0.0);
        // Upper right: the same subtile x flipped.
        assert_eq!(tile.at(15, 0).r, 1.0);
        // Lower left: palette bit 10 selects the second palette row.
        assert_eq!(tile.at(0, 8).b, 1.0);
        // Lower right: a CRE subtile, uniformly palette entry 2.
        assert_eq!(tile.at(8, 8).g, 1.0);
        assert_eq!(tile.at(15, 15).g, 1.0);
    }

    #[test]
    fn open_resolves_doors() {
        let rom = Rom::new(build_test_rom()).unwrap();
        let room = Room::open(&rom, ROOM_OFFSETS[0], None).unwrap();

        assert_eq!(room.doors.len(), 1);
        let door = &room.doors[0];
        assert_eq!(door.room, 0x791f8);
        assert_eq!(door.door_bit_flag, 0x40);
        assert_eq!(door.direction, 0x05);
        assert_eq!(door.distance, 0x8000);
        assert_eq!(door.scroll_data, 0x1234);

        assert_eq!(room.read_door(0, 0).unwrap().direction, 0x05);
        assert!(room.read_door(1, 0).is_none());
        assert!(room.read_door(16, 0).is_none());
    }

    #[test]
    fn quads_and_tile_sheet() {
        let rom = Rom::new(build_test_rom()).unwrap();
        let room = Room::open(&rom, ROOM_OFFSETS[0], None).unwrap();

        // No layer 2, so one quad per cell.
        let vertices = room.quads(16);
        assert_eq!(vertices.len(), 16 * 16 * 4);

        // Cell (0, 0): tile 1, no flips.
        assert_eq!(
            vertices[0],
            Vertex {
                x: 0,
                y: 0,
                tx: 16,
                ty: 0
            }
        );
        assert_eq!(
            vertices[2],
            Vertex {
                x: 16,
                y: 16,
                tx: 31,
                ty: 15
            }
        );

        // Cell (1, 0) comes after the first column of cells; its x flip
        // swaps the texture extremes.
        let v = &vertices[16 * 4..];
        assert_eq!(
            v[0],
            Vertex {
                x: 16,
                y: 0,
                tx: 47,
                ty: 0
            }
        );
        assert_eq!(
            v[1],
            Vertex {
                x: 32,
                y: 0,
                tx: 32,
                ty: 0
            }
        );

        let sheet = room.draw_tile_set(16);
        assert_eq!(sheet.width(), 16 * TILE_SIZE);
        assert_eq!(sheet.height(), TILE_SIZE);
        assert_eq!(sheet.at(16, 0).r, 1.0);
    }
}
