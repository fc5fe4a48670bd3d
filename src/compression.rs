use byteorder::{LittleEndian, ReadBytesExt};
use failure::{format_err, Error};
use num::FromPrimitive;
use num_derive::FromPrimitive;
use std::io::Cursor;
use std::num::Wrapping;

#[derive(Debug, FromPrimitive, PartialEq)]
enum Op {
    DirectCopy = 0x0,
    ByteFill = 0x1,
    WordFill = 0x2,
    GradientFill = 0x3,
    AbsoluteCopy = 0x4,
    AbsoluteXorCopy = 0x5,
    RelativeCopy = 0x6,
    RelativeXorCopy = 0x7,
}

/// Copy `size` bytes out of the already-decoded output, starting at `from`,
/// xoring each with `mask`.
///
/// A negative `from` emits nothing at all; the stream has still consumed the
/// operand bytes.  Real level data contains such commands, so this is not an
/// error.  Self referencing windows (`from + i` reaching bytes pushed by this
/// same command) are the usual LZ trick and fall out of the byte-at-a-time
/// loop.
fn lz_copy(out: &mut Vec<u8>, from: isize, size: usize, mask: u8) -> Result<(), Error> {
    if from < 0 {
        return Ok(());
    }
    let from = from as usize;
    for i in 0..size {
        let b = *out
            .get(from + i)
            .ok_or_else(|| format_err!("window reference past end of output"))?;
        out.push(b ^ mask);
    }
    Ok(())
}

pub fn decompress(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut r = Cursor::new(data);
    let mut out = Vec::new();

    loop {
        let b = r.read_u8()?;

        if b == 0xff {
            break;
        }

        let (op, size) = if (b & 0xe0) == 0xe0 {
            // Long commands are encoded as
            // |7  6  5 |4  3  2 |1  0 | |7  6  5  4  3  2  1  0 |
            // +--------+--------+-----+ +-----------------------+
            // |1  1  1 |c2 c1 c0|s9 s8| |s7 s6 s5 s4 s3 s2 s1 s0|
            // +--------+--------+-----+ +-----------------------+
            //
            // where c[2..0] is the op and s[9..0] + 1 is the run length,
            // so a long command spans 1..=1024 output bytes.
            let op = Op::from_u8((b >> 2) & 0x7).ok_or_else(|| format_err!("unknown op"))?;
            (op, ((b as usize & 0x3) << 8 | r.read_u8()? as usize) + 1)
        } else {
            // Short commands are encoded as
            // |7  6  5 |4  3  2  1  0 |
            // +--------+--------------+
            // |c2 c1 c0|s4 s3 s2 s1 s0|
            // +--------+--------------+
            //
            // where c[2..0] is the op and s[4..0] + 1 is the run length.
            let op = Op::from_u8(b >> 5).ok_or_else(|| format_err!("unknown op"))?;
            (op, (b as usize & 0x1f) + 1)
        };

        match op {
            Op::DirectCopy => {
                // Copy <size> bytes from the stream verbatim.
                for _ in 0..size {
                    out.push(r.read_u8()?);
                }
            }
            Op::ByteFill => {
                // Emit the next stream byte <size> times.
                let b = r.read_u8()?;
                for _ in 0..size {
                    out.push(b);
                }
            }
            Op::WordFill => {
                // Emit the next stream word over <size> output bytes.  An odd
                // <size> ends on the low byte.
                let b = [r.read_u8()?, r.read_u8()?];
                for i in 0..size {
                    out.push(b[i & 0x1]);
                }
            }
            Op::GradientFill => {
                // Emit the next stream byte, incrementing it (mod 256) on
                // every output byte.
                let b = Wrapping(r.read_u8()?);
                for i in 0..size {
                    out.push((b + Wrapping(i as u8)).0);
                }
            }
            Op::AbsoluteCopy => {
                // Window copy from an absolute output offset in the next
                // stream word.
                let from = r.read_u16::<LittleEndian>()? as isize;
                lz_copy(&mut out, from, size, 0)?;
            }
            Op::AbsoluteXorCopy => {
                let from = r.read_u16::<LittleEndian>()? as isize;
                lz_copy(&mut out, from, size, 0xff)?;
            }
            Op::RelativeCopy => {
                // Window copy; the next stream byte is a distance back from
                // the end of the output.
                let delta = r.read_u8()? as isize;
                let from = out.len() as isize - delta;
                lz_copy(&mut out, from, size, 0)?;
            }
            Op::RelativeXorCopy => {
                let delta = r.read_u8()? as isize;
                let from = out.len() as isize - delta;
                lz_copy(&mut out, from, size, 0xff)?;
            }
        }
    }

    Ok(out)
}
