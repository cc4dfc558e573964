//! A library for reading and writing captured GPU frames from a maps renderer.
//!
//! A [Capture](crate::capture::Capture) stores the draw calls recorded for a single frame
//! together with the GPU state needed to extract geometry and textures from them.
//! Only the top level [Capture](crate::capture::Capture) type supports reading and writing from files.
//!
//! ```rust no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let capture = mmi_capture::capture::Capture::from_file("frame.mmrd")?;
//! println!("{} draw calls", capture.draws.len());
//! # Ok(())
//! # }
//! ```
//!
//! Replaying a frame means looking up the recorded state for a draw call's event.
//! [ReplaySession](crate::replay::ReplaySession) owns a parsed capture and exposes
//! the controller interface used by the extraction tools.
use std::io::{Read, Seek, Write};

use binrw::{BinRead, BinResult, BinWrite};

pub mod capture;
pub mod error;
pub mod replay;

fn parse_string<R: Read + Seek>(
    reader: &mut R,
    endian: binrw::Endian,
    _args: (),
) -> BinResult<String> {
    let pos = reader.stream_position()?;
    let len = u32::read_options(reader, endian, ())?;
    let mut bytes = vec![0u8; len as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| binrw::Error::Custom {
        pos,
        err: Box::new(e),
    })
}

fn write_string<W: Write + Seek>(
    value: &String,
    writer: &mut W,
    endian: binrw::Endian,
    _args: (),
) -> BinResult<()> {
    (value.len() as u32).write_options(writer, endian, ())?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

fn parse_count32<T, R>(reader: &mut R, endian: binrw::Endian, _args: ()) -> BinResult<Vec<T>>
where
    for<'a> T: BinRead<Args<'a> = ()> + 'static,
    R: Read + Seek,
{
    let count = u32::read_options(reader, endian, ())?;
    let mut values = Vec::new();
    for _ in 0..count {
        values.push(T::read_options(reader, endian, ())?);
    }
    Ok(values)
}

fn write_count32<T, W>(
    values: &Vec<T>,
    writer: &mut W,
    endian: binrw::Endian,
    _args: (),
) -> BinResult<()>
where
    for<'a> T: BinWrite<Args<'a> = ()> + 'static,
    W: Write + Seek,
{
    (values.len() as u32).write_options(writer, endian, ())?;
    for value in values {
        value.write_options(writer, endian, ())?;
    }
    Ok(())
}

fn parse_opt8<T, R>(reader: &mut R, endian: binrw::Endian, _args: ()) -> BinResult<Option<T>>
where
    for<'a> T: BinRead<Args<'a> = ()> + 'static,
    R: Read + Seek,
{
    let present = u8::read_options(reader, endian, ())?;
    if present != 0 {
        Ok(Some(T::read_options(reader, endian, ())?))
    } else {
        Ok(None)
    }
}

fn write_opt8<T, W>(
    value: &Option<T>,
    writer: &mut W,
    endian: binrw::Endian,
    _args: (),
) -> BinResult<()>
where
    for<'a> T: BinWrite<Args<'a> = ()> + 'static,
    W: Write + Seek,
{
    match value {
        Some(value) => {
            1u8.write_options(writer, endian, ())?;
            value.write_options(writer, endian, ())
        }
        None => 0u8.write_options(writer, endian, ()),
    }
}
