//! Renderer
//!
//! Fills the mapped shared-memory buffer from a pixel source. The source
//! stores straight R,G,B,A records; the buffer is ARGB8888, which in
//! little-endian memory is B,G,R,A, so red and blue trade places on the way
//! in. Every render writes the whole buffer.

pub mod source;

use std::io::BufRead;

use log::debug;

pub use source::{FilePixelSource, PixelReader, PixelRecord, RECORD_DELIMITER};

use crate::config::BYTES_PER_PIXEL;
use crate::error::{LogoError, LogoResult};

/// Write `width * height` records from `reader` into `dst` in row-major order
pub fn render<R: BufRead>(
    dst: &mut [u8],
    reader: &mut PixelReader<R>,
    width: u32,
    height: u32,
) -> LogoResult<()> {
    let expected = width as usize * height as usize;
    let needed = expected * BYTES_PER_PIXEL as usize;
    if dst.len() < needed {
        return Err(LogoError::ResourceAllocation(format!(
            "destination holds {} bytes, {}x{} needs {}",
            dst.len(),
            width,
            height,
            needed
        )));
    }

    for (k, px) in dst[..needed]
        .chunks_exact_mut(BYTES_PER_PIXEL as usize)
        .enumerate()
    {
        match reader.next_record()? {
            Some(record) => px.copy_from_slice(&record.to_bgra()),
            None => {
                return Err(LogoError::DataTruncated { expected, found: k });
            }
        }
    }

    debug!("Rendered {}x{} pixels", width, height);
    Ok(())
}

/// Open `source` afresh and render it into `dst`
pub fn render_from(
    dst: &mut [u8],
    source: &FilePixelSource,
    width: u32,
    height: u32,
) -> LogoResult<()> {
    let mut reader = source.open()?;
    render(dst, &mut reader, width, height).map_err(|e| match e {
        // The reader does not know where its bytes come from
        LogoError::Io { source: err, .. } => LogoError::io(source.path(), err),
        other => other,
    })
}
