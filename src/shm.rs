//! Shared buffer allocator
//!
//! The pixel storage is an anonymous memfd mapped read/write into the client
//! and passed by descriptor to the server, which maps the same pages. Pixel
//! data never travels over the socket.
//!
//! There is one pool per region and one buffer per pool, so every buffer
//! starts at offset 0 with a stride of `4 * width`.

use std::fs::File;
use std::os::fd::{AsFd, BorrowedFd, FromRawFd, OwnedFd};

use log::debug;
use memmap2::{MmapMut, MmapOptions};
use wayland_client::protocol::wl_shm;

use crate::config::{WindowConfig, BYTES_PER_PIXEL};
use crate::error::{LogoError, LogoResult};

const MEMFD_NAME: &[u8] = b"waylogo-buffer\0";

/// Pixel format shared by client and server
pub const BUFFER_FORMAT: wl_shm::Format = wl_shm::Format::Argb8888;

/// Client-owned shared memory backing the pool
///
/// Field order matters: the mapping drops (unmaps) before the descriptor
/// closes.
#[derive(Debug)]
pub struct ShmRegion {
    map: MmapMut,
    file: File,
    len: usize,
}

impl ShmRegion {
    /// Create a memfd of exactly `len` bytes and map all of it
    pub fn allocate(len: usize) -> LogoResult<Self> {
        if len == 0 || len > i32::MAX as usize {
            return Err(LogoError::ResourceAllocation(format!(
                "invalid pool size {} bytes",
                len
            )));
        }

        let fd = unsafe { libc::memfd_create(MEMFD_NAME.as_ptr().cast(), libc::MFD_CLOEXEC) };
        if fd < 0 {
            return Err(LogoError::ResourceAllocation(format!(
                "memfd_create failed: {}",
                std::io::Error::last_os_error()
            )));
        }
        // SAFETY: fd was just returned by memfd_create and is owned by nobody else
        let file = File::from(unsafe { OwnedFd::from_raw_fd(fd) });

        file.set_len(len as u64).map_err(|e| {
            LogoError::ResourceAllocation(format!("could not size descriptor to {} bytes: {}", len, e))
        })?;

        // SAFETY: the memfd is private to this process and the server, and the
        // server only reads it
        let map = unsafe { MmapOptions::new().len(len).map_mut(&file) }
            .map_err(|e| LogoError::ResourceAllocation(format!("mmap failed: {}", e)))?;

        debug!("Allocated shared memory region of {} bytes", len);
        Ok(Self { map, file, len })
    }

    /// Region sized for one window-sized ARGB8888 buffer
    pub fn for_window(window: &WindowConfig) -> LogoResult<Self> {
        Self::allocate(window.buffer_len())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Descriptor to hand to `wl_shm.create_pool`
    pub fn fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.map[..]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.map[..]
    }
}

/// Geometry of a buffer carved from a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLayout {
    pub offset: i32,
    pub width: i32,
    pub height: i32,
    pub stride: i32,
    pub format: wl_shm::Format,
}

impl BufferLayout {
    /// The single full-window buffer at the start of the pool
    pub fn for_window(window: &WindowConfig) -> LogoResult<Self> {
        let to_i32 = |v: u32, what: &str| {
            i32::try_from(v)
                .map_err(|_| LogoError::ResourceAllocation(format!("{} {} does not fit i32", what, v)))
        };

        Ok(Self {
            offset: 0,
            width: to_i32(window.width, "width")?,
            height: to_i32(window.height, "height")?,
            stride: to_i32(window.width.saturating_mul(BYTES_PER_PIXEL), "stride")?,
            format: BUFFER_FORMAT,
        })
    }

    /// Bytes of pool covered by this buffer
    pub fn byte_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_maps_requested_length() {
        let mut region = ShmRegion::allocate(4 * 8 * 8).unwrap();
        assert_eq!(region.len(), 256);
        assert_eq!(region.as_slice().len(), 256);

        // Fresh memfd pages are zeroed
        assert!(region.as_slice().iter().all(|&b| b == 0));

        region.as_mut_slice()[255] = 7;
        assert_eq!(region.as_slice()[255], 7);
    }

    #[test]
    fn test_descriptor_has_region_length() {
        let region = ShmRegion::allocate(4096).unwrap();
        let file = File::from(region.fd().try_clone_to_owned().unwrap());
        assert_eq!(file.metadata().unwrap().len(), 4096);
    }

    #[test]
    fn test_zero_length_is_rejected() {
        assert!(matches!(
            ShmRegion::allocate(0),
            Err(LogoError::ResourceAllocation(_))
        ));
    }

    #[test]
    fn test_window_layout() {
        let window = WindowConfig::default();
        let layout = BufferLayout::for_window(&window).unwrap();

        assert_eq!(layout.offset, 0);
        assert_eq!(layout.width, 288);
        assert_eq!(layout.height, 288);
        assert_eq!(layout.stride, 4 * 288);
        assert_eq!(layout.format, wl_shm::Format::Argb8888);
        assert_eq!(layout.byte_len(), window.buffer_len());
    }

    #[test]
    fn test_region_for_window_matches_layout() {
        let window = WindowConfig {
            width: 16,
            height: 9,
            title: String::new(),
        };
        let region = ShmRegion::for_window(&window).unwrap();
        let layout = BufferLayout::for_window(&window).unwrap();
        assert_eq!(region.len(), layout.byte_len());
    }
}
