//! Crate-wide error type.

use core::fmt;

/// Everything that can go wrong outside the silent-skip drawing paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A chart grid pitch is zero.
    ZeroGridPitch,
    /// A chart has zero width or height.
    EmptyChart,
    /// A ring buffer capacity is not a power of two.
    CapacityNotPowerOfTwo,
    /// A framebuffer region does not fit its backing memory.
    BufferTooSmall,
    /// A bulk transfer chunk did not complete in time.
    TransferTimeout {
        /// Index of the chunk that stalled.
        chunk: usize,
    },
    /// The panel answered with an unexpected controller ID.
    PanelIdMismatch {
        /// ID of the configured controller.
        expected: u16,
        /// ID read back from the panel.
        found: u16,
    },
    /// Image data does not start with the `BM` magic.
    InvalidBitmap,
    /// Bitmap bit depth other than 16 or 24.
    UnsupportedBitDepth(u16),
    /// Image data ended before the last row.
    TruncatedImage,
    /// The file collaborator has no such file.
    FileNotFound,
    /// The glyph record is missing or short.
    GlyphNotFound,
}

impl fmt::Display for Error {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::ZeroGridPitch => write!(f, "grid pitch must be non-zero"),
            Self::EmptyChart => write!(f, "chart width and height must be non-zero"),
            Self::CapacityNotPowerOfTwo => write!(f, "capacity must be a power of two"),
            Self::BufferTooSmall => write!(f, "framebuffer region exceeds backing memory"),
            Self::TransferTimeout { chunk } => write!(f, "transfer timeout on chunk {chunk}"),
            Self::PanelIdMismatch { expected, found } => {
                write!(f, "panel id {found:#06x}, expected {expected:#06x}")
            }
            Self::InvalidBitmap => write!(f, "not a BMP image"),
            Self::UnsupportedBitDepth(bpp) => write!(f, "unsupported bit depth {bpp}"),
            Self::TruncatedImage => write!(f, "image data truncated"),
            Self::FileNotFound => write!(f, "file not found"),
            Self::GlyphNotFound => write!(f, "glyph not found"),
        }
    }
}

impl core::error::Error for Error {}
