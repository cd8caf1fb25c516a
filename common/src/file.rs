//! Read-only file collaborator for fonts and images.
//!
//! The firmware has no filesystem of its own; whoever owns storage (an SD
//! card driver, the desktop, a table of `include_bytes!` blobs) implements
//! [`FileSource`] and the text/image code reads through it.

use crate::Error;

/// Random-access reads from named files.
pub trait FileSource {
    /// Reads up to `buf.len()` bytes of `path` starting at `offset`.
    ///
    /// Returns how many bytes were read; fewer than requested means the file
    /// ended.
    ///
    /// # Errors
    ///
    /// [`Error::FileNotFound`] if `path` does not exist.
    fn read_at(
        &mut self,
        path: &str,
        offset: u32,
        buf: &mut [u8],
    ) -> Result<usize, Error>;

    /// Reads exactly `buf.len()` bytes or fails with [`Error::TruncatedImage`].
    fn read_exact_at(
        &mut self,
        path: &str,
        offset: u32,
        buf: &mut [u8],
    ) -> Result<(), Error> {
        let read = self.read_at(path, offset, buf)?;
        if read == buf.len() { Ok(()) } else { Err(Error::TruncatedImage) }
    }
}

impl<F: FileSource + ?Sized> FileSource for &mut F {
    fn read_at(
        &mut self,
        path: &str,
        offset: u32,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        (**self).read_at(path, offset, buf)
    }
}

/// Files compiled into the image as `(path, contents)` pairs.
#[derive(Clone, Copy)]
pub struct StaticFiles<'a> {
    files: &'a [(&'a str, &'a [u8])],
}

impl<'a> StaticFiles<'a> {
    pub const fn new(files: &'a [(&'a str, &'a [u8])]) -> Self { Self { files } }

    /// Contents of `path`, if present.
    pub fn get(
        &self,
        path: &str,
    ) -> Option<&'a [u8]> {
        self.files.iter().find(|(name, _)| *name == path).map(|(_, data)| *data)
    }
}

impl FileSource for StaticFiles<'_> {
    fn read_at(
        &mut self,
        path: &str,
        offset: u32,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        let data = self.get(path).ok_or(Error::FileNotFound)?;
        let start = (offset as usize).min(data.len());
        let count = buf.len().min(data.len() - start);
        buf[..count].copy_from_slice(&data[start..start + count]);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILES: &[(&str, &[u8])] = &[("0:/a.bin", &[1, 2, 3, 4, 5]), ("0:/empty", &[])];

    #[test]
    fn test_read_at_offset_and_eof() {
        let mut files = StaticFiles::new(FILES);
        let mut buf = [0u8; 4];
        assert_eq!(files.read_at("0:/a.bin", 3, &mut buf), Ok(2));
        assert_eq!(&buf[..2], &[4, 5]);
        assert_eq!(files.read_at("0:/a.bin", 9, &mut buf), Ok(0));
        assert_eq!(files.read_at("0:/empty", 0, &mut buf), Ok(0));
    }

    #[test]
    fn test_missing_file() {
        let mut files = StaticFiles::new(FILES);
        let mut buf = [0u8; 1];
        assert_eq!(files.read_at("0:/b.bin", 0, &mut buf), Err(Error::FileNotFound));
    }

    #[test]
    fn test_read_exact_short() {
        let mut files = StaticFiles::new(FILES);
        let mut buf = [0u8; 3];
        assert_eq!(files.read_exact_at("0:/a.bin", 0, &mut buf), Ok(()));
        assert_eq!(files.read_exact_at("0:/a.bin", 3, &mut buf), Err(Error::TruncatedImage));
    }
}
