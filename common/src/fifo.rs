//! Fixed-capacity FIFO with free-running positions.
//!
//! The read and write positions only ever grow (wrapping at `usize::MAX`);
//! the fill level is their difference and a position maps into storage by
//! masking with `capacity - 1`. That is why the capacity has to be a power
//! of two.

use crate::Error;

/// Power-of-two ring buffer of `N` copyable items.
pub struct RingBuffer<T, const N: usize> {
    storage: [T; N],
    read: usize,
    write: usize,
}

impl<T: Copy + Default, const N: usize> RingBuffer<T, N> {
    /// # Errors
    ///
    /// [`Error::CapacityNotPowerOfTwo`] unless `N` is a power of two.
    pub fn new() -> Result<Self, Error> {
        if !N.is_power_of_two() {
            return Err(Error::CapacityNotPowerOfTwo);
        }
        Ok(Self {
            storage: [T::default(); N],
            read: 0,
            write: 0,
        })
    }

    #[inline]
    pub const fn capacity(&self) -> usize { N }

    /// Items waiting to be read.
    #[inline]
    pub const fn len(&self) -> usize { self.write.wrapping_sub(self.read) }

    #[inline]
    pub const fn is_empty(&self) -> bool { self.len() == 0 }

    /// Room left for writing.
    #[inline]
    pub const fn available(&self) -> usize { N - self.len() }

    /// Drops everything buffered.
    pub fn reset(&mut self) {
        self.read = 0;
        self.write = 0;
    }

    /// Appends as many of `items` as fit; returns how many were taken.
    pub fn write(
        &mut self,
        items: &[T],
    ) -> usize {
        let count = items.len().min(self.available());
        let start = self.write & (N - 1);
        let first = count.min(N - start);
        self.storage[start..start + first].copy_from_slice(&items[..first]);
        self.storage[..count - first].copy_from_slice(&items[first..count]);
        self.write = self.write.wrapping_add(count);
        count
    }

    /// Moves up to `out.len()` items out; returns how many were read.
    pub fn read(
        &mut self,
        out: &mut [T],
    ) -> usize {
        let count = out.len().min(self.len());
        let start = self.read & (N - 1);
        let first = count.min(N - start);
        out[..first].copy_from_slice(&self.storage[start..start + first]);
        out[first..count].copy_from_slice(&self.storage[..count - first]);
        self.read = self.read.wrapping_add(count);
        count
    }

    /// Appends one item; `false` when full.
    pub fn push(
        &mut self,
        item: T,
    ) -> bool {
        self.write(&[item]) == 1
    }

    /// Takes the oldest item.
    pub fn pop(&mut self) -> Option<T> {
        let mut slot = [T::default()];
        (self.read(&mut slot) == 1).then_some(slot[0])
    }
}

impl<const N: usize> RingBuffer<u8, N> {
    /// Appends the bytes of `text`; returns how many fit.
    pub fn write_str(
        &mut self,
        text: &str,
    ) -> usize {
        self.write(text.as_bytes())
    }

    /// Reads up to `buf.len()` bytes and returns them as text, or `None` if
    /// they are not valid UTF-8. The bytes are consumed either way.
    pub fn read_str<'b>(
        &mut self,
        buf: &'b mut [u8],
    ) -> Option<&'b str> {
        let count = self.read(buf);
        core::str::from_utf8(&buf[..count]).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(matches!(RingBuffer::<u8, 12>::new(), Err(Error::CapacityNotPowerOfTwo)));
        assert!(RingBuffer::<u8, 16>::new().is_ok());
    }

    #[test]
    fn test_write_limited_to_free_space() {
        let mut fifo = RingBuffer::<u8, 4>::new().unwrap();
        assert_eq!(fifo.write(&[1, 2, 3, 4, 5, 6]), 4);
        assert_eq!(fifo.available(), 0);
        assert!(!fifo.push(7));

        let mut out = [0u8; 8];
        assert_eq!(fifo.read(&mut out), 4);
        assert_eq!(&out[..4], &[1, 2, 3, 4]);
        assert!(fifo.is_empty());
    }

    #[test]
    fn test_order_across_wrap() {
        let mut fifo = RingBuffer::<u16, 8>::new().unwrap();
        let mut out = [0u16; 8];
        fifo.write(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(fifo.read(&mut out[..5]), 5);
        // Write position is at 6; this write wraps to the start of storage.
        assert_eq!(fifo.write(&[7, 8, 9, 10, 11]), 5);
        assert_eq!(fifo.len(), 6);
        assert_eq!(fifo.read(&mut out), 6);
        assert_eq!(&out[..6], &[6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_positions_keep_running_past_wrap() {
        let mut fifo = RingBuffer::<u8, 2>::new().unwrap();
        fifo.read = usize::MAX;
        fifo.write = usize::MAX;
        assert!(fifo.push(1));
        assert!(fifo.push(2));
        assert_eq!(fifo.len(), 2);
        assert_eq!(fifo.pop(), Some(1));
        assert_eq!(fifo.pop(), Some(2));
        assert_eq!(fifo.pop(), None);
    }

    #[test]
    fn test_strings_and_reset() {
        let mut fifo = RingBuffer::<u8, 16>::new().unwrap();
        assert_eq!(fifo.write_str("hello"), 5);
        let mut buf = [0u8; 3];
        assert_eq!(fifo.read_str(&mut buf), Some("hel"));
        fifo.reset();
        assert!(fifo.is_empty());
        assert_eq!(fifo.read_str(&mut buf), Some(""));
    }
}
