//! Listpack: a bounded, contiguous byte buffer of [`entry`] elements.
//!
//! Layout:
//!
//! ```text
//! offset 0..3  u32 BE   total bytes used (including the 0xFF terminator)
//! offset 4..5  u16 BE   element count
//! offset 6..   entries  variable-length, back-to-back
//! last byte    0xFF     terminator
//! ```
//!
//! A listpack never grows past the `max` byte capacity it was created
//! with; exceeding that capacity on push returns
//! [`StorageError::Overflow`] and leaves the buffer byte-for-byte
//! unchanged. It is the quicklist's job (see [`crate::list::quicklist`])
//! to react to that by opening a new node.

use parking_lot::RwLock;

use crate::error::{Result, StorageError};
use crate::list::entry;

const HEADER_LEN: usize = 6;
const TERMINATOR: u8 = 0xFF;

/// Fullness ratio, in percent, above which [`Listpack::is_full`] reports
/// `true`. Purely advisory — see spec §9 Open Question 1.
const FULLNESS_ADVISORY_PCT: usize = 95;

pub struct Listpack {
    buf: RwLock<Vec<u8>>,
    max: usize,
}

fn read_total(buf: &[u8]) -> usize {
    u32::from_be_bytes(buf[0..4].try_into().unwrap()) as usize
}

fn write_total(buf: &mut [u8], total: usize) {
    buf[0..4].copy_from_slice(&(total as u32).to_be_bytes());
}

fn read_count(buf: &[u8]) -> usize {
    u16::from_be_bytes(buf[4..6].try_into().unwrap()) as usize
}

fn write_count(buf: &mut [u8], count: usize) {
    buf[4..6].copy_from_slice(&(count as u16).to_be_bytes());
}

impl Listpack {
    /// Allocates an empty listpack with `max` bytes of backing storage.
    pub fn new_empty(max: usize) -> Self {
        let mut buf = vec![0u8; max];
        write_total(&mut buf, HEADER_LEN + 1);
        write_count(&mut buf, 0);
        buf[HEADER_LEN] = TERMINATOR;
        Listpack {
            buf: RwLock::new(buf),
            max,
        }
    }

    /// Allocates a listpack and pushes `elements` onto its tail in order.
    /// Aborts (returning the first error) if any element does not fit.
    pub fn new_with<'a, I>(max: usize, elements: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let lp = Listpack::new_empty(max);
        for element in elements {
            lp.push_tail(element)?;
        }
        Ok(lp)
    }

    pub fn max_size(&self) -> usize {
        self.max
    }

    pub fn length(&self) -> usize {
        read_count(&self.buf.read())
    }

    pub fn is_empty(&self) -> bool {
        read_total(&self.buf.read()) == HEADER_LEN + 1
    }

    /// Advisory only: a push may still succeed after this reports `true`,
    /// or fail with `Overflow` before it does. See spec §9 Open Question 1.
    pub fn is_full(&self) -> bool {
        let buf = self.buf.read();
        (read_total(&buf) * 100) / self.max >= FULLNESS_ADVISORY_PCT
    }

    fn free_bytes(buf: &[u8], max: usize) -> usize {
        max - read_total(buf)
    }

    /// Appends `value`. Returns the new element count, or `Overflow` if it
    /// would not fit (buffer left unchanged on failure).
    pub fn push_tail(&self, value: &[u8]) -> Result<usize> {
        let size = entry::encoded_size(value);
        let mut buf = self.buf.write();
        if size > Self::free_bytes(&buf, self.max) {
            return Err(StorageError::Overflow);
        }
        let total = read_total(&buf);
        let count = read_count(&buf);
        let cursor = entry::encode(&mut buf, total - 1, value)?;
        buf[cursor] = TERMINATOR;
        write_total(&mut buf, cursor + 1);
        write_count(&mut buf, count + 1);
        Ok(count + 1)
    }

    /// Prepends `value`, shifting existing entries right. Returns the new
    /// element count, or `Overflow` if it would not fit.
    pub fn push_head(&self, value: &[u8]) -> Result<usize> {
        let size = entry::encoded_size(value);
        let mut buf = self.buf.write();
        if size > Self::free_bytes(&buf, self.max) {
            return Err(StorageError::Overflow);
        }
        let total = read_total(&buf);
        let count = read_count(&buf);
        let entries_len = total - HEADER_LEN - 1; // excludes terminator
        buf.copy_within(HEADER_LEN..HEADER_LEN + entries_len, HEADER_LEN + size);
        let cursor = entry::encode(&mut buf, HEADER_LEN, value)?;
        debug_assert_eq!(cursor, HEADER_LEN + size);
        let new_total = total + size;
        buf[new_total - 1] = TERMINATOR;
        write_total(&mut buf, new_total);
        write_count(&mut buf, count + 1);
        Ok(count + 1)
    }

    /// Removes up to `count` elements from the tail. Returns them newest
    /// first (`result[0]` is the last element that was stored).
    pub fn pop_tail(&self, count: usize) -> Vec<Vec<u8>> {
        let mut buf = self.buf.write();
        let length = read_count(&buf);
        let count = count.min(length);
        if count == 0 {
            return Vec::new();
        }
        let total = read_total(&buf);
        let mut elements = Vec::with_capacity(count);
        let mut cut_point = total - 1;
        let (_, err) = entry::traverse_reverse(&buf, total as isize - 2, |value, entry_start| {
            elements.push(value.to_bytes());
            cut_point = entry_start;
            Ok(elements.len() < count)
        });
        debug_assert!(err.is_none(), "corrupted listpack during pop_tail");
        buf[cut_point] = TERMINATOR;
        write_total(&mut buf, cut_point + 1);
        write_count(&mut buf, length - count);
        elements
    }

    /// Removes up to `count` elements from the head. Returns them oldest
    /// first (`result[0]` is the first element that was stored).
    pub fn pop_head(&self, count: usize) -> Vec<Vec<u8>> {
        let mut buf = self.buf.write();
        let length = read_count(&buf);
        let count = count.min(length);
        if count == 0 {
            return Vec::new();
        }
        let total = read_total(&buf);
        let mut elements = Vec::with_capacity(count);
        let mut cut = HEADER_LEN;
        let (_, err) = entry::traverse_forward(&buf, HEADER_LEN, |value, entry_start| {
            let bytes = value.to_bytes();
            cut = entry_start + entry::encoded_size(&bytes);
            elements.push(bytes);
            Ok(elements.len() < count)
        });
        debug_assert!(err.is_none(), "corrupted listpack during pop_head");
        // `cut` is the offset right after the last popped entry, i.e. the
        // start of the first surviving entry (or the old terminator if none
        // survive).
        let remaining_len = (total - 1) - cut;
        buf.copy_within(cut..total - 1, HEADER_LEN);
        let new_total = HEADER_LEN + remaining_len + 1;
        buf[new_total - 1] = TERMINATOR;
        write_total(&mut buf, new_total);
        write_count(&mut buf, length - count);
        elements
    }

    /// Returns the element at logical index `i` (negative indices count
    /// from the tail; `-1` is the last element), or `None` if out of range.
    pub fn at_index(&self, i: isize) -> Option<Vec<u8>> {
        let buf = self.buf.read();
        let length = read_count(&buf) as isize;
        if length == 0 {
            return None;
        }
        if i >= 0 {
            if i >= length {
                return None;
            }
            let mut found = None;
            let mut idx = 0isize;
            entry::traverse_forward(&buf, HEADER_LEN, |value, _start| {
                if idx == i {
                    found = Some(value.to_bytes());
                    Ok(false)
                } else {
                    idx += 1;
                    Ok(true)
                }
            });
            found
        } else {
            let j = -i - 1;
            if j >= length {
                return None;
            }
            let total = read_total(&buf);
            let mut found = None;
            let mut idx = 0isize;
            entry::traverse_reverse(&buf, total as isize - 2, |value, _start| {
                if idx == j {
                    found = Some(value.to_bytes());
                    Ok(false)
                } else {
                    idx += 1;
                    Ok(true)
                }
            });
            found
        }
    }
}
