//! Reusable device buffers filled from a CPU-side byte arena once per frame.

use std::ops::Range;

const MIN_CAPACITY: u64 = 256;

/// Rounds `value` up to a multiple of `alignment` (a power of two).
#[inline]
pub(crate) fn align_up(value: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Capacity to allocate for `required` bytes when `current` is too small.
pub(crate) fn grown_capacity(current: u64, required: u64) -> u64 {
    if required <= current {
        return current;
    }
    required.max(MIN_CAPACITY).next_power_of_two()
}

/// CPU staging bytes plus the device buffer they are copied into.
///
/// The device buffer is created lazily and only ever grows, up to `limit`
/// (the device's `max_buffer_size`).
pub(crate) struct Arena {
    label: &'static str,
    usage: wgpu::BufferUsages,
    alignment: u64,
    limit: u64,
    bytes: Vec<u8>,
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
}

impl Arena {
    pub fn new(label: &'static str, usage: wgpu::BufferUsages, alignment: u64) -> Self {
        Self {
            label,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            alignment: alignment.max(wgpu::COPY_BUFFER_ALIGNMENT),
            limit: u64::MAX,
            bytes: Vec::new(),
            buffer: None,
            capacity: 0,
        }
    }

    pub fn set_limit(&mut self, limit: u64) {
        self.limit = limit;
    }

    /// Bytes one entry of `len` bytes occupies once aligned.
    #[inline]
    pub fn stride(&self, len: u64) -> u64 {
        align_up(len, self.alignment)
    }

    /// Whether `data_len` more bytes still fit under the buffer size limit.
    pub fn fits(&self, data_len: u64) -> bool {
        let end = align_up(self.len(), self.alignment) + data_len;
        align_up(end, wgpu::COPY_BUFFER_ALIGNMENT) <= self.limit
    }

    /// Appends `data` at the next aligned offset and returns its byte range.
    pub fn push(&mut self, data: &[u8]) -> Range<u64> {
        let start = align_up(self.bytes.len() as u64, self.alignment);
        self.bytes.resize(start as usize, 0);
        self.bytes.extend_from_slice(data);
        start..self.bytes.len() as u64
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Grows the device buffer if needed and copies the staged bytes into it.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let size = align_up(self.len().max(1), wgpu::COPY_BUFFER_ALIGNMENT);
        self.reserve(device, size);

        if self.bytes.is_empty() {
            return;
        }
        self.bytes.resize(size as usize, 0);
        if let Some(buffer) = self.buffer.as_ref() {
            queue.write_buffer(buffer, 0, &self.bytes);
        }
    }

    /// Ensures a device buffer of at least `size` bytes exists.
    ///
    /// Sizes over the limit are refused and the current buffer is kept.
    pub fn reserve(&mut self, device: &wgpu::Device, size: u64) {
        if self.buffer.is_some() && size <= self.capacity {
            return;
        }
        if size > self.limit {
            log::error!(
                "{}: {size} bytes exceeds the device buffer limit of {}",
                self.label,
                self.limit
            );
            return;
        }
        let capacity = grown_capacity(self.capacity, size.max(1)).min(self.limit);
        log::debug!("{}: growing to {capacity} bytes", self.label);
        self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(self.label),
            size: capacity,
            usage: self.usage,
            mapped_at_creation: false,
        }));
        self.capacity = capacity;
    }

    #[inline]
    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_multiple() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(1, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 4), 260);
    }

    #[test]
    fn capacity_grows_in_powers_of_two() {
        assert_eq!(grown_capacity(0, 1), 256);
        assert_eq!(grown_capacity(256, 300), 512);
        assert_eq!(grown_capacity(1024, 600), 1024);
        assert_eq!(grown_capacity(1024, 5000), 8192);
    }

    #[test]
    fn push_aligns_each_entry() {
        let mut arena = Arena::new("test", wgpu::BufferUsages::UNIFORM, 256);
        assert_eq!(arena.push(&[1; 64]), 0..64);
        assert_eq!(arena.push(&[2; 64]), 256..320);
        assert_eq!(arena.len(), 320);
        arena.reset();
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn fits_respects_limit_and_alignment() {
        let mut arena = Arena::new("test", wgpu::BufferUsages::UNIFORM, 256);
        arena.set_limit(512);
        assert!(arena.fits(512));
        assert!(!arena.fits(513));
        arena.push(&[0; 64]);
        assert!(arena.fits(256));
        assert!(!arena.fits(257));
    }

    #[test]
    fn stride_rounds_to_entry_alignment() {
        let arena = Arena::new("test", wgpu::BufferUsages::UNIFORM, 256);
        assert_eq!(arena.stride(64), 256);
        assert_eq!(arena.stride(300), 512);
    }

    #[test]
    fn unlimited_arena_always_fits() {
        let arena = Arena::new("test", wgpu::BufferUsages::VERTEX, 1);
        assert!(arena.fits(1 << 40));
    }

    #[test]
    fn vertex_entries_pack_at_copy_alignment() {
        let mut arena = Arena::new("test", wgpu::BufferUsages::VERTEX, 1);
        assert_eq!(arena.push(&[0; 28]), 0..28);
        assert_eq!(arena.push(&[0; 36]), 28..64);
    }
}
