//! GPU buffer objects and the byte windows bound to buffer blocks.

use crate::device::BufferId;

/// A GPU buffer object as seen by the binding layer.
///
/// The buffer itself is created, filled and destroyed elsewhere; this type
/// tracks the driver name and the allocated size, which is all binding needs
/// to validate a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    id: BufferId,
    size: Option<u64>,
    label: Option<String>,
}

impl Buffer {
    /// Wrap a created but not yet allocated buffer object.
    pub fn new(id: BufferId) -> Self {
        Self {
            id,
            size: None,
            label: None,
        }
    }

    /// Wrap a buffer object whose storage is already allocated.
    pub fn allocated(id: BufferId, size: u64) -> Self {
        Self {
            size: Some(size),
            ..Self::new(id)
        }
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Record that storage of `size` bytes was allocated.
    pub fn allocate(&mut self, size: u64) {
        self.size = Some(size);
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Allocated size in bytes, `None` before allocation.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_allocated(&self) -> bool {
        !self.id.is_none() && self.size.is_some()
    }

    /// Allocated size, for operations that require allocated storage.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is not created or not allocated.
    pub fn check_allocated(&self) -> u64 {
        assert!(!self.id.is_none(), "Buffer is not created");
        match self.size {
            Some(size) => size,
            None => panic!("Buffer {} is not allocated", self.id),
        }
    }

    /// A view over the whole buffer.
    pub fn view(&self) -> BufferView<'_> {
        BufferView {
            buffer: self,
            offset: 0,
            size: None,
            end: None,
        }
    }

    /// A view of `size` bytes starting at `offset`.
    pub fn create_view(&self, offset: u64, size: u64) -> BufferView<'_> {
        BufferView {
            buffer: self,
            offset,
            size: Some(size),
            end: None,
        }
    }

    /// A view from `offset` to the end of the buffer.
    pub fn create_view_from(&self, offset: u64) -> BufferView<'_> {
        BufferView {
            buffer: self,
            offset,
            size: None,
            end: None,
        }
    }
}

/// A `(buffer, offset, size)` window.
///
/// A size of `None` means "from `offset` to the end of the buffer", resolved
/// against the buffer's size at bind time. A view narrowed from a bounded
/// view keeps that view's end as its limit. The view borrows the buffer, so
/// the buffer outlives every use of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferView<'a> {
    buffer: &'a Buffer,
    offset: u64,
    size: Option<u64>,
    end: Option<u64>,
}

/// Why a view could not be resolved to a bindable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    NotCreated,
    NotAllocated,
    OffsetOutOfRange { offset: u64, buffer_size: u64 },
    RangeOutOfBounds { offset: u64, size: u64, buffer_size: u64 },
    EmptyRange { offset: u64 },
    ExceedsView { offset: u64, end: u64, view_end: u64 },
}

impl<'a> BufferView<'a> {
    pub fn buffer(&self) -> &'a Buffer {
        self.buffer
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Explicit size, `None` for a view that runs to the end.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Absolute end this view may not exceed, if any.
    fn limit(&self) -> Option<u64> {
        let own = self.size.map(|size| self.offset.saturating_add(size));
        match (own, self.end) {
            (Some(own), Some(end)) => Some(own.min(end)),
            (own, end) => own.or(end),
        }
    }

    /// Narrow this view. `offset` is relative to this view's start.
    ///
    /// A window reaching past this view's end fails to resolve.
    pub fn create_view(&self, offset: u64, size: u64) -> BufferView<'a> {
        BufferView {
            buffer: self.buffer,
            offset: self.offset.saturating_add(offset),
            size: Some(size),
            end: self.limit(),
        }
    }

    /// Narrow this view from `offset` on, keeping this view's end.
    pub fn create_view_from(&self, offset: u64) -> BufferView<'a> {
        BufferView {
            buffer: self.buffer,
            offset: self.offset.saturating_add(offset),
            size: None,
            end: self.limit(),
        }
    }

    /// Resolve to the `(offset, size)` actually bound.
    ///
    /// The buffer must be created and allocated, the offset must lie inside
    /// the buffer and the resolved range must be non-empty and end within
    /// both the buffer and any enclosing view.
    pub fn resolve(&self) -> Result<(u64, u64), RangeError> {
        if self.buffer.id.is_none() {
            return Err(RangeError::NotCreated);
        }
        let buffer_size = self.buffer.size.ok_or(RangeError::NotAllocated)?;
        if self.offset >= buffer_size {
            return Err(RangeError::OffsetOutOfRange {
                offset: self.offset,
                buffer_size,
            });
        }
        let size = match (self.size, self.end) {
            (Some(size), _) => size,
            (None, Some(view_end)) if self.offset >= view_end => {
                return Err(RangeError::ExceedsView {
                    offset: self.offset,
                    end: self.offset,
                    view_end,
                });
            }
            (None, end) => end.unwrap_or(buffer_size).min(buffer_size) - self.offset,
        };
        if size == 0 {
            return Err(RangeError::EmptyRange { offset: self.offset });
        }
        let end = match self.offset.checked_add(size) {
            Some(end) if end <= buffer_size => end,
            _ => {
                return Err(RangeError::RangeOutOfBounds {
                    offset: self.offset,
                    size,
                    buffer_size,
                })
            }
        };
        match self.end {
            Some(view_end) if end > view_end => Err(RangeError::ExceedsView {
                offset: self.offset,
                end,
                view_end,
            }),
            _ => Ok((self.offset, size)),
        }
    }
}

impl<'a> From<&'a Buffer> for BufferView<'a> {
    fn from(buffer: &'a Buffer) -> Self {
        buffer.view()
    }
}

impl std::fmt::Display for BufferView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.size {
            Some(size) => write!(f, "{}[{}..+{}]", self.buffer.id, self.offset, size),
            None => write!(f, "{}[{}..]", self.buffer.id, self.offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_end_resolution() {
        let buffer = Buffer::allocated(BufferId(1), 64);
        assert_eq!(buffer.create_view_from(16).resolve(), Ok((16, 48)));
        assert_eq!(buffer.create_view_from(60).resolve(), Ok((60, 4)));
        assert_eq!(buffer.view().resolve(), Ok((0, 64)));
    }

    #[test]
    fn test_offset_out_of_range() {
        let buffer = Buffer::allocated(BufferId(1), 64);
        assert_eq!(
            buffer.create_view_from(70).resolve(),
            Err(RangeError::OffsetOutOfRange {
                offset: 70,
                buffer_size: 64
            })
        );
        assert!(buffer.create_view_from(64).resolve().is_err());
    }

    #[test]
    fn test_explicit_size_bounds() {
        let buffer = Buffer::allocated(BufferId(1), 64);
        assert_eq!(buffer.create_view(32, 32).resolve(), Ok((32, 32)));
        assert_eq!(
            buffer.create_view(32, 33).resolve(),
            Err(RangeError::RangeOutOfBounds {
                offset: 32,
                size: 33,
                buffer_size: 64
            })
        );
    }

    #[test]
    fn test_unallocated_and_uncreated() {
        assert_eq!(Buffer::new(BufferId(3)).view().resolve(), Err(RangeError::NotAllocated));
        assert_eq!(
            Buffer::allocated(BufferId(0), 16).view().resolve(),
            Err(RangeError::NotCreated)
        );
    }

    #[test]
    fn test_nested_views() {
        let buffer = Buffer::allocated(BufferId(1), 256);
        let window = buffer.create_view(64, 128);
        assert_eq!(window.create_view(16, 32).resolve(), Ok((80, 32)));
        assert_eq!(window.create_view_from(32).resolve(), Ok((96, 96)));
        let tail = buffer.create_view_from(200);
        assert_eq!(tail.create_view_from(8).resolve(), Ok((208, 48)));
        assert_eq!(
            window.create_view_from(16).create_view(8, 8).resolve(),
            Ok((88, 8))
        );
    }

    #[test]
    fn test_nested_view_overrun() {
        let buffer = Buffer::allocated(BufferId(4), 256);
        let window = buffer.create_view(64, 16);
        assert_eq!(
            window.create_view_from(32).resolve(),
            Err(RangeError::ExceedsView {
                offset: 96,
                end: 96,
                view_end: 80
            })
        );
        assert_eq!(
            window.create_view_from(16).resolve(),
            Err(RangeError::ExceedsView {
                offset: 80,
                end: 80,
                view_end: 80
            })
        );
        assert_eq!(
            window.create_view(8, 16).resolve(),
            Err(RangeError::ExceedsView {
                offset: 72,
                end: 88,
                view_end: 80
            })
        );
        assert_eq!(window.create_view_from(8).resolve(), Ok((72, 8)));
    }

    #[test]
    fn test_empty_range_rejected() {
        let buffer = Buffer::allocated(BufferId(1), 64);
        assert_eq!(
            buffer.create_view(16, 0).resolve(),
            Err(RangeError::EmptyRange { offset: 16 })
        );
    }

    #[test]
    #[should_panic(expected = "not allocated")]
    fn test_check_allocated_guard() {
        Buffer::new(BufferId(9)).check_allocated();
    }
}
