//! Copy strategy and multipart part planning.
//!
//! Pure logic for deciding how an object is copied and how a large object is
//! split into byte ranges. No I/O operations - just decision making.

use rusty_lifecycle_common::{MAX_COPY_PARTS, MAX_COPY_PART_SIZE, MIN_COPY_PART_SIZE};

/// One byte range of a multipart copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyPart {
    /// One-based part number, as S3 expects.
    pub part_number: i32,
    /// Byte offset within the source object.
    pub offset: u64,
    /// Length of this part in bytes.
    pub length: u64,
}

impl CopyPart {
    /// Inclusive byte range for `x-amz-copy-source-range`.
    pub fn range_header(&self) -> String {
        format!("bytes={}-{}", self.offset, self.offset + self.length - 1)
    }
}

/// How an object is copied into its new tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStrategy {
    /// One `CopyObject` request.
    SingleRequest,
    /// Multipart upload with `UploadPartCopy` per range.
    Chunked,
}

/// Choose the copy strategy for an object.
///
/// Objects up to and including `threshold` bytes are copied in one request.
pub fn copy_strategy(size: u64, threshold: u64) -> CopyStrategy {
    if size > threshold {
        CopyStrategy::Chunked
    } else {
        CopyStrategy::SingleRequest
    }
}

/// Part size actually used for an object of `size` bytes.
///
/// The requested size is clamped to the store limits, then grown until the
/// object fits in `MAX_COPY_PARTS` parts.
pub fn effective_part_size(size: u64, requested: u64) -> u64 {
    let mut part_size: u64 = requested.clamp(MIN_COPY_PART_SIZE, MAX_COPY_PART_SIZE);
    let min_for_count: u64 = size.div_ceil(MAX_COPY_PARTS);
    if part_size < min_for_count {
        part_size = min_for_count.min(MAX_COPY_PART_SIZE);
    }
    part_size
}

/// Split an object into copy parts.
///
/// # Arguments
/// * `size` - Total object size in bytes
/// * `chunk_size` - Requested part size (clamped, see `effective_part_size`)
///
/// # Returns
/// Parts covering `[0, size)` in order. The last part may be shorter.
/// An empty object yields no parts.
pub fn plan_copy_parts(size: u64, chunk_size: u64) -> Vec<CopyPart> {
    let part_size: u64 = effective_part_size(size, chunk_size);
    let mut parts: Vec<CopyPart> = Vec::new();
    let mut offset: u64 = 0;
    let mut part_number: i32 = 1;

    while offset < size {
        let length: u64 = std::cmp::min(part_size, size - offset);
        parts.push(CopyPart {
            part_number,
            offset,
            length,
        });
        offset += length;
        part_number += 1;
    }

    parts
}
