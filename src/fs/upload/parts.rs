//! Slicing a payload into numbered parts for chunked upload.

/// One slice of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartSpec {
    /// 1-based part number
    pub number: u64,
    /// Byte offset into the payload
    pub offset: u64,
    pub len: u64,
}

/// Split `total` bytes into `ceil(total / part_size)` parts numbered from 1.
///
/// Every part is `part_size` long except the last, which holds the
/// remainder. An empty payload still yields one empty part.
pub fn plan_parts(total: u64, part_size: u64) -> Vec<PartSpec> {
    let part_size = part_size.max(1);
    let count = total.div_ceil(part_size).max(1);
    (0..count)
        .map(|i| {
            let offset = i * part_size;
            PartSpec {
                number: i + 1,
                offset,
                len: part_size.min(total - offset),
            }
        })
        .collect()
}
