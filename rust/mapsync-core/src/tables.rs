use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};

/// Packed metatile attribute table: one little-endian u32 per metatile.
pub type AttributeTable = Arc<Vec<u32>>;

/// Run-lifetime memo for attribute tables. Many layouts share a tileset,
/// so each binary is read and decoded at most once per run; a missing
/// file is memoized as absent too.
#[derive(Debug, Default)]
pub struct AttributeCache {
    entries: HashMap<PathBuf, Option<AttributeTable>>,
}

impl AttributeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, path: &Path) -> Option<AttributeTable> {
        if let Some(hit) = self.entries.get(path) {
            return hit.clone();
        }
        let loaded = read_attributes(path);
        self.entries.insert(path.to_path_buf(), loaded.clone());
        loaded
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_attributes(path: &Path) -> Option<AttributeTable> {
    let data = fs::read(path).ok()?;
    let count = data.len() / 4;
    let mut out = Vec::with_capacity(count);
    for chunk in data[..count * 4].chunks_exact(4) {
        out.push(LittleEndian::read_u32(chunk));
    }
    Some(Arc::new(out))
}

/// Load a layout's packed block data: little-endian u16 per grid cell,
/// row-major. Absent or undersized files are "absent", not errors, and the
/// caller skips the map.
pub fn load_blocks(path: &Path, width: usize, height: usize) -> Option<Vec<u16>> {
    let cells = width.checked_mul(height)?;
    let expected = cells.checked_mul(2)?;
    let data = fs::read(path).ok()?;
    if data.len() < expected {
        return None;
    }
    let mut out = Vec::with_capacity(cells);
    for chunk in data[..expected].chunks_exact(2) {
        out.push(LittleEndian::read_u16(chunk));
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_u16_le(values: &[u16]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        for v in values {
            f.write_all(&v.to_le_bytes()).unwrap();
        }
        f.flush().unwrap();
        f
    }

    fn write_u32_le(values: &[u32]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        for v in values {
            f.write_all(&v.to_le_bytes()).unwrap();
        }
        f.flush().unwrap();
        f
    }

    #[test]
    fn blocks_decode_little_endian_row_major() {
        let f = write_u16_le(&[0x0001, 0x03FF, 0x0280, 0x8002]);
        let blocks = load_blocks(f.path(), 2, 2).unwrap();
        assert_eq!(blocks, vec![0x0001, 0x03FF, 0x0280, 0x8002]);
    }

    #[test]
    fn undersized_blocks_are_absent() {
        let f = write_u16_le(&[1, 2, 3]);
        assert!(load_blocks(f.path(), 2, 2).is_none());
    }

    #[test]
    fn oversized_blocks_are_truncated_to_grid() {
        let f = write_u16_le(&[1, 2, 3, 4, 5, 6]);
        let blocks = load_blocks(f.path(), 2, 2).unwrap();
        assert_eq!(blocks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn missing_blocks_file_is_absent() {
        assert!(load_blocks(Path::new("/nonexistent/map.bin"), 2, 2).is_none());
    }

    #[test]
    fn attribute_cache_reuses_decoded_tables() {
        let f = write_u32_le(&[0x0000_0038, 0x0100_0000]);
        let mut cache = AttributeCache::new();
        let a = cache.load(f.path()).unwrap();
        assert_eq!(*a, vec![0x0000_0038, 0x0100_0000]);

        let b = cache.load(f.path()).unwrap();
        assert!(Arc::ptr_eq(&a, &b), "second load must hit the memo");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn attribute_cache_memoizes_absence() {
        let mut cache = AttributeCache::new();
        let missing = Path::new("/nonexistent/metatile_attributes.bin");
        assert!(cache.load(missing).is_none());
        assert!(cache.load(missing).is_none());
        assert_eq!(cache.len(), 1);
    }
}
