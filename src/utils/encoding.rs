use std::io::{self, Read, Write};

/// Write a u32 in little-endian format
pub fn write_u32_le<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Read a u32 in little-endian format
pub fn read_u32_le<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Decode a u32 from a little-endian byte slice at an element index.
///
/// `index` counts u32 elements, not bytes. Panics if the slice is too short,
/// like ordinary slice indexing.
#[inline]
pub fn u32_at(bytes: &[u8], index: usize) -> u32 {
    let offset = index * 4;
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

/// Write a sequence of u32 values in little-endian format.
///
/// Values are staged through a fixed-size buffer to reduce system call
/// overhead on unbuffered writers.
pub fn write_u32_seq<W, I>(writer: &mut W, values: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = u32>,
{
    let mut buffer = Vec::with_capacity(8 * 1024);
    for value in values {
        buffer.extend_from_slice(&value.to_le_bytes());
        if buffer.len() >= 8 * 1024 {
            writer.write_all(&buffer)?;
            buffer.clear();
        }
    }
    if !buffer.is_empty() {
        writer.write_all(&buffer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u32_roundtrip() {
        let values = [0, 1, 127, 128, 16383, 16384, u32::MAX];
        let mut buf = Vec::new();
        for value in values {
            write_u32_le(&mut buf, value).unwrap();
        }
        let mut cursor = &buf[..];
        for value in values {
            assert_eq!(read_u32_le(&mut cursor).unwrap(), value);
        }
    }

    #[test]
    fn test_u32_at() {
        let mut buf = Vec::new();
        write_u32_seq(&mut buf, [7u32, 0, u32::MAX]).unwrap();
        assert_eq!(u32_at(&buf, 0), 7);
        assert_eq!(u32_at(&buf, 1), 0);
        assert_eq!(u32_at(&buf, 2), u32::MAX);
    }

    #[test]
    fn test_write_seq_crosses_buffer_boundary() {
        let values: Vec<u32> = (0..5000).collect();
        let mut buf = Vec::new();
        write_u32_seq(&mut buf, values.iter().copied()).unwrap();
        assert_eq!(buf.len(), 5000 * 4);
        for (i, value) in values.iter().enumerate() {
            assert_eq!(u32_at(&buf, i), *value);
        }
    }
}
