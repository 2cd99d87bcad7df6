use bytes::{Buf, BufMut};
use commonware_codec::{Error, ReadExt, Write};

/// Helper to write a string as length-prefixed UTF-8 bytes.
pub fn write_string(s: &str, writer: &mut impl BufMut) {
    let bytes = s.as_bytes();
    (bytes.len() as u32).write(writer);
    writer.put_slice(bytes);
}

/// Helper to read a string from length-prefixed UTF-8 bytes.
pub fn read_string(reader: &mut impl Buf, max_len: usize) -> Result<String, Error> {
    let len = u32::read(reader)? as usize;
    if len > max_len {
        return Err(Error::Invalid("String", "too long"));
    }
    if reader.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = vec![0u8; len];
    reader.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).map_err(|_| Error::Invalid("String", "invalid UTF-8"))
}

/// Helper to get encode size of a string.
pub fn string_encode_size(s: &str) -> usize {
    4 + s.len()
}

/// Helper to write a list of strings as a count followed by each string.
pub fn write_string_list(list: &[String], writer: &mut impl BufMut) {
    (list.len() as u32).write(writer);
    for s in list {
        write_string(s, writer);
    }
}

/// Helper to read a list of strings with bounds on both count and item length.
pub fn read_string_list(
    reader: &mut impl Buf,
    max_items: usize,
    max_len: usize,
) -> Result<Vec<String>, Error> {
    let count = u32::read(reader)? as usize;
    if count > max_items {
        return Err(Error::Invalid("StringList", "too many items"));
    }
    let mut list = Vec::with_capacity(count);
    for _ in 0..count {
        list.push(read_string(reader, max_len)?);
    }
    Ok(list)
}

/// Helper to get encode size of a list of strings.
pub fn string_list_encode_size(list: &[String]) -> usize {
    4 + list.iter().map(|s| string_encode_size(s)).sum::<usize>()
}
