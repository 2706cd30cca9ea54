use crate::format::{
    BLOCK_REWRITE, CONFIG_BLOCK_SIZE, CONFIG_CUE_SIZE, CONFIG_END, FILE_MAGIC,
};

pub fn varint_bytes(n: u64) -> Vec<u8> {
    let mut buf = [0u8; varint::MAX_ENCODED_LEN];
    let len = varint::encode(n, &mut buf);
    buf[..len].to_vec()
}

/// Builds the serialized segment header, with the file magic iff the
/// segment sits at offset zero.
pub fn header(with_magic: bool, blocksize: u64, cuesize: u64) -> Vec<u8> {
    let mut out = Vec::new();
    if with_magic {
        out.extend_from_slice(&FILE_MAGIC);
    }
    out.extend(varint_bytes(CONFIG_BLOCK_SIZE));
    out.extend(varint_bytes(blocksize));
    out.extend(varint_bytes(CONFIG_CUE_SIZE));
    out.extend(varint_bytes(cuesize));
    out.extend(varint_bytes(CONFIG_END));
    out
}

/// Builds one serialized REWRITE record.
pub fn record(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(varint_bytes(BLOCK_REWRITE));
    out.extend(varint_bytes(payload.len() as u64));
    out.extend_from_slice(payload);
    out
}
