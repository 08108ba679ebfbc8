use snafu::{ResultExt, Snafu};

use crate::snapshot::FileTree;

/// Compression level for the index payload; the default zstd trade-off.
const COMPRESSION_LEVEL: i32 = 3;

/// Encodes a snapshot list for the transport hop: bincode with the
/// standard configuration, then zstd. Round-trips losslessly; the payload
/// contains only strings, integers and floats.
pub fn encode_trees(trees: &[FileTree]) -> Result<Vec<u8>, CodecError> {
    let raw = bincode::encode_to_vec(trees, bincode::config::standard()).context(EncodeSnafu)?;
    zstd::stream::encode_all(raw.as_slice(), COMPRESSION_LEVEL).context(CompressSnafu)
}

pub fn decode_trees(bytes: &[u8]) -> Result<Vec<FileTree>, CodecError> {
    let raw = zstd::stream::decode_all(bytes).context(DecompressSnafu)?;
    let (trees, consumed) =
        bincode::decode_from_slice(&raw, bincode::config::standard()).context(DecodeSnafu)?;
    if consumed != raw.len() {
        return TrailingBytesSnafu {
            trailing: raw.len() - consumed,
        }
        .fail();
    }
    Ok(trees)
}

#[derive(Debug, Snafu)]
pub enum CodecError {
    #[snafu(display("Failed to encode the snapshot index"))]
    EncodeError { source: bincode::error::EncodeError },
    #[snafu(display("Failed to decode the snapshot index"))]
    DecodeError { source: bincode::error::DecodeError },
    #[snafu(display("Failed to compress the snapshot index"))]
    CompressError { source: std::io::Error },
    #[snafu(display("Failed to decompress the snapshot index"))]
    DecompressError { source: std::io::Error },
    #[snafu(display("Snapshot index has {} unexpected trailing bytes", trailing))]
    TrailingBytes { trailing: usize },
}
