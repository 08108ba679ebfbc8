//! The remote side of a comparison: endpoint addressing, the snapshot wire
//! codec, and the ssh transport that asks a remote `remdiff` for its index.

mod codec;
mod endpoint;
mod transport;

pub use codec::{CodecError, decode_trees, encode_trees};
pub use endpoint::{EndpointParseError, RemoteEndpoint};
pub use transport::{RemoteSnapshot, SnapshotRequest, TransportError};
