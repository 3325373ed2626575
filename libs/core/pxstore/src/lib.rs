mod backend;
mod codec;
mod error;

pub use backend::{FileBackend, KvBackend, MemoryBackend};
pub use codec::{decode_record, encode_record};
pub use error::StoreError;
