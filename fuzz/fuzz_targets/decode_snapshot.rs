//! Fuzz snapshot decoding and replay.
//!
//! Any buffer that decodes must re-encode into a decodable buffer and
//! replay through a cached reader without panicking.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use sql_testkit::{CachedDataReader, DataReader};
use testkit_protocol::Snapshot;

fuzz_target!(|data: &[u8]| {
    let Ok(snapshot) = Snapshot::decode(data) else {
        return;
    };

    if let Ok(encoded) = snapshot.encode() {
        assert!(Snapshot::decode(encoded).is_ok());
    }

    if let Ok(mut reader) = CachedDataReader::from_bytes(Bytes::copy_from_slice(data)) {
        loop {
            while let Ok(true) = reader.read() {}
            if !matches!(reader.next_result(), Ok(true)) {
                break;
            }
        }
    }
});
