#![no_main]

use libfuzzer_sys::fuzz_target;
use metadigest::metadata::{
    digest::{Digest, DigestOptions},
    reader::BinaryReader,
};

fuzz_target!(|data: &[u8]| {
    let options = DigestOptions {
        include_invisible: true,
        ..DigestOptions::default()
    };
    let _ = BinaryReader::decode(data, Some("Target"), &options);
    let _ = Digest::from_class_bytes(data.to_vec(), None, &options);
});
