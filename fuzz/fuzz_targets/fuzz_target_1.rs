#![no_main]

use crypto_dto::{deserialize_with_key, CryptoDtoHeader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Hostile packets must be rejected without panicking
    let _ = CryptoDtoHeader::decode(data);
    if let Ok(de) = deserialize_with_key(&[0u8; 32], data) {
        assert!(de.is_verified());
    }
});
