#![no_main]
use isocheck_core::channel::{self, DecodedComment};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(decoded) = channel::decode(&mut &data[..]) else {
        return;
    };

    // Whatever decodes must re-encode to a stream that decodes to the same records.
    let mut bytes = Vec::new();
    let records = decoded.iter().map(|d| (d.result, d.comment.as_deref()));
    if channel::encode(&mut bytes, records).is_err() {
        return;
    }
    let again = channel::decode(&mut bytes.as_slice()).expect("re-encoded stream decodes");
    assert_eq!(again.len(), decoded.len());
    for (a, b) in again.iter().zip(&decoded) {
        assert_eq!(a.result, b.result);
        if !matches!(b.comment, DecodedComment::Dropped { .. }) {
            assert_eq!(a.comment, b.comment);
        }
    }
});
