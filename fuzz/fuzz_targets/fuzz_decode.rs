#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Probe and auto-detect decode (PFM, Radiance) must never panic
    let _ = zenramp::ImageInfo::from_bytes(data);
    let limits = zenramp::Limits::none().with_max_memory_bytes(64 << 20);
    let _ = zenramp::DecodeRequest::new(data)
        .with_limits(&limits)
        .decode(zenramp::Unstoppable);
});
