#![no_main]
use libfuzzer_sys::fuzz_target;
use waypoint::{discovery, keys::KeyMapping, SaveDecoder};

fuzz_target!(|data: &[u8]| {
    let mapping: KeyMapping = [
        ("fDu", "DiscoveryManagerData"),
        ("ETO", "DiscoveryData-v1"),
        ("OsQ", "Store"),
        ("?fB", "Record"),
        ("Dtp", "DiscoveryType"),
        ("NKm", "Name"),
    ]
    .into_iter()
    .collect();

    let Ok(decoded) = SaveDecoder::new(&mapping).decode(data) else {
        return;
    };

    // Extraction never fails and never panics
    let extraction = discovery::extract(decoded.document());
    let _ = discovery::compare_snapshots(&extraction.systems, &extraction.systems);
});
