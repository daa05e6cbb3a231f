#![no_main]
use ipdb_field::{get_field, ClientAddress, IpdbReader};
use libfuzzer_sys::fuzz_target;
use std::net::{Ipv4Addr, Ipv6Addr};

fuzz_target!(|data: &[u8]| {
    // Garbage files must fail to open or fail lookups, never panic
    let Ok(reader) = IpdbReader::from_bytes(data.to_vec()) else {
        return;
    };

    let probes = [
        ClientAddress::from(Ipv4Addr::new(1, 2, 3, 4)),
        ClientAddress::from(Ipv4Addr::BROADCAST),
        ClientAddress::from(Ipv6Addr::LOCALHOST),
    ];
    for addr in &probes {
        for language in reader_languages(&reader) {
            let _ = get_field(&reader, addr, &language, 0);
        }
    }
});

fn reader_languages(reader: &IpdbReader) -> Vec<String> {
    use ipdb_field::LookupEngine;
    reader
        .metadata()
        .language_names()
        .map(str::to_string)
        .collect()
}
