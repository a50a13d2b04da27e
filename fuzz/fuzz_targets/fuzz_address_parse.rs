#![no_main]

use libfuzzer_sys::fuzz_target;

use stakemod_types::Address;

// Address parsing must never panic, and anything it accepts prints back
// to an equivalent address.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(address) = s.parse::<Address>() {
            let printed = address.to_string();
            assert_eq!(printed.parse::<Address>().ok(), Some(address));
        }
    }
});
