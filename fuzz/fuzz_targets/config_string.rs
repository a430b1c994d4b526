//! Fuzz generator configuration string parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sql_testkit::{Generator, GeneratorConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    // Accepted configurations must always build a working generator.
    if let Ok(config) = GeneratorConfig::from_config_string(s) {
        let mut generator = Generator::new(config.seed(0)).unwrap();
        let _ = generator.value_for(testkit_types::SqlType::Date, true);
    }
});
