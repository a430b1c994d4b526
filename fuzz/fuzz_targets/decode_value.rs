//! Fuzz column value decoding for every type.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use testkit_protocol::value::decode_value;
use testkit_types::SqlType;

#[derive(Debug, Arbitrary)]
struct Input {
    type_selector: u8,
    length: u16,
    scale: u8,
    data: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let length = input.length.max(1);
    let scale = input.scale % 8;
    let sql_type = match input.type_selector % 17 {
        0 => SqlType::Bit,
        1 => SqlType::TinyInt,
        2 => SqlType::SmallInt,
        3 => SqlType::Int,
        4 => SqlType::BigInt,
        5 => SqlType::Real,
        6 => SqlType::Float,
        7 => SqlType::Decimal {
            precision: 38,
            scale: scale * 4,
        },
        8 => SqlType::NVarChar { max_length: length },
        9 => SqlType::VarChar { max_length: length },
        10 => SqlType::VarBinary { max_length: length },
        11 => SqlType::UniqueIdentifier,
        12 => SqlType::Date,
        13 => SqlType::Time { scale },
        14 => SqlType::DateTime2 { scale },
        15 => SqlType::DateTimeOffset { scale },
        _ => SqlType::Xml,
    };

    let mut buf = &input.data[..];
    let _ = decode_value(&mut buf, &sql_type);
});
