//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Renders a decoded `Value` as a single CSV cell.

use crate::object::Value;

pub fn value_to_cell(value: &Value) -> String {
    match value {
        Value::FShort(v) => v.to_string(),
        Value::FSingl(v) => v.to_string(),
        Value::FSing1 { value, .. } => value.to_string(),
        Value::FSing2 { value, .. } => value.to_string(),
        Value::ISingl(v) => v.to_string(),
        Value::VSingl(v) => v.to_string(),
        Value::FDoubl(v) => v.to_string(),
        Value::FDoub1 { value, .. } => value.to_string(),
        Value::FDoub2 { value, .. } => value.to_string(),
        Value::CSingl { real, imag } => format!("{}+{}i", real, imag),
        Value::CDoubl { real, imag } => format!("{}+{}i", real, imag),
        Value::SShort(v) => v.to_string(),
        Value::SNorm(v) => v.to_string(),
        Value::SLong(v) => v.to_string(),
        Value::UShort(v) => v.to_string(),
        Value::UNorm(v) => v.to_string(),
        Value::ULong(v) => v.to_string(),
        Value::UVari(v) => v.to_string(),
        Value::Ident(s) | Value::Ascii(s) | Value::Units(s) => s.text.clone(),
        Value::DTime(d) => format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:06}",
            d.year, d.month, d.day, d.hour, d.minute, d.second, d.microsecond
        ),
        Value::Origin(v) => v.to_string(),
        Value::ObName(n) => format!("{}.{}.{}", n.origin, n.copy, n.identifier),
        Value::ObjRef(r) => format!("{}:{}.{}.{}", r.object_type, r.name.origin, r.name.copy, r.name.identifier),
        Value::AttRef(r) => format!(
            "{}:{}.{}.{}:{}",
            r.object_type, r.name.origin, r.name.copy, r.name.identifier, r.label
        ),
        Value::Status(b) => b.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_scalar_float() {
        assert_eq!(value_to_cell(&Value::FSingl(1.5)), "1.5");
    }

    #[test]
    fn renders_an_obname() {
        let n = crate::object::ObName { origin: 2, copy: 0, identifier: "DEPT".to_string() };
        assert_eq!(value_to_cell(&Value::ObName(n)), "2.0.DEPT");
    }
}
