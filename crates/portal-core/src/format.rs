//! Display helpers shared by screens

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distr::Alphanumeric;
use rand::Rng;

const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Human-readable byte count, 1024-based
///
/// One decimal is shown only for scaled values below 10, e.g. `1.5 KiB`,
/// `12 MiB`, `512 B`.
#[must_use]
pub fn nice_bytes(bytes: u64) -> String {
    let mut level = 0;
    #[allow(clippy::cast_precision_loss)]
    let mut n = bytes as f64;
    while n >= 1024.0 && level < UNITS.len() - 1 {
        n /= 1024.0;
        level += 1;
    }
    if n < 10.0 && level > 0 {
        format!("{n:.1} {}", UNITS[level])
    } else {
        format!("{n:.0} {}", UNITS[level])
    }
}

/// Random alphanumeric string, used for generated access/secret keys
#[must_use]
pub fn random_string(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Left as-is by `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Left as-is by `encodeURI`: the component set plus URI syntax
const URI: &AsciiSet = &COMPONENT
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'#');

/// Percent-encode everything except URI syntax, like `encodeURI`
#[must_use]
pub fn encode_uri(value: &str) -> String {
    utf8_percent_encode(value, URI).to_string()
}

/// Percent-encode a single query value, like `encodeURIComponent`
#[must_use]
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nice_bytes_units() {
        assert_eq!(nice_bytes(0), "0 B");
        assert_eq!(nice_bytes(512), "512 B");
        assert_eq!(nice_bytes(1536), "1.5 KiB");
        assert_eq!(nice_bytes(12 * 1024 * 1024), "12 MiB");
        assert_eq!(nice_bytes(u64::MAX), "16 EiB");
    }

    #[test]
    fn random_string_shape() {
        let a = random_string(16);
        let b = random_string(16);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn uri_encoding() {
        assert_eq!(encode_uri("a b/c?d=e"), "a%20b/c?d=e");
        assert_eq!(encode_uri("ñ"), "%C3%B1");
        assert_eq!(encode_uri_component("/b/o&x"), "%2Fb%2Fo%26x");
        assert_eq!(encode_uri_component("get-object"), "get-object");
    }

    #[test]
    fn uri_marks_and_reserved() {
        assert_eq!(encode_uri("a;b,c@d+e$f#g"), "a;b,c@d+e$f#g");
        assert_eq!(encode_uri("[x]%"), "%5Bx%5D%25");
        assert_eq!(encode_uri_component("it's (ok)!*~"), "it's%20(ok)!*~");
        assert_eq!(encode_uri_component("a+b=c;d"), "a%2Bb%3Dc%3Bd");
    }

    proptest! {
        #[test]
        fn nice_bytes_always_has_unit(bytes in any::<u64>()) {
            let s = nice_bytes(bytes);
            prop_assert!(UNITS.iter().any(|u| s.ends_with(u)));
        }
    }
}
