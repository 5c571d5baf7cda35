//! Internal helper macros and byte utilities.

/// Early-return with an error when a condition does not hold.
///
/// Like `assert!`, but evaluates to `return Err($error)` instead of
/// panicking, which keeps validation code flat.
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// Strips optional whitespace (space and horizontal tab) from both ends.
pub(crate) fn trim_ows(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != b' ' && *b != b'\t').unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| *b != b' ' && *b != b'\t').map_or(start, |p| p + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::trim_ows;

    #[test]
    fn trims_space_and_tab() {
        assert_eq!(trim_ows(b"  a; b\t "), b"a; b");
        assert_eq!(trim_ows(b"\t\t"), b"");
        assert_eq!(trim_ows(b""), b"");
        assert_eq!(trim_ows(b"x"), b"x");
    }
}
