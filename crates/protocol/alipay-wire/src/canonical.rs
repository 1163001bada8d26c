//! Canonical parameter encoding.
//!
//! The string that gets signed is built from the request parameters as:
//!
//! ```text
//! 1. drop every parameter whose value is absent or empty
//! 2. sort the rest by name (byte order)
//! 3. join as name1=value1&name2=value2&...
//! ```
//!
//! Values are raw UTF-8; percent-encoding belongs to the transport and is
//! never applied here. Each call builds its own buffer, so concurrent
//! signings never share scratch space.

/// Encode `(name, value)` pairs into the canonical string.
///
/// # Example
/// ```
/// use alipay_wire::canonicalize;
///
/// let canonical = canonicalize([("b", Some("x")), ("a", Some("")), ("c", None)]);
/// assert_eq!(canonical, "b=x");
/// ```
pub fn canonicalize<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut present: Vec<(&str, &str)> = params
        .into_iter()
        .filter_map(|(name, value)| match value {
            Some(value) if !value.is_empty() => Some((name, value)),
            _ => None,
        })
        .collect();

    // Stable: duplicate names keep their insertion order
    present.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    let capacity = present
        .iter()
        .map(|(name, value)| name.len() + value.len() + 2)
        .sum::<usize>();
    let mut out = String::with_capacity(capacity);

    for (i, (name, value)) in present.into_iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(name);
        out.push('=');
        out.push_str(value);
    }
    out
}

/// Encode a flat field map, skipping the named fields.
///
/// Used on the verification side, where `sign` must not be part of the
/// string it authenticates.
pub fn canonicalize_excluding<'a, I, K, V>(fields: I, excluded: &[&str]) -> String
where
    I: IntoIterator<Item = (&'a K, &'a V)>,
    K: AsRef<str> + 'a + ?Sized,
    V: AsRef<str> + 'a + ?Sized,
{
    canonicalize(
        fields
            .into_iter()
            .map(|(name, value)| (name.as_ref(), Some(value.as_ref())))
            .filter(|(name, _)| !excluded.contains(name)),
    )
}
