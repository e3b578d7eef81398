//! Request signing for direct uploads.
//!
//! The upload host verifies `sign = md5(canonical_query + salt)`, where the
//! canonical query sorts parameter names and renders absent values as `key=`.

use std::collections::BTreeMap;

/// Render parameters as `k=v&k2=v2` in the order given, absent values as `k=`.
///
/// Values are not percent-encoded; this string only feeds the signature.
pub fn query_string<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut out = String::new();
    for (i, (key, value)) in params.into_iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(key);
        out.push('=');
        if let Some(value) = value {
            out.push_str(value);
        }
    }
    out
}

/// Lower-case hex MD5 of the sorted query string followed by `salt`.
pub fn sign_params<'a, I>(params: I, salt: &str) -> String
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let sorted: BTreeMap<&str, Option<&str>> = params.into_iter().collect();
    let mut input = query_string(sorted);
    input.push_str(salt);
    format!("{:x}", md5::compute(input.as_bytes()))
}
