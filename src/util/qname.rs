//! Qualified name handling.
//!
//! A qualified name has the form `prefix:local` or just `local`. The
//! functions here split names and implement the name-matching rules used by
//! attribute lookup and namespace resolution.
//!
//! See <https://www.w3.org/TR/xml-names/#NT-QName>

/// Splits a qualified name into its prefix and local name parts.
///
/// Only the first colon separates the prefix.
///
/// # Examples
///
/// ```
/// use jebixml::util::qname::split_qname;
///
/// assert_eq!(split_qname("svg:rect"), (Some("svg"), "rect"));
/// assert_eq!(split_qname("div"), (None, "div"));
/// ```
#[must_use]
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

/// Returns the local part of a qualified name.
#[must_use]
pub fn local_part(qname: &str) -> &str {
    split_qname(qname).1
}

/// Decides whether an attribute named `candidate` answers a lookup for `query`.
///
/// A prefixed candidate must match both prefix and local name of the query.
/// An unprefixed candidate is compared against the whole query, so a plain
/// `a="…"` answers `a` but not `p:a`.
#[must_use]
pub fn attribute_name_matches(candidate: &str, query: &str) -> bool {
    let (query_prefix, query_local) = split_qname(query);
    match split_qname(candidate) {
        (Some(prefix), local) => query_prefix == Some(prefix) && query_local == local,
        (None, local) => query == local,
    }
}

/// If `attr_name` declares a namespace, returns the prefix it binds.
///
/// `xmlns` binds the default namespace and yields `Some("")`; `xmlns:p`
/// yields `Some("p")`. Any other name yields `None`.
#[must_use]
pub fn declared_prefix(attr_name: &str) -> Option<&str> {
    if attr_name == "xmlns" {
        Some("")
    } else {
        attr_name.strip_prefix("xmlns:")
    }
}
