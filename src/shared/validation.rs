use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for owner ids embedded in storage keys
    /// Must be 1-128 ASCII letters, digits, underscores or hyphens
    /// - Valid: "user-1700000000000", "42", "a_b-C"
    /// - Invalid: "", "a/b", "../x", "user name"
    pub static ref OWNER_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,128}$").unwrap();
}
