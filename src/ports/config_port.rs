//! Configuration access port trait.

/// Section/key lookups over a configuration store.
///
/// Numeric and boolean getters fall back to `default` when the key is missing
/// or unparseable; use `get_string` to tell the two apart.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
