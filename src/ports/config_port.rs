//! Configuration access port.

/// Raw `[section] key` lookups. Typed parsing and validation happen in the
/// caller so a bad value can be reported with its section and key.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
