//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// Every `key = value` pair of a section, in file order. Keys keep their
    /// original case.
    fn get_entries(&self, section: &str) -> Vec<(String, String)>;
}
