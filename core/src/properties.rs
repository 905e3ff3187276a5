//! Properties

use crate::common::*;
use std::collections::HashMap;

/// Define a macro that can be used to generate a function for adding/replacing
/// a property value.
macro_rules! property_add {
    ($func: ident, $t: ty, $map: ident) => {
        pub fn $func(&mut self, name: &str, value: $t) {
            self.$map.insert(String::from(name), value);
        }
    };
}

/// Define a macro that can be used to generate a function for looking up a
/// property value with a fallback default.
macro_rules! property_find_one {
    ($func: ident, $t: ty, $map: ident) => {
        pub fn $func(&self, name: &str, default: $t) -> $t {
            match self.$map.get(name) {
                Some(value) => value.clone(),
                None => default,
            }
        }
    };
}

/// Stores typed key/value configuration properties in hashmaps.
#[derive(Clone, Debug, Default)]
pub struct Properties {
    pub bools: HashMap<String, bool>,
    pub ints: HashMap<String, Int>,
    pub floats: HashMap<String, Float>,
    pub strings: HashMap<String, String>,
}

impl Properties {
    /// Returns a new empty `Properties`.
    pub fn new() -> Self {
        Self::default()
    }

    property_add!(add_bool, bool, bools);
    property_find_one!(find_one_bool, bool, bools);

    property_add!(add_int, Int, ints);
    property_find_one!(find_one_int, Int, ints);

    property_add!(add_float, Float, floats);
    property_find_one!(find_one_float, Float, floats);

    property_add!(add_string, String, strings);
    property_find_one!(find_one_string, String, strings);

    /// Returns true if a property of any type was stored under the name.
    ///
    /// * `name` - Property name.
    pub fn has(&self, name: &str) -> bool {
        self.bools.contains_key(name)
            || self.ints.contains_key(name)
            || self.floats.contains_key(name)
            || self.strings.contains_key(name)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_used_for_missing_keys() {
        let props = Properties::new();
        assert_eq!(props.find_one_bool("a.b", true), true);
        assert_eq!(props.find_one_int("a.b", 7), 7);
        assert_eq!(props.find_one_float("a.b", 0.5), 0.5);
        assert_eq!(props.find_one_string("a.b", String::from("x")), "x");
    }

    #[test]
    fn stored_values_win() {
        let mut props = Properties::new();
        props.add_bool("flag", false);
        props.add_int("count", 3);
        props.add_string("mode", String::from("fast"));
        assert_eq!(props.find_one_bool("flag", true), false);
        assert_eq!(props.find_one_int("count", 7), 3);
        assert_eq!(props.find_one_string("mode", String::from("slow")), "fast");
        assert!(props.has("mode"));
        assert!(!props.has("missing"));
    }
}
