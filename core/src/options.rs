use std::fmt::Display;
use std::str::FromStr;

use uci::{UciOption, UciOptionType};

/// An adjustable value together with the rules it is validated against.
#[derive(Debug, Clone)]
pub struct OptionParam<T> {
    pub value: T,
    pub meta: UciOption,
}

impl<T> OptionParam<T>
where
    T: FromStr + ToString + PartialEq,
    T::Err: Display,
{
    /// Returns whether the value changed.
    pub fn update(&mut self, value: &str) -> Result<bool, String> {
        let value = value.trim().to_ascii_lowercase();
        self.meta.option_type.validate(&value)?;

        let parsed = value
            .parse::<T>()
            .map_err(|e| format!("Parse error: {}", e))?;
        if parsed == self.value {
            return Ok(false);
        }
        self.value = parsed;
        Ok(true)
    }

    pub fn describe(&self) -> String {
        self.meta.option_type.to_uci(self.meta.name, &self.value)
    }
}

macro_rules! define_options {
    ($(($field:ident: $type:ty, $name:literal, $option_type:expr, $default:expr)),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub struct HelperOptions {
            $(pub $field: OptionParam<$type>,)*
        }

        impl Default for HelperOptions {
            fn default() -> Self {
                Self {
                    $($field: OptionParam {
                        value: $default,
                        meta: UciOption {
                            name: $name,
                            option_type: $option_type,
                        },
                    },)*
                }
            }
        }

        impl HelperOptions {
            pub fn update(&mut self, name: &str, value: &str) -> Result<bool, String> {
                match name {
                    $($name => self.$field.update(value),)*
                    _ => Err(format!("Unknown option: {}", name)),
                }
            }

            pub fn describe(&self) -> Vec<String> {
                vec![$(self.$field.describe(),)*]
            }
        }
    };
}

define_options!(
    // Seconds per search
    (move_time: u64, "movetime", UciOptionType::Spin { min: 1, max: 60 }, 2),
    (line_count: u8, "multipv", UciOptionType::Spin { min: 1, max: 5 }, 1),
    // Moves shown per candidate line
    (display_depth: usize, "depth", UciOptionType::Spin { min: 1, max: 20 }, 8),
    (assist: bool, "assist", UciOptionType::Check, true),
);
