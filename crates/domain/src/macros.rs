//! Macro for implementing Display and FromStr for name-tagged enums
//!
//! Generates both conversions from a single variant/name table so the
//! printed and parsed forms cannot drift apart.
//!
//! # Example
//!
//! ```rust
//! use adreach_domain::impl_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Direction {
//!     Forward,
//!     Backward,
//! }
//!
//! impl_name_conversions!(Direction {
//!     Forward => "forward",
//!     Backward => "backward",
//! });
//!
//! assert_eq!(Direction::Forward.to_string(), "forward");
//! assert_eq!("BACKWARD".parse::<Direction>(), Ok(Direction::Backward));
//! ```

/// Implements `Display` and case-insensitive `FromStr` for a fieldless enum
#[macro_export]
macro_rules! impl_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Sample {
        First,
        SecondItem,
    }

    impl_name_conversions!(Sample {
        First => "first",
        SecondItem => "second_item",
    });

    #[test]
    fn test_display_uses_table_name() {
        assert_eq!(Sample::First.to_string(), "first");
        assert_eq!(Sample::SecondItem.to_string(), "second_item");
    }

    #[test]
    fn test_parse_ignores_case_and_whitespace() {
        assert_eq!(Sample::from_str(" SECOND_item ").unwrap(), Sample::SecondItem);
    }

    #[test]
    fn test_parse_invalid() {
        let err = Sample::from_str("third").unwrap_err();
        assert!(err.contains("Invalid Sample: third"));
    }
}
