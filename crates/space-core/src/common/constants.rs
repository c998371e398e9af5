//! Fixed names and tokens shared by the import stages.

/// Substrings every accepted input path must contain.
pub const FILE_FILTER_TOKENS: [&str; 3] = ["tir", "nicolet", "spectrum"];
pub const FILE_FILTER_SUFFIX: &str = ".txt";

/// Header fields per line: descriptor, value and up to three overflow fragments.
pub const HEADER_FIELD_LIMIT: usize = 5;
pub const HEADER_FIELD_SEPARATOR: char = ':';
pub const HEADER_QUOTE: char = '"';
pub const PAIR_SEPARATOR: char = '\t';
pub const OVERFLOW_JOINER: &str = ": ";

pub const DESCRIPTION_DESCRIPTOR: &str = "Description";
pub const X_UNITS_DESCRIPTOR: &str = "X Units";
pub const Y_UNITS_DESCRIPTOR: &str = "Y Units";

pub const NONE_SPECIFIED: &str = "None specified";
pub const TAXONOMY_SEPARATOR: char = '.';

#[cfg(test)]
mod tests {
    use super::{FILE_FILTER_SUFFIX, FILE_FILTER_TOKENS, HEADER_FIELD_LIMIT};

    #[test]
    fn filter_tokens_are_lowercase_literals() {
        assert_eq!(FILE_FILTER_TOKENS, ["tir", "nicolet", "spectrum"]);
        assert_eq!(FILE_FILTER_SUFFIX, ".txt");
        assert_eq!(HEADER_FIELD_LIMIT, 5);
    }
}
