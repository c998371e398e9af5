use crate::common::constants::{
    HEADER_FIELD_LIMIT, HEADER_FIELD_SEPARATOR, HEADER_QUOTE, OVERFLOW_JOINER,
};

/// One `descriptor: value[: overflow...]` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct HeaderLine {
    pub(super) source_line: usize,
    pub(super) descriptor: String,
    pub(super) value: String,
    pub(super) overflow: Vec<String>,
}

impl HeaderLine {
    pub(super) fn parse(source_line: usize, raw: &str) -> Self {
        let mut fields = split_header_fields(raw).into_iter();
        let descriptor = fields.next().unwrap_or_default();
        let value = fields.next().unwrap_or_default();
        Self {
            source_line,
            descriptor,
            value,
            overflow: fields.collect(),
        }
    }

    pub(super) fn has_overflow(&self) -> bool {
        self.overflow.iter().any(|fragment| !fragment.is_empty())
    }

    /// Value joined with its overflow fragments, stopping at the first empty one.
    pub(super) fn merged_value(&self) -> String {
        let mut merged = self.value.clone();
        for fragment in &self.overflow {
            if fragment.is_empty() {
                break;
            }
            merged.push_str(OVERFLOW_JOINER);
            merged.push_str(fragment);
        }
        merged
    }
}

/// Splits on `:` into at most [`HEADER_FIELD_LIMIT`] trimmed fields.
///
/// A `"` toggles quoting; separators inside quotes do not split and the quote
/// characters themselves are dropped. Text past the last allowed separator stays
/// in the final field.
pub(super) fn split_header_fields(raw: &str) -> Vec<String> {
    let mut fields = Vec::with_capacity(HEADER_FIELD_LIMIT);
    let mut current = String::new();
    let mut quoted = false;

    for character in raw.chars() {
        if character == HEADER_QUOTE {
            quoted = !quoted;
            continue;
        }

        if character == HEADER_FIELD_SEPARATOR
            && !quoted
            && fields.len() + 1 < HEADER_FIELD_LIMIT
        {
            fields.push(current.trim().to_string());
            current.clear();
            continue;
        }

        current.push(character);
    }

    fields.push(current.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::{HeaderLine, split_header_fields};

    #[test]
    fn fields_are_trimmed_and_capped_at_five() {
        assert_eq!(split_header_fields("Name: Oak"), vec!["Name", "Oak"]);
        assert_eq!(split_header_fields("Sample No."), vec!["Sample No."]);
        assert_eq!(
            split_header_fields("Description: a: b: c: d: e"),
            vec!["Description", "a", "b", "c", "d: e"]
        );
    }

    #[test]
    fn quoted_colons_do_not_split() {
        assert_eq!(
            split_header_fields("Name: \"Ratio 1:2\": extra"),
            vec!["Name", "Ratio 1:2", "extra"]
        );
    }

    #[test]
    fn merged_value_stops_at_first_empty_fragment() {
        let line = HeaderLine::parse(3, "Description: Leaf: dry:  : tail");
        assert_eq!(line.source_line, 3);
        assert_eq!(line.descriptor, "Description");
        assert!(line.has_overflow());
        assert_eq!(line.merged_value(), "Leaf: dry");

        let plain = HeaderLine::parse(1, "Description: Green leaf");
        assert!(!plain.has_overflow());
        assert_eq!(plain.merged_value(), "Green leaf");
    }
}
