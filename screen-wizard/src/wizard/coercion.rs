// Field coercion
// Normalizes raw input coming from the form (text, checkbox state, picked files) into typed
// field values. Every function here is pure and total: bad input becomes a value the
// validator can report on, never an error.

use crate::models::draft::{Attachment, NumericInput, ScreenType, SolutionType};
use std::borrow::Cow;

/// Raw input as produced by a form control.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Checked(bool),
    File(Attachment),
}

impl RawValue {
    pub fn text(value: impl Into<String>) -> Self {
        RawValue::Text(value.into())
    }

    fn as_text(&self) -> Cow<'_, str> {
        match self {
            RawValue::Text(s) => Cow::Borrowed(s.as_str()),
            RawValue::Checked(b) => Cow::Owned(b.to_string()),
            RawValue::File(f) => Cow::Borrowed(f.file_name.as_str()),
        }
    }
}

/// Free text is stored as typed; emptiness checks trim later.
pub fn coerce_text(raw: &RawValue) -> String {
    raw.as_text().into_owned()
}

pub fn coerce_integer(raw: &RawValue) -> NumericInput<i64> {
    let text = raw.as_text();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return NumericInput::Empty;
    }
    match trimmed.parse::<i64>() {
        Ok(v) => NumericInput::Value(v),
        Err(_) => NumericInput::Malformed(text.into_owned()),
    }
}

pub fn coerce_decimal(raw: &RawValue) -> NumericInput<f64> {
    let text = raw.as_text();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return NumericInput::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => NumericInput::Value(v),
        _ => NumericInput::Malformed(text.into_owned()),
    }
}

pub fn coerce_flag(raw: &RawValue) -> bool {
    match raw {
        RawValue::Checked(b) => *b,
        RawValue::Text(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "on" | "yes" | "1"
        ),
        RawValue::File(_) => false,
    }
}

pub fn coerce_screen_type(raw: &RawValue) -> Option<ScreenType> {
    ScreenType::parse(&raw.as_text())
}

pub fn coerce_solution_type(raw: &RawValue) -> Option<SolutionType> {
    SolutionType::parse(&raw.as_text())
}

/// Only an actual file fills a slot; any text (including empty) clears it.
pub fn coerce_file(raw: &RawValue) -> Option<Attachment> {
    match raw {
        RawValue::File(f) => Some(f.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_trim_and_keep_malformed_text() {
        assert_eq!(coerce_integer(&RawValue::text("")), NumericInput::Empty);
        assert_eq!(coerce_integer(&RawValue::text("   ")), NumericInput::Empty);
        assert_eq!(coerce_integer(&RawValue::text(" 12 ")), NumericInput::Value(12));
        assert_eq!(coerce_integer(&RawValue::text("-1")), NumericInput::Value(-1));
        assert_eq!(
            coerce_integer(&RawValue::text("1.5")),
            NumericInput::Malformed("1.5".to_string())
        );
        assert_eq!(
            coerce_integer(&RawValue::text("ten")),
            NumericInput::Malformed("ten".to_string())
        );
    }

    #[test]
    fn decimals_reject_non_finite_values() {
        assert_eq!(coerce_decimal(&RawValue::text("320.5")), NumericInput::Value(320.5));
        assert_eq!(coerce_decimal(&RawValue::text("")), NumericInput::Empty);
        assert!(matches!(
            coerce_decimal(&RawValue::text("inf")),
            NumericInput::Malformed(_)
        ));
        assert!(matches!(
            coerce_decimal(&RawValue::text("NaN")),
            NumericInput::Malformed(_)
        ));
    }

    #[test]
    fn flags_accept_checkbox_state_and_common_text() {
        assert!(coerce_flag(&RawValue::Checked(true)));
        assert!(!coerce_flag(&RawValue::Checked(false)));
        assert!(coerce_flag(&RawValue::text("on")));
        assert!(coerce_flag(&RawValue::text("TRUE")));
        assert!(!coerce_flag(&RawValue::text("")));
    }

    #[test]
    fn choices_unknown_text_becomes_unset() {
        assert_eq!(
            coerce_screen_type(&RawValue::text("OUTDOOR")),
            Some(ScreenType::Outdoor)
        );
        assert_eq!(coerce_screen_type(&RawValue::text("")), None);
        assert_eq!(
            coerce_solution_type(&RawValue::text("CABINET_SOLUTION")),
            Some(SolutionType::CabinetSolution)
        );
        assert_eq!(coerce_solution_type(&RawValue::text("hybrid")), None);
    }

    #[test]
    fn files_only_from_file_input() {
        let file = Attachment::new("receiver.rcfg", vec![0u8; 4]);
        assert_eq!(coerce_file(&RawValue::File(file.clone())), Some(file));
        assert_eq!(coerce_file(&RawValue::text("receiver.rcfg")), None);
    }
}
