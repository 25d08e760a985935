//! Reading posted form fields into journey answers

use crate::definition::{FieldDefinition, FieldType, PageDefinition};
use grants_state::{parse_quantity, FormState};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

static LAND_PARCEL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9]+-[A-Za-z0-9]+$").expect("land parcel pattern is valid")
});

/// A field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name, or dotted path for action details
    pub field: String,
    /// Message shown next to the field
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Answers read from one page submission
///
/// Holds one entry per page field; `None` clears a previous answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageAnswers(Vec<(String, Option<Value>)>);

impl PageAnswers {
    /// Answer for a field
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(field, _)| field == name)
            .and_then(|(_, value)| value.as_ref())
    }

    /// Replace the page's answers in journey state
    pub fn apply_to(self, state: &mut FormState) {
        for (name, value) in self.0 {
            match value {
                Some(value) => {
                    state.insert(name, value);
                }
                None => {
                    state.remove(&name);
                }
            }
        }
    }
}

/// Read and validate the posted values for a page's fields
pub fn collect_answers(
    page: &PageDefinition,
    posted: &[(String, String)],
) -> Result<PageAnswers, Vec<FieldError>> {
    let mut answers = Vec::with_capacity(page.fields.len());
    let mut errors = Vec::new();

    for field in &page.fields {
        match read_field(field, posted) {
            Ok(None) if field.required => errors.push(FieldError::new(
                &field.name,
                required_message(field),
            )),
            Ok(value) => answers.push((field.name.clone(), value)),
            Err(mut field_errors) => errors.append(&mut field_errors),
        }
    }

    if errors.is_empty() {
        Ok(PageAnswers(answers))
    } else {
        Err(errors)
    }
}

fn required_message(field: &FieldDefinition) -> String {
    match field.field_type {
        FieldType::YesNo => format!("Select yes or no: {}", field.label),
        FieldType::Actions => "Select at least one action".to_string(),
        FieldType::Text | FieldType::Number | FieldType::LandParcel => {
            format!("Enter {}", field.label.to_lowercase())
        }
    }
}

fn posted_value<'a>(posted: &'a [(String, String)], name: &str) -> Option<&'a str> {
    posted
        .iter()
        .rev()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn read_field(
    field: &FieldDefinition,
    posted: &[(String, String)],
) -> Result<Option<Value>, Vec<FieldError>> {
    if field.field_type == FieldType::Actions {
        return read_actions(field, posted);
    }
    let Some(raw) = posted_value(posted, &field.name) else {
        return Ok(None);
    };

    let value = match field.field_type {
        FieldType::Text => Value::String(raw.to_string()),
        FieldType::Number => {
            let number = raw
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .and_then(serde_json::Number::from_f64)
                .ok_or_else(|| {
                    vec![FieldError::new(&field.name, format!("{} must be a number", field.label))]
                })?;
            Value::Number(number)
        }
        FieldType::LandParcel if LAND_PARCEL_PATTERN.is_match(raw) => {
            Value::String(raw.to_string())
        }
        FieldType::LandParcel => {
            return Err(vec![FieldError::new(
                &field.name,
                format!("{} must look like SX0679-9238", field.label),
            )]);
        }
        FieldType::YesNo => match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" => Value::Bool(true),
            "false" | "no" => Value::Bool(false),
            _ => {
                return Err(vec![FieldError::new(&field.name, required_message(field))]);
            }
        },
        FieldType::Actions => return read_actions(field, posted),
    };
    Ok(Some(value))
}

/// Build the actions object from checkbox codes and dotted detail inputs
///
/// `actionsObj=CMOR1` selects a code; `actionsObj.CMOR1.value=4.5` and
/// `actionsObj.CMOR1.unit=ha` fill its details. When any code is selected,
/// details for unselected codes are dropped.
fn read_actions(
    field: &FieldDefinition,
    posted: &[(String, String)],
) -> Result<Option<Value>, Vec<FieldError>> {
    let prefix = format!("{}.", field.name);
    let mut selected: Vec<&str> = Vec::new();
    let mut details = FormState::new();
    let mut errors = Vec::new();

    for (key, value) in posted {
        let value = value.trim();
        if key == &field.name {
            if !value.is_empty() && !value.contains('.') && !selected.contains(&value) {
                selected.push(value);
            }
        } else if let Some(path) = key.strip_prefix(&prefix) {
            if value.is_empty() {
                continue;
            }
            if let Err(err) = details.set_answer(path, Value::String(value.to_string())) {
                errors.push(FieldError::new(key, err.to_string()));
            }
        }
    }

    let mut actions = Map::new();
    if selected.is_empty() {
        for (code, detail) in details.iter() {
            actions.insert(code.clone(), detail.clone());
        }
    } else {
        for code in selected {
            let detail = details
                .get(code)
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            actions.insert(code.to_string(), detail);
        }
    }

    for (code, detail) in &actions {
        if !detail.is_object() {
            errors.push(FieldError::new(
                format!("{prefix}{code}"),
                format!("Enter details for {code}"),
            ));
            continue;
        }
        if let Some(quantity) = detail.get("value") {
            if parse_quantity(quantity).is_none() {
                errors.push(FieldError::new(
                    format!("{prefix}{code}.value"),
                    format!("Enter a number for {code}"),
                ));
            }
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok((!actions.is_empty()).then_some(Value::Object(actions)))
}
