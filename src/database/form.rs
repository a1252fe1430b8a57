use std::{collections::HashMap, str::FromStr};

use rust_decimal::Decimal;
use serde_json::Value;

use super::error::{ApiError, FieldErrors};
use crate::{
    MSG_BLANK, MSG_INVALID_INTEGER, MSG_INVALID_NUMBER, MSG_NOT_A_STRING, MSG_NOT_NEGATIVE,
    MSG_NULL, MSG_REQUIRED, NAME_MAX_LENGTH,
};

pub type FormData = HashMap<String, Value>;

/// How much of a resource a write replaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Replace,
    Partial,
}

impl WriteMode {
    /// Whether fields the model requires must be present in the payload.
    pub fn requires_all(self) -> bool {
        !matches!(self, WriteMode::Partial)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TextRules {
    pub required: bool,
    pub allow_blank: bool,
    pub trim: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl TextRules {
    pub const fn new(required: bool) -> Self {
        Self {
            required,
            allow_blank: false,
            trim: true,
            min_length: None,
            max_length: None,
        }
    }

    pub const fn allow_blank(mut self) -> Self {
        self.allow_blank = true;
        self
    }

    pub const fn keep_whitespace(mut self) -> Self {
        self.trim = false;
        self
    }

    pub const fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    pub const fn max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length);
        self
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DecimalRules {
    pub required: bool,
    pub max_digits: u32,
    pub decimal_places: u32,
    pub allow_negative: bool,
}

/// Reads a JSON object payload field by field, collecting every problem
/// before the request is rejected.
pub struct Form {
    inner: FormData,
    errors: FieldErrors,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self {
            inner: data,
            errors: FieldErrors::new(),
        }
    }

    pub fn add_error(&mut self, key: &str, message: impl Into<String>) {
        self.errors
            .entry(key.to_string())
            .or_default()
            .push(message.into());
    }

    /// Fails with every collected field error, if there were any.
    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }

    fn take(&mut self, key: &str, required: bool) -> Option<Value> {
        match self.inner.get(key).cloned() {
            None => {
                if required {
                    self.add_error(key, MSG_REQUIRED);
                }
                None
            }
            Some(Value::Null) => {
                self.add_error(key, MSG_NULL);
                None
            }
            Some(value) => Some(value),
        }
    }

    pub fn get_str(&mut self, key: &str, rules: TextRules) -> Option<String> {
        let value = self.take(key, rules.required)?;
        match text(&value, rules) {
            Ok(text) => Some(text),
            Err(message) => {
                self.add_error(key, message);
                None
            }
        }
    }

    pub fn get_integer(&mut self, key: &str, required: bool, min: Option<i64>) -> Option<i64> {
        let value = self.take(key, required)?;
        let number = match integer(&value) {
            Ok(number) => number,
            Err(message) => {
                self.add_error(key, message);
                return None;
            }
        };

        match min {
            Some(min) if number < min => {
                self.add_error(
                    key,
                    format!("Ensure this value is greater than or equal to {min}."),
                );
                None
            }
            _ => Some(number),
        }
    }

    pub fn get_decimal(&mut self, key: &str, rules: DecimalRules) -> Option<Decimal> {
        let value = self.take(key, rules.required)?;
        match decimal(&value, rules) {
            Ok(number) => Some(number),
            Err(message) => {
                self.add_error(key, message);
                None
            }
        }
    }

    /// Reads a list of `{"name": ...}` objects. Item errors are keyed
    /// `key[index].name`.
    pub fn get_names(&mut self, key: &str) -> Option<Vec<String>> {
        let value = self.take(key, false)?;
        let items = match value {
            Value::Array(items) => items,
            other => {
                self.add_error(
                    key,
                    format!(
                        "Expected a list of items but got type \"{}\".",
                        type_name(&other)
                    ),
                );
                return None;
            }
        };

        let rules = TextRules::new(true).max_length(NAME_MAX_LENGTH);
        let mut names = Vec::with_capacity(items.len());
        let mut valid = true;

        for (index, item) in items.iter().enumerate() {
            let field = format!("{key}[{index}].name");
            let name = match item {
                Value::Object(map) => match map.get("name") {
                    None => Err(MSG_REQUIRED.to_string()),
                    Some(Value::Null) => Err(MSG_NULL.to_string()),
                    Some(name) => text(name, rules),
                },
                other => {
                    valid = false;
                    self.add_error(
                        &format!("{key}[{index}]"),
                        format!(
                            "Invalid data. Expected a dictionary, but got {}.",
                            type_name(other)
                        ),
                    );
                    continue;
                }
            };

            match name {
                Ok(name) => names.push(name),
                Err(message) => {
                    valid = false;
                    self.add_error(&field, message);
                }
            }
        }

        valid.then_some(names)
    }
}

fn text(value: &Value, rules: TextRules) -> Result<String, String> {
    let text = match value {
        Value::String(s) if rules.trim => s.trim().to_string(),
        Value::String(s) => s.to_owned(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return Err(MSG_NOT_A_STRING.to_string()),
    };

    if text.is_empty() {
        return if rules.allow_blank {
            Ok(text)
        } else {
            Err(MSG_BLANK.to_string())
        };
    }

    let length = text.chars().count();
    if let Some(max) = rules.max_length {
        if length > max {
            return Err(format!(
                "Ensure this field has no more than {max} characters."
            ));
        }
    }
    if let Some(min) = rules.min_length {
        if length < min {
            return Err(format!("Ensure this field has at least {min} characters."));
        }
    }

    Ok(text)
}

fn integer(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .ok_or_else(|| MSG_INVALID_INTEGER.to_string()),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_e| MSG_INVALID_INTEGER.to_string()),
        _ => Err(MSG_INVALID_INTEGER.to_string()),
    }
}

fn decimal(value: &Value, rules: DecimalRules) -> Result<Decimal, String> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(MSG_INVALID_NUMBER.to_string()),
    };

    let number = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_e| MSG_INVALID_NUMBER.to_string())?;

    if !rules.allow_negative && number.is_sign_negative() && !number.is_zero() {
        return Err(MSG_NOT_NEGATIVE.to_string());
    }

    let normalized = number.normalize();
    let scale = normalized.scale();
    let digits = (normalized.mantissa().unsigned_abs().to_string().len() as u32).max(scale);
    let whole_digits = digits - scale;

    if digits > rules.max_digits {
        return Err(format!(
            "Ensure that there are no more than {} digits in total.",
            rules.max_digits
        ));
    }
    if scale > rules.decimal_places {
        return Err(format!(
            "Ensure that there are no more than {} decimal places.",
            rules.decimal_places
        ));
    }
    if whole_digits > rules.max_digits - rules.decimal_places {
        return Err(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            rules.max_digits - rules.decimal_places
        ));
    }

    let mut number = normalized;
    number.rescale(rules.decimal_places);
    Ok(number)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
