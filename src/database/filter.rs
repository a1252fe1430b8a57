use std::collections::HashMap;

use super::{
    error::{ApiError, FieldErrors},
    schema::Id,
};
use crate::{FLAG_VALUES, MSG_INVALID_BOOLEAN, MSG_INVALID_ID_LIST};

pub type QueryData = HashMap<String, String>;

/// Interprets a query-string toggle. Integers are true unless zero, words
/// come from a fixed table, anything else is an error.
pub fn parse_flag(raw: &str) -> Option<bool> {
    let raw = raw.trim().to_ascii_lowercase();

    if let Ok(number) = raw.parse::<i64>() {
        return Some(number != 0);
    }

    FLAG_VALUES
        .iter()
        .find_map(|(word, value)| (*word == raw).then_some(*value))
}

fn parse_ids(raw: &str) -> Option<Vec<Id>> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| id.parse().ok())
        .collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AttrFilter {
    pub assigned_only: bool,
}

impl AttrFilter {
    pub fn from_query(query: &QueryData) -> Result<Self, ApiError> {
        let assigned_only = match query.get("assigned_only") {
            None => false,
            Some(raw) => {
                parse_flag(raw).ok_or_else(|| ApiError::field("assigned_only", MSG_INVALID_BOOLEAN))?
            }
        };

        Ok(Self { assigned_only })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Option<Vec<Id>>,
    pub ingredients: Option<Vec<Id>>,
}

impl RecipeFilter {
    pub fn from_query(query: &QueryData) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let mut read = |key: &str| -> Option<Vec<Id>> {
            let raw = query.get(key)?;
            match parse_ids(raw) {
                Some(ids) if ids.is_empty() => None,
                Some(ids) => Some(ids),
                None => {
                    errors.insert(key.to_string(), vec![MSG_INVALID_ID_LIST.to_string()]);
                    None
                }
            }
        };

        let tags = read("tags");
        let ingredients = read("ingredients");

        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        Ok(Self { tags, ingredients })
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_none() && self.ingredients.is_none()
    }
}
