use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use super::error::QueryError;

pub type Id = i64;

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub name: String,
    pub password: String,
}

/// A tag or an ingredient; both share this shape.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeAttr {
    pub id: Id,
    pub name: String,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeRow {
    pub id: Id,
    pub user_id: Id,
    pub title: String,
    pub time_minutes: i64,
    pub price: String,
    pub description: String,
    pub link: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: Id,
    pub user_id: Id,
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    pub description: String,
    pub link: String,
    pub image: Option<String>,
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = QueryError;

    fn try_from(row: RecipeRow) -> Result<Self, Self::Error> {
        let price = Decimal::from_str(&row.price).map_err(|e| {
            QueryError::new(format!("Stored price of recipe {} is invalid: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            time_minutes: row.time_minutes,
            price,
            description: row.description,
            link: row.link,
            image: row.image,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub tags: Vec<RecipeAttr>,
    pub ingredients: Vec<RecipeAttr>,
}

/// Which attribute table an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttrKind {
    Tag,
    Ingredient,
}

impl AttrKind {
    pub fn table(self) -> &'static str {
        match self {
            AttrKind::Tag => "tags",
            AttrKind::Ingredient => "ingredients",
        }
    }

    pub fn link_table(self) -> &'static str {
        match self {
            AttrKind::Tag => "recipe_tags",
            AttrKind::Ingredient => "recipe_ingredients",
        }
    }

    pub fn link_column(self) -> &'static str {
        match self {
            AttrKind::Tag => "tag_id",
            AttrKind::Ingredient => "ingredient_id",
        }
    }

    /// Singular name, used in messages.
    pub fn label(self) -> &'static str {
        match self {
            AttrKind::Tag => "tag",
            AttrKind::Ingredient => "ingredient",
        }
    }

    /// Payload key on the recipe side and URL segment on the API side.
    pub fn plural(self) -> &'static str {
        self.table()
    }
}
