use log::{debug, info};
use rust_decimal::Decimal;
use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};

use super::attributes::{list_recipe_attributes, replace_recipe_attributes};
use crate::{
    error::{ApiError, QueryError},
    filter::RecipeFilter,
    form::{DecimalRules, Form, FormData, TextRules, WriteMode},
    schema::{AttrKind, Id, Recipe, RecipeDetail, RecipeRow},
    LINK_MAX_LENGTH, MSG_REQUIRED, PRICE_DECIMAL_PLACES, PRICE_MAX_DIGITS, TITLE_MAX_LENGTH,
};

/// A validated recipe write. `None` means the field was not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipePayload {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
}

impl RecipePayload {
    /// Reads every recipe field at once so the caller sees all problems
    /// together. The owner is never read from the payload.
    pub fn from_form(data: FormData, mode: WriteMode) -> Result<Self, ApiError> {
        let required = mode.requires_all();
        let mut form = Form::from_data(data);

        let title = form.get_str(
            "title",
            TextRules::new(required).max_length(TITLE_MAX_LENGTH),
        );
        let time_minutes = form.get_integer("time_minutes", required, Some(0));
        let price = form.get_decimal(
            "price",
            DecimalRules {
                required,
                max_digits: PRICE_MAX_DIGITS,
                decimal_places: PRICE_DECIMAL_PLACES,
                allow_negative: false,
            },
        );
        let description = form.get_str("description", TextRules::new(false).allow_blank());
        let link = form.get_str(
            "link",
            TextRules::new(false)
                .allow_blank()
                .max_length(LINK_MAX_LENGTH),
        );
        let tags = form.get_names(AttrKind::Tag.plural());
        let ingredients = form.get_names(AttrKind::Ingredient.plural());

        form.finish()?;

        // Create and full update write every column.
        let (description, link) = match mode {
            WriteMode::Partial => (description, link),
            WriteMode::Create | WriteMode::Replace => (
                Some(description.unwrap_or_default()),
                Some(link.unwrap_or_default()),
            ),
        };

        Ok(Self {
            title,
            time_minutes,
            price,
            description,
            link,
            tags,
            ingredients,
        })
    }

    fn attributes(&self, kind: AttrKind) -> Option<&[String]> {
        match kind {
            AttrKind::Tag => self.tags.as_deref(),
            AttrKind::Ingredient => self.ingredients.as_deref(),
        }
    }
}

fn required<T>(value: Option<T>, key: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::field(key, MSG_REQUIRED))
}

/// Lists the owner's recipes, newest first, optionally narrowed to those
/// linked to any of the given tags and any of the given ingredients.
pub async fn list_recipes(
    user_id: Id,
    filter: &RecipeFilter,
    pool: &Pool<Sqlite>,
) -> Result<Vec<Recipe>, ApiError> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT r.* FROM recipes r WHERE r.user_id = ");
    query.push_bind(user_id);

    for (kind, ids) in [
        (AttrKind::Tag, &filter.tags),
        (AttrKind::Ingredient, &filter.ingredients),
    ] {
        let Some(ids) = ids else {
            continue;
        };

        query.push(format!(
            " AND r.id IN (SELECT recipe_id FROM {} WHERE {} IN (",
            kind.link_table(),
            kind.link_column()
        ));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated("))");
    }

    query.push(" ORDER BY r.id DESC");

    let rows: Vec<RecipeRow> = query
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    let recipes = rows
        .into_iter()
        .map(Recipe::try_from)
        .collect::<Result<Vec<Recipe>, QueryError>>()?;

    if !filter.is_empty() {
        debug!("Filtered recipes of user {user_id}: {} match {filter:?}", recipes.len());
    }

    Ok(recipes)
}

async fn fetch_recipe_row(
    conn: &mut SqliteConnection,
    user_id: Id,
    id: Id,
) -> Result<RecipeRow, ApiError> {
    let row: Option<RecipeRow> =
        sqlx::query_as("SELECT * FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(QueryError::from)?;

    row.ok_or(ApiError::NotFound)
}

/// First statement of a write transaction on an existing recipe. Being a
/// write, it takes the database write lock up front, so concurrent writers
/// queue on the busy timeout instead of failing a read-to-write upgrade.
async fn lock_recipe_row(
    conn: &mut SqliteConnection,
    user_id: Id,
    id: Id,
) -> Result<RecipeRow, ApiError> {
    let row: Option<RecipeRow> = sqlx::query_as(
        "UPDATE recipes SET title = title WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(QueryError::from)?;

    row.ok_or(ApiError::NotFound)
}

async fn load_detail(conn: &mut SqliteConnection, row: RecipeRow) -> Result<RecipeDetail, ApiError> {
    let recipe = Recipe::try_from(row)?;
    let tags = list_recipe_attributes(AttrKind::Tag, conn, recipe.id).await?;
    let ingredients = list_recipe_attributes(AttrKind::Ingredient, conn, recipe.id).await?;

    Ok(RecipeDetail {
        recipe,
        tags,
        ingredients,
    })
}

async fn replace_attributes(
    conn: &mut SqliteConnection,
    payload: &RecipePayload,
    recipe_id: Id,
    user_id: Id,
) -> Result<(), ApiError> {
    for kind in [AttrKind::Tag, AttrKind::Ingredient] {
        if let Some(names) = payload.attributes(kind) {
            replace_recipe_attributes(kind, conn, recipe_id, user_id, names).await?;
        }
    }

    Ok(())
}

/// Fetches one owned recipe. Someone else's recipe is reported as missing.
pub async fn get_recipe(user_id: Id, id: Id, pool: &Pool<Sqlite>) -> Result<Recipe, ApiError> {
    let mut conn = pool.acquire().await.map_err(QueryError::from)?;
    let row = fetch_recipe_row(&mut conn, user_id, id).await?;

    Ok(Recipe::try_from(row)?)
}

pub async fn get_recipe_detail(
    user_id: Id,
    id: Id,
    pool: &Pool<Sqlite>,
) -> Result<RecipeDetail, ApiError> {
    let mut conn = pool.acquire().await.map_err(QueryError::from)?;
    let row = fetch_recipe_row(&mut conn, user_id, id).await?;

    load_detail(&mut conn, row).await
}

pub async fn create_recipe(
    user_id: Id,
    data: FormData,
    pool: &Pool<Sqlite>,
) -> Result<RecipeDetail, ApiError> {
    let payload = RecipePayload::from_form(data, WriteMode::Create)?;
    let title = required(payload.title.clone(), "title")?;
    let time_minutes = required(payload.time_minutes, "time_minutes")?;
    let price = required(payload.price, "price")?;

    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    let row: RecipeRow = sqlx::query_as(
        "
        INSERT INTO recipes (user_id, title, time_minutes, price, description, link)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *;
    ",
    )
    .bind(user_id)
    .bind(title)
    .bind(time_minutes)
    .bind(price.to_string())
    .bind(payload.description.clone().unwrap_or_default())
    .bind(payload.link.clone().unwrap_or_default())
    .fetch_one(&mut *tx)
    .await
    .map_err(QueryError::from)?;

    replace_attributes(&mut tx, &payload, row.id, user_id).await?;
    let detail = load_detail(&mut tx, row).await?;

    tx.commit().await.map_err(QueryError::from)?;

    info!("User {user_id} created recipe {}", detail.recipe.id);
    Ok(detail)
}

/// Applies a full or partial update to an owned recipe. The row is locked
/// and its ownership checked before validation, and the scalar write and
/// association swaps commit together or not at all. Concurrent updates of
/// one recipe apply in lock order, the last one wins.
pub async fn update_recipe(
    user_id: Id,
    id: Id,
    data: FormData,
    mode: WriteMode,
    pool: &Pool<Sqlite>,
) -> Result<RecipeDetail, ApiError> {
    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    let current = lock_recipe_row(&mut tx, user_id, id).await?;
    let payload = RecipePayload::from_form(data, mode)?;

    let price = match payload.price {
        Some(price) => price.to_string(),
        None => current.price,
    };

    let row: RecipeRow = sqlx::query_as(
        "
        UPDATE recipes
        SET title = $1, time_minutes = $2, price = $3, description = $4, link = $5
        WHERE id = $6 AND user_id = $7
        RETURNING *;
    ",
    )
    .bind(payload.title.clone().unwrap_or(current.title))
    .bind(payload.time_minutes.unwrap_or(current.time_minutes))
    .bind(price)
    .bind(payload.description.clone().unwrap_or(current.description))
    .bind(payload.link.clone().unwrap_or(current.link))
    .bind(id)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(QueryError::from)?;

    replace_attributes(&mut tx, &payload, id, user_id).await?;
    let detail = load_detail(&mut tx, row).await?;

    tx.commit().await.map_err(QueryError::from)?;

    debug!("User {user_id} updated recipe {id} ({mode:?})");
    Ok(detail)
}

/// Deletes an owned recipe and hands back the stored image it referenced,
/// so the caller can clean the file up.
pub async fn delete_recipe(
    user_id: Id,
    id: Id,
    pool: &Pool<Sqlite>,
) -> Result<Option<String>, ApiError> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("DELETE FROM recipes WHERE id = $1 AND user_id = $2 RETURNING image")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    let (image,) = row.ok_or(ApiError::NotFound)?;

    info!("User {user_id} deleted recipe {id}");
    Ok(image)
}

/// Points an owned recipe at a newly stored image. Returns the recipe and
/// the image it referenced before.
pub async fn set_recipe_image(
    user_id: Id,
    id: Id,
    image: &str,
    pool: &Pool<Sqlite>,
) -> Result<(Recipe, Option<String>), ApiError> {
    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    let previous = lock_recipe_row(&mut tx, user_id, id).await?.image;

    let row: RecipeRow =
        sqlx::query_as("UPDATE recipes SET image = $1 WHERE id = $2 AND user_id = $3 RETURNING *")
            .bind(image)
            .bind(id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(QueryError::from)?;

    tx.commit().await.map_err(QueryError::from)?;

    Ok((Recipe::try_from(row)?, previous))
}
