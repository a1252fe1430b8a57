//! Tags and ingredients. Both live in tables of the same shape, so every
//! operation takes the [`AttrKind`] it targets.

use log::debug;
use sqlx::{Pool, Sqlite, SqliteConnection};

use crate::{
    error::{unique_or_internal, ApiError, QueryError},
    filter::AttrFilter,
    form::{Form, FormData, TextRules, WriteMode},
    schema::{AttrKind, Id, RecipeAttr},
    NAME_MAX_LENGTH,
};

pub async fn list_attributes(
    kind: AttrKind,
    user_id: Id,
    filter: AttrFilter,
    pool: &Pool<Sqlite>,
) -> Result<Vec<RecipeAttr>, ApiError> {
    let table = kind.table();

    let query = if filter.assigned_only {
        format!(
            "SELECT DISTINCT a.id, a.name FROM {table} a
            JOIN {link} l ON l.{column} = a.id
            JOIN recipes r ON r.id = l.recipe_id
            WHERE a.user_id = $1 AND r.user_id = $1
            ORDER BY a.name DESC, a.id DESC",
            link = kind.link_table(),
            column = kind.link_column(),
        )
    } else {
        format!("SELECT id, name FROM {table} WHERE user_id = $1 ORDER BY name DESC, id DESC")
    };

    let list: Vec<RecipeAttr> = sqlx::query_as(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(list)
}

pub async fn get_attribute(
    kind: AttrKind,
    user_id: Id,
    id: Id,
    pool: &Pool<Sqlite>,
) -> Result<RecipeAttr, ApiError> {
    let row: Option<RecipeAttr> = sqlx::query_as(&format!(
        "SELECT id, name FROM {} WHERE id = $1 AND user_id = $2",
        kind.table()
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    row.ok_or(ApiError::NotFound)
}

/// Renames an owned tag or ingredient. A partial update without `name`
/// leaves the record as it is.
pub async fn update_attribute(
    kind: AttrKind,
    user_id: Id,
    id: Id,
    data: FormData,
    mode: WriteMode,
    pool: &Pool<Sqlite>,
) -> Result<RecipeAttr, ApiError> {
    let current = get_attribute(kind, user_id, id, pool).await?;

    let mut form = Form::from_data(data);
    let name = form.get_str(
        "name",
        TextRules::new(mode.requires_all()).max_length(NAME_MAX_LENGTH),
    );
    form.finish()?;

    let Some(name) = name else {
        return Ok(current);
    };

    let row: Option<RecipeAttr> = sqlx::query_as(&format!(
        "UPDATE {} SET name = $1 WHERE id = $2 AND user_id = $3 RETURNING id, name",
        kind.table()
    ))
    .bind(&name)
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        let message = match kind {
            AttrKind::Tag => "You already have a tag with this name.",
            AttrKind::Ingredient => "You already have an ingredient with this name.",
        };
        unique_or_internal(e, "name", message)
    })?;

    row.ok_or(ApiError::NotFound)
}

/// Removes an owned tag or ingredient. Its links to recipes go with it
/// through the foreign key cascade, the recipes stay.
pub async fn delete_attribute(
    kind: AttrKind,
    user_id: Id,
    id: Id,
    pool: &Pool<Sqlite>,
) -> Result<(), ApiError> {
    let query = sqlx::query(&format!(
        "DELETE FROM {} WHERE id = $1 AND user_id = $2",
        kind.table()
    ))
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }

    debug!("Deleted {} {id} of user {user_id}", kind.label());
    Ok(())
}

/// Returns the owner's record with exactly this name, inserting it first
/// when there is none.
pub async fn get_or_create_attribute(
    kind: AttrKind,
    conn: &mut SqliteConnection,
    user_id: Id,
    name: &str,
) -> Result<RecipeAttr, ApiError> {
    let table = kind.table();

    let query = sqlx::query(&format!(
        "INSERT INTO {table} (user_id, name) VALUES ($1, $2)
        ON CONFLICT (user_id, name) DO NOTHING"
    ))
    .bind(user_id)
    .bind(name)
    .execute(&mut *conn)
    .await
    .map_err(QueryError::from)?;

    if query.rows_affected() > 0 {
        debug!("Created {} '{name}' for user {user_id}", kind.label());
    }

    let row: RecipeAttr = sqlx::query_as(&format!(
        "SELECT id, name FROM {table} WHERE user_id = $1 AND name = $2"
    ))
    .bind(user_id)
    .bind(name)
    .fetch_one(&mut *conn)
    .await
    .map_err(QueryError::from)?;

    Ok(row)
}

/// Swaps the recipe's whole association set for the named records.
/// Must run inside the transaction that owns the recipe write.
pub async fn replace_recipe_attributes(
    kind: AttrKind,
    conn: &mut SqliteConnection,
    recipe_id: Id,
    user_id: Id,
    names: &[String],
) -> Result<(), ApiError> {
    let link = kind.link_table();
    let column = kind.link_column();

    sqlx::query(&format!("DELETE FROM {link} WHERE recipe_id = $1"))
        .bind(recipe_id)
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    for name in names {
        let attr = get_or_create_attribute(kind, conn, user_id, name).await?;

        sqlx::query(&format!(
            "INSERT INTO {link} (recipe_id, {column}) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        ))
        .bind(recipe_id)
        .bind(attr.id)
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;
    }

    Ok(())
}

pub async fn list_recipe_attributes(
    kind: AttrKind,
    conn: &mut SqliteConnection,
    recipe_id: Id,
) -> Result<Vec<RecipeAttr>, ApiError> {
    let list: Vec<RecipeAttr> = sqlx::query_as(&format!(
        "SELECT a.id, a.name FROM {table} a
        JOIN {link} l ON l.{column} = a.id
        WHERE l.recipe_id = $1
        ORDER BY a.id",
        table = kind.table(),
        link = kind.link_table(),
        column = kind.link_column(),
    ))
    .bind(recipe_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(QueryError::from)?;

    Ok(list)
}
