use log::info;
use sqlx::{Pool, Sqlite};

use crate::{
    authentication::{
        cryptography::{check_password, hash_password},
        jwt::SessionKey,
    },
    error::{unique_or_internal, ApiError, QueryError},
    form::{Form, FormData, TextRules, WriteMode},
    schema::{Id, User},
    EMAIL_MAX_LENGTH, MSG_BAD_CREDENTIALS, MSG_INVALID_TOKEN, NAME_MAX_LENGTH,
    PASSWORD_MIN_LENGTH,
};

const MSG_INVALID_EMAIL: &str = "Enter a valid email address.";
const MSG_EMAIL_TAKEN: &str = "user with this email already exists.";

const EMAIL: TextRules = TextRules::new(true).max_length(EMAIL_MAX_LENGTH);
const PASSWORD: TextRules = TextRules::new(true)
    .keep_whitespace()
    .min_length(PASSWORD_MIN_LENGTH);

/// Lower-cases the domain part of an address, leaving the local part as
/// typed.
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn read_email(form: &mut Form, required: bool) -> Option<String> {
    let rules = TextRules { required, ..EMAIL };
    let email = form.get_str("email", rules)?;

    if is_plausible_email(&email) {
        Some(normalize_email(&email))
    } else {
        form.add_error("email", MSG_INVALID_EMAIL);
        None
    }
}

pub async fn get_user_by_email(
    email: &str,
    pool: &Pool<Sqlite>,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Looks up the account behind a session. A token whose account is gone is
/// no longer a valid credential.
pub async fn get_user_by_id(user_id: Id, pool: &Pool<Sqlite>) -> Result<User, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    row.ok_or(ApiError::Unauthenticated(MSG_INVALID_TOKEN))
}

/// Registers a user from `{email, password, name}`. The password is stored
/// as an argon2 hash.
pub async fn register_user(data: FormData, pool: &Pool<Sqlite>) -> Result<User, ApiError> {
    let mut form = Form::from_data(data);
    let email = read_email(&mut form, true);
    let password = form.get_str("password", PASSWORD);
    let name = form.get_str("name", TextRules::new(true).max_length(NAME_MAX_LENGTH));
    form.finish()?;

    let (Some(email), Some(password), Some(name)) = (email, password, name) else {
        return Err(ApiError::Internal(String::from("Incomplete registration form")));
    };

    let password = hash_password(&password)?;

    let row: Option<User> = sqlx::query_as(
        "
        INSERT INTO users (email, name, password)
        VALUES ($1, $2, $3)
        ON CONFLICT DO NOTHING RETURNING *;
    ",
    )
    .bind(&email)
    .bind(&name)
    .bind(password)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    let user = row.ok_or_else(|| ApiError::field("email", MSG_EMAIL_TAKEN))?;

    info!("Registered user {} <{}>", user.id, user.email);
    Ok(user)
}

/// Checks `{email, password}` and issues a session token.
pub async fn login_user(
    data: FormData,
    keys: &SessionKey,
    pool: &Pool<Sqlite>,
) -> Result<String, ApiError> {
    let mut form = Form::from_data(data);
    let email = form.get_str("email", EMAIL);
    let password = form.get_str("password", TextRules::new(true).keep_whitespace());
    form.finish()?;

    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::non_field(MSG_BAD_CREDENTIALS));
    };

    let user = get_user_by_email(&normalize_email(&email), pool).await?;
    let stored = user.as_ref().map(|user| user.password.as_str());

    match user {
        Some(ref user) if check_password(&password, stored) => keys.generate_jwt_session(user),
        _ => Err(ApiError::non_field(MSG_BAD_CREDENTIALS)),
    }
}

/// Updates the requester's own account. `PUT` needs `email` and `name`,
/// the password is always optional and re-hashed when given.
pub async fn update_user(
    user_id: Id,
    data: FormData,
    mode: WriteMode,
    pool: &Pool<Sqlite>,
) -> Result<User, ApiError> {
    let current = get_user_by_id(user_id, pool).await?;

    let required = mode.requires_all();
    let mut form = Form::from_data(data);
    let email = read_email(&mut form, required);
    let name = form.get_str(
        "name",
        TextRules::new(required).max_length(NAME_MAX_LENGTH),
    );
    let password = form.get_str("password", TextRules { required: false, ..PASSWORD });
    form.finish()?;

    let password = match password {
        Some(password) => hash_password(&password)?,
        None => current.password,
    };

    let row: Option<User> = sqlx::query_as(
        "UPDATE users SET email = $1, name = $2, password = $3 WHERE id = $4 RETURNING *",
    )
    .bind(email.unwrap_or(current.email))
    .bind(name.unwrap_or(current.name))
    .bind(password)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| unique_or_internal(e, "email", MSG_EMAIL_TAKEN))?;

    row.ok_or(ApiError::Unauthenticated(MSG_INVALID_TOKEN))
}
