use log::error;
use serde::Serialize;
use warp::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    reply::{self, Response},
    Reply,
};

use crate::{
    error::ApiError,
    media::media_url,
    schema::{Id, Recipe, RecipeAttr, RecipeDetail, User},
};

#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: Id,
    pub title: String,
    pub time_minutes: i64,
    pub price: String,
    pub link: String,
    pub image: Option<String>,
}

impl RecipeSummary {
    pub fn new(recipe: Recipe, media_base: &str) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price.to_string(),
            link: recipe.link,
            image: recipe.image.map(|image| media_url(media_base, &image)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeBody {
    #[serde(flatten)]
    pub summary: RecipeSummary,
    pub description: String,
    pub tags: Vec<RecipeAttr>,
    pub ingredients: Vec<RecipeAttr>,
}

impl RecipeBody {
    pub fn new(detail: RecipeDetail, media_base: &str) -> Self {
        let description = detail.recipe.description.clone();

        Self {
            summary: RecipeSummary::new(detail.recipe, media_base),
            description,
            tags: detail.tags,
            ingredients: detail.ingredients,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeImageBody {
    pub id: Id,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserBody {
    pub email: String,
    pub name: String,
}

impl From<User> for UserBody {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenBody {
    pub token: String,
}

pub fn json_response<T: Serialize>(body: &T, status: StatusCode) -> Response {
    reply::with_status(reply::json(body), status).into_response()
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Renders an error, logging the cause of internal ones.
pub fn error_response(err: &ApiError) -> Response {
    if let ApiError::Internal(info) = err {
        error!("Request failed: {info}");
    }

    let mut response = json_response(&err.body(), err.status());

    if let ApiError::Unauthenticated(_) = err {
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Token"));
    }

    response
}

/// Renders a handler outcome. Failures become error responses here instead
/// of rejections, so no other route gets to run after a handler has.
pub fn respond(result: Result<Response, ApiError>) -> Result<Response, warp::Rejection> {
    Ok(result.unwrap_or_else(|err| error_response(&err)))
}
