use bytes::BufMut;
use futures_util::TryStreamExt;
use warp::{http::StatusCode, multipart::FormData as MultipartForm, reply::Response, Rejection};

use crate::{
    actions::recipes as store,
    error::ApiError,
    filter::{QueryData, RecipeFilter},
    form::{FormData, WriteMode},
    jwt::SessionData,
    media::{media_url, remove_media, save_recipe_image, validate_image},
    responses::{json_response, no_content, respond, RecipeBody, RecipeImageBody, RecipeSummary},
    schema::Id,
    state::AppState,
    IMAGE_FIELD, MSG_NO_FILE,
};

pub async fn list_recipes(
    session: SessionData,
    query: QueryData,
    state: AppState,
) -> Result<Response, Rejection> {
    respond(
        async {
            let filter = RecipeFilter::from_query(&query)?;
            let recipes = store::list_recipes(session.user_id, &filter, &state.pool).await?;

            let body: Vec<RecipeSummary> = recipes
                .into_iter()
                .map(|recipe| RecipeSummary::new(recipe, &state.config.media_url))
                .collect();

            Ok::<_, ApiError>(json_response(&body, StatusCode::OK))
        }
        .await,
    )
}

pub async fn create_recipe(
    session: SessionData,
    body: FormData,
    state: AppState,
) -> Result<Response, Rejection> {
    respond(
        store::create_recipe(session.user_id, body, &state.pool)
            .await
            .map(|detail| {
                json_response(
                    &RecipeBody::new(detail, &state.config.media_url),
                    StatusCode::CREATED,
                )
            }),
    )
}

pub async fn retrieve_recipe(
    id: Id,
    session: SessionData,
    state: AppState,
) -> Result<Response, Rejection> {
    respond(
        store::get_recipe_detail(session.user_id, id, &state.pool)
            .await
            .map(|detail| {
                json_response(
                    &RecipeBody::new(detail, &state.config.media_url),
                    StatusCode::OK,
                )
            }),
    )
}

pub async fn update_recipe(
    id: Id,
    mode: WriteMode,
    session: SessionData,
    body: FormData,
    state: AppState,
) -> Result<Response, Rejection> {
    respond(
        store::update_recipe(session.user_id, id, body, mode, &state.pool)
            .await
            .map(|detail| {
                json_response(
                    &RecipeBody::new(detail, &state.config.media_url),
                    StatusCode::OK,
                )
            }),
    )
}

pub async fn delete_recipe(
    id: Id,
    session: SessionData,
    state: AppState,
) -> Result<Response, Rejection> {
    respond(
        async {
            let image = store::delete_recipe(session.user_id, id, &state.pool).await?;
            if let Some(image) = image {
                remove_media(&state.config.media_root, &image).await;
            }

            Ok::<_, ApiError>(no_content())
        }
        .await,
    )
}

fn multipart_error(e: warp::Error) -> ApiError {
    ApiError::non_field(&format!("Multipart form parse error - {e}"))
}

/// Collects the bytes of the `image` part. Other parts are skipped.
async fn read_image_part(mut form: MultipartForm) -> Result<Vec<u8>, ApiError> {
    while let Some(mut part) = form.try_next().await.map_err(multipart_error)? {
        if part.name() != IMAGE_FIELD {
            continue;
        }

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(content) = part.data().await {
            bytes.put(content.map_err(multipart_error)?);
        }

        return Ok(bytes);
    }

    Err(ApiError::field(IMAGE_FIELD, MSG_NO_FILE))
}

/// Stores a new image for an owned recipe. The recipe is looked up before
/// the upload is read, and the file it replaces is removed afterwards.
pub async fn upload_image(
    id: Id,
    session: SessionData,
    form: MultipartForm,
    state: AppState,
) -> Result<Response, Rejection> {
    let root = &state.config.media_root;

    respond(
        async {
            store::get_recipe(session.user_id, id, &state.pool).await?;

            let bytes = read_image_part(form).await?;
            let format = validate_image(&bytes)?;
            let relative = save_recipe_image(root, &bytes, format).await?;

            let (recipe, previous) =
                match store::set_recipe_image(session.user_id, id, &relative, &state.pool).await {
                    Ok(updated) => updated,
                    Err(e) => {
                        remove_media(root, &relative).await;
                        return Err(e);
                    }
                };

            if let Some(previous) = previous.filter(|previous| *previous != relative) {
                remove_media(root, &previous).await;
            }

            let body = RecipeImageBody {
                id: recipe.id,
                image: recipe
                    .image
                    .map(|image| media_url(&state.config.media_url, &image)),
            };

            Ok::<_, ApiError>(json_response(&body, StatusCode::OK))
        }
        .await,
    )
}
