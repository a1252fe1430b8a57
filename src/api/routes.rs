use std::convert::Infallible;

use warp::{
    filters::BoxedFilter,
    reply::{Reply, Response},
    Filter, Rejection,
};

use super::{
    handlers::{self, attributes, recipes, users},
    rejection::handle_rejection,
};
use crate::{
    config::Config,
    filter::QueryData,
    form::{FormData, WriteMode},
    middleware::with_session,
    schema::{AttrKind, Id},
    state::{with_state, AppState},
    JSON_BODY_LIMIT,
};

fn json_body() -> impl Filter<Extract = (FormData,), Error = Rejection> + Clone {
    warp::body::content_length_limit(JSON_BODY_LIMIT).and(warp::body::json())
}

/// `PUT` replaces, `PATCH` merges.
fn write_mode() -> impl Filter<Extract = (WriteMode,), Error = Rejection> + Clone {
    warp::put()
        .map(|| WriteMode::Replace)
        .or(warp::patch().map(|| WriteMode::Partial))
        .unify()
}

fn health_routes() -> BoxedFilter<(Response,)> {
    warp::path!("api" / "health-check")
        .and(warp::get())
        .and_then(handlers::health_check)
        .boxed()
}

fn user_routes(state: &AppState) -> BoxedFilter<(Response,)> {
    let session = with_session(state.keys.clone());
    let state = with_state(state.clone());

    let create = warp::path!("api" / "user" / "create")
        .and(warp::post())
        .and(json_body())
        .and(state.clone())
        .and_then(users::create_user);

    let token = warp::path!("api" / "user" / "token")
        .and(warp::post())
        .and(json_body())
        .and(state.clone())
        .and_then(users::create_token);

    let me = warp::path!("api" / "user" / "me")
        .and(warp::get())
        .and(session.clone())
        .and(state.clone())
        .and_then(users::retrieve_me);

    let update_me = warp::path!("api" / "user" / "me")
        .and(write_mode())
        .and(session)
        .and(json_body())
        .and(state)
        .and_then(users::update_me);

    create
        .or(token)
        .unify()
        .or(me)
        .unify()
        .or(update_me)
        .unify()
        .boxed()
}

fn recipe_routes(state: &AppState) -> BoxedFilter<(Response,)> {
    let session = with_session(state.keys.clone());
    let upload_limit = state.config.max_upload_bytes;
    let state = with_state(state.clone());

    let list = warp::path!("api" / "recipe" / "recipes")
        .and(warp::get())
        .and(session.clone())
        .and(warp::query::<QueryData>())
        .and(state.clone())
        .and_then(recipes::list_recipes);

    let create = warp::path!("api" / "recipe" / "recipes")
        .and(warp::post())
        .and(session.clone())
        .and(json_body())
        .and(state.clone())
        .and_then(recipes::create_recipe);

    let retrieve = warp::path!("api" / "recipe" / "recipes" / Id)
        .and(warp::get())
        .and(session.clone())
        .and(state.clone())
        .and_then(recipes::retrieve_recipe);

    let update = warp::path!("api" / "recipe" / "recipes" / Id)
        .and(write_mode())
        .and(session.clone())
        .and(json_body())
        .and(state.clone())
        .and_then(recipes::update_recipe);

    let delete = warp::path!("api" / "recipe" / "recipes" / Id)
        .and(warp::delete())
        .and(session.clone())
        .and(state.clone())
        .and_then(recipes::delete_recipe);

    let upload = warp::path!("api" / "recipe" / "recipes" / Id / "upload-image")
        .and(warp::post())
        .and(session)
        .and(warp::multipart::form().max_length(upload_limit))
        .and(state)
        .and_then(recipes::upload_image);

    list.or(create)
        .unify()
        .or(retrieve)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .or(upload)
        .unify()
        .boxed()
}

/// Tags and ingredients expose the same surface under their own prefix.
/// There is no create route, records appear through recipe writes.
fn attribute_routes(kind: AttrKind, state: &AppState) -> BoxedFilter<(Response,)> {
    let session = with_session(state.keys.clone());
    let state = with_state(state.clone());
    let segment = kind.plural();
    let kind = warp::any().map(move || kind);

    let collection = kind
        .and(warp::path("api"))
        .and(warp::path("recipe"))
        .and(warp::path(segment));
    let item = collection.clone().and(warp::path::param::<Id>());

    let list = collection
        .and(warp::path::end())
        .and(warp::get())
        .and(session.clone())
        .and(warp::query::<QueryData>())
        .and(state.clone())
        .and_then(attributes::list_attributes);

    let retrieve = item
        .clone()
        .and(warp::path::end())
        .and(warp::get())
        .and(session.clone())
        .and(state.clone())
        .and_then(attributes::retrieve_attribute);

    let update = item
        .clone()
        .and(warp::path::end())
        .and(write_mode())
        .and(session.clone())
        .and(json_body())
        .and(state.clone())
        .and_then(attributes::update_attribute);

    let delete = item
        .and(warp::path::end())
        .and(warp::delete())
        .and(session)
        .and(state)
        .and_then(attributes::delete_attribute);

    list.or(retrieve)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .boxed()
}

/// Read-only file serving for uploads under the configured URL prefix.
fn media_routes(config: &Config) -> BoxedFilter<(Response,)> {
    let mut prefix = warp::any().boxed();
    for segment in config.media_prefix().split('/').filter(|s| !s.is_empty()) {
        prefix = prefix.and(warp::path(segment.to_string())).boxed();
    }

    prefix
        .and(warp::get())
        .and(warp::fs::dir(config.media_root.clone()))
        .map(|file: warp::fs::File| file.into_response())
        .boxed()
}

/// Every route of the service, without rejection handling.
pub fn api(state: &AppState) -> BoxedFilter<(Response,)> {
    health_routes()
        .or(user_routes(state))
        .unify()
        .or(recipe_routes(state))
        .unify()
        .or(attribute_routes(AttrKind::Tag, state))
        .unify()
        .or(attribute_routes(AttrKind::Ingredient, state))
        .unify()
        .or(media_routes(&state.config))
        .unify()
        .boxed()
}

/// The served application: routes, JSON error rendering and access logging.
pub fn app(state: &AppState) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    api(state)
        .recover(handle_rejection)
        .with(warp::log("recipe_api::http"))
}
