use warp::{http::StatusCode, reply::Response, Rejection};

use crate::{
    actions::users as store,
    form::{FormData, WriteMode},
    jwt::SessionData,
    responses::{json_response, respond, TokenBody, UserBody},
    state::AppState,
};

pub async fn create_user(body: FormData, state: AppState) -> Result<Response, Rejection> {
    respond(
        store::register_user(body, &state.pool)
            .await
            .map(|user| json_response(&UserBody::from(user), StatusCode::CREATED)),
    )
}

pub async fn create_token(body: FormData, state: AppState) -> Result<Response, Rejection> {
    respond(
        store::login_user(body, &state.keys, &state.pool)
            .await
            .map(|token| json_response(&TokenBody { token }, StatusCode::OK)),
    )
}

pub async fn retrieve_me(session: SessionData, state: AppState) -> Result<Response, Rejection> {
    respond(
        store::get_user_by_id(session.user_id, &state.pool)
            .await
            .map(|user| json_response(&UserBody::from(user), StatusCode::OK)),
    )
}

pub async fn update_me(
    mode: WriteMode,
    session: SessionData,
    body: FormData,
    state: AppState,
) -> Result<Response, Rejection> {
    respond(
        store::update_user(session.user_id, body, mode, &state.pool)
            .await
            .map(|user| json_response(&UserBody::from(user), StatusCode::OK)),
    )
}
