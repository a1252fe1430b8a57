use warp::{http::StatusCode, reply::Response, Rejection};

use crate::{
    actions::attributes as store,
    error::ApiError,
    filter::{AttrFilter, QueryData},
    form::{FormData, WriteMode},
    jwt::SessionData,
    responses::{json_response, no_content, respond},
    schema::{AttrKind, Id},
    state::AppState,
};

pub async fn list_attributes(
    kind: AttrKind,
    session: SessionData,
    query: QueryData,
    state: AppState,
) -> Result<Response, Rejection> {
    respond(
        async {
            let filter = AttrFilter::from_query(&query)?;
            let list = store::list_attributes(kind, session.user_id, filter, &state.pool).await?;
            Ok::<_, ApiError>(json_response(&list, StatusCode::OK))
        }
        .await,
    )
}

pub async fn retrieve_attribute(
    kind: AttrKind,
    id: Id,
    session: SessionData,
    state: AppState,
) -> Result<Response, Rejection> {
    respond(
        store::get_attribute(kind, session.user_id, id, &state.pool)
            .await
            .map(|attr| json_response(&attr, StatusCode::OK)),
    )
}

pub async fn update_attribute(
    kind: AttrKind,
    id: Id,
    mode: WriteMode,
    session: SessionData,
    body: FormData,
    state: AppState,
) -> Result<Response, Rejection> {
    respond(
        store::update_attribute(kind, session.user_id, id, body, mode, &state.pool)
            .await
            .map(|attr| json_response(&attr, StatusCode::OK)),
    )
}

pub async fn delete_attribute(
    kind: AttrKind,
    id: Id,
    session: SessionData,
    state: AppState,
) -> Result<Response, Rejection> {
    respond(
        store::delete_attribute(kind, session.user_id, id, &state.pool)
            .await
            .map(|()| no_content()),
    )
}
