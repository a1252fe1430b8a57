use warp::{reject::Rejection, Filter};

use super::jwt::{SessionData, SessionKey};
use crate::{error::ApiError, MSG_INVALID_TOKEN, MSG_NO_CREDENTIALS};

const SCHEMES: [&str; 2] = ["token", "bearer"];

/// Pulls the token out of an `Authorization: Token <jwt>` (or `Bearer`)
/// header.
fn credentials(header: Option<&str>) -> Result<&str, ApiError> {
    let header = header.ok_or(ApiError::Unauthenticated(MSG_NO_CREDENTIALS))?;

    let mut words = header.split_whitespace();
    let scheme = words.next().unwrap_or_default().to_ascii_lowercase();
    if !SCHEMES.contains(&scheme.as_str()) {
        return Err(ApiError::Unauthenticated(MSG_NO_CREDENTIALS));
    }

    match (words.next(), words.next()) {
        (Some(token), None) => Ok(token),
        _ => Err(ApiError::Unauthenticated(MSG_INVALID_TOKEN)),
    }
}

/// Rejects unless the request carries a valid session token. Routes place it
/// ahead of body parsing so unauthenticated calls never reach the store.
pub fn with_session(
    keys: SessionKey,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let keys = keys.clone();
        async move {
            let token = credentials(header.as_deref()).map_err(warp::reject::custom)?;

            keys.verify_jwt_session(token)
                .map(SessionData::from)
                .map_err(warp::reject::custom)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::User;

    fn keys() -> SessionKey {
        SessionKey::new(b"middleware", 1).unwrap()
    }

    fn user() -> User {
        User {
            id: 3,
            email: String::from("user@example.com"),
            name: String::from("User"),
            password: String::new(),
        }
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let rejection = warp::test::request()
            .filter(&with_session(keys()))
            .await
            .unwrap_err();

        assert!(matches!(
            rejection.find::<ApiError>(),
            Some(ApiError::Unauthenticated(MSG_NO_CREDENTIALS))
        ));
    }

    #[tokio::test]
    async fn both_schemes_are_accepted() {
        let keys = keys();
        let token = keys.generate_jwt_session(&user()).unwrap();

        for scheme in ["Token", "Bearer"] {
            let session = warp::test::request()
                .header("authorization", format!("{scheme} {token}"))
                .filter(&with_session(keys.clone()))
                .await
                .unwrap();
            assert_eq!(session.user_id, 3);
        }
    }

    #[test]
    fn malformed_headers() {
        assert!(matches!(
            credentials(Some("Basic abc")),
            Err(ApiError::Unauthenticated(MSG_NO_CREDENTIALS))
        ));
        assert!(matches!(
            credentials(Some("Token")),
            Err(ApiError::Unauthenticated(MSG_INVALID_TOKEN))
        ));
        assert!(matches!(
            credentials(Some("Token a b")),
            Err(ApiError::Unauthenticated(MSG_INVALID_TOKEN))
        ));
        assert_eq!(credentials(Some("token abc")).unwrap(), "abc");
    }
}
