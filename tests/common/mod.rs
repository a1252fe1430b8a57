#![allow(dead_code)]

use bytes::Bytes;
use recipe_api::{
    config::Config,
    pool::{connect_memory, migrate},
    routes::app,
    schema::{Id, User},
    state::AppState,
};
use serde_json::Value;
use tempfile::TempDir;
use warp::http::StatusCode;

pub const BOUNDARY: &str = "recipe-api-test-boundary";

pub struct TestApp {
    pub state: AppState,
    pub media: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: warp::http::HeaderMap,
    pub body: Value,
}

pub async fn setup() -> TestApp {
    let media = tempfile::tempdir().unwrap();

    let mut config = Config::load_from(|_| None).unwrap();
    config.secret_key = b"integration test secret".to_vec();
    config.media_root = media.path().to_path_buf();

    let pool = connect_memory().await.unwrap();
    migrate(&pool).await.unwrap();

    TestApp {
        state: AppState::new(pool, config).unwrap(),
        media,
    }
}

fn parse(response: warp::http::Response<Bytes>) -> TestResponse {
    let body = if response.body().is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(response.body()).unwrap()
    };

    TestResponse {
        status: response.status(),
        headers: response.headers().clone(),
        body,
    }
}

impl TestApp {
    /// Inserts a user directly, skipping password hashing.
    pub async fn user(&self, email: &str) -> User {
        sqlx::query_as("INSERT INTO users (email, name, password) VALUES ($1, $2, $3) RETURNING *")
            .bind(email)
            .bind("Test Name")
            .bind("unusable")
            .fetch_one(&self.state.pool)
            .await
            .unwrap()
    }

    /// A user plus a session token for them.
    pub async fn login(&self, email: &str) -> (User, String) {
        let user = self.user(email).await;
        let token = self.state.keys.generate_jwt_session(&user).unwrap();
        (user, token)
    }

    pub async fn tag(&self, user_id: Id, name: &str) -> Id {
        self.attr("tags", user_id, name).await
    }

    pub async fn ingredient(&self, user_id: Id, name: &str) -> Id {
        self.attr("ingredients", user_id, name).await
    }

    async fn attr(&self, table: &str, user_id: Id, name: &str) -> Id {
        let row: (Id,) = sqlx::query_as(&format!(
            "INSERT INTO {table} (user_id, name) VALUES ($1, $2) RETURNING id"
        ))
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.state.pool)
        .await
        .unwrap();
        row.0
    }

    pub async fn count(&self, query: &str) -> i64 {
        let row: (i64,) = sqlx::query_as(query)
            .fetch_one(&self.state.pool)
            .await
            .unwrap();
        row.0
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut request = warp::test::request().method(method).path(path);
        if let Some(token) = token {
            request = request.header("authorization", format!("Token {token}"));
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        parse(request.reply(&app(&self.state)).await)
    }

    pub async fn get(&self, path: &str, token: &str) -> TestResponse {
        self.request("GET", path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(token), Some(body)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(token), Some(body)).await
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> TestResponse {
        self.request("PATCH", path, Some(token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> TestResponse {
        self.request("DELETE", path, Some(token), None).await
    }

    /// Sends `file` as the single part `field` of a multipart body.
    pub async fn upload(&self, path: &str, token: &str, field: &str, file: &[u8]) -> TestResponse {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
            Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.png\"\r\n\
            Content-Type: image/png\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(file);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let response = warp::test::request()
            .method("POST")
            .path(path)
            .header("authorization", format!("Token {token}"))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .reply(&app(&self.state))
            .await;

        parse(response)
    }

    /// Raw GET, for files served outside the JSON API.
    pub async fn fetch(&self, path: &str) -> warp::http::Response<Bytes> {
        warp::test::request()
            .method("GET")
            .path(path)
            .reply(&app(&self.state))
            .await
    }

    /// Creates a recipe through the API and returns its id.
    pub async fn recipe(&self, token: &str, body: Value) -> Id {
        let response = self.post(RECIPES_URL, token, body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_i64().unwrap()
    }
}

pub const RECIPES_URL: &str = "/api/recipe/recipes/";
pub const TAGS_URL: &str = "/api/recipe/tags/";
pub const INGREDIENTS_URL: &str = "/api/recipe/ingredients/";

pub fn recipe_url(id: Id) -> String {
    format!("{RECIPES_URL}{id}/")
}

pub fn upload_url(id: Id) -> String {
    format!("{RECIPES_URL}{id}/upload-image/")
}

pub fn tag_url(id: Id) -> String {
    format!("{TAGS_URL}{id}/")
}

pub fn ingredient_url(id: Id) -> String {
    format!("{INGREDIENTS_URL}{id}/")
}

pub fn sample_recipe() -> Value {
    serde_json::json!({
        "title": "Sample recipe",
        "time_minutes": 22,
        "price": "5.25",
    })
}

pub fn png() -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image::RgbImage::new(10, 10))
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn names(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect()
}
