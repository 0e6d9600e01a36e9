use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderName, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    error::{UserError, UserResult},
    state::AppState,
    users::{
        dto::{Fields, MessageResponse},
        repo_types::User,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route(
            "/users/:id",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
}

fn json_fields(body: Result<Json<Fields>, JsonRejection>) -> UserResult<Fields> {
    body.map(|Json(fields)| fields)
        .map_err(|e| UserError::Validation(e.body_text()))
}

/// Ids that are not an `i32` name no stored user.
fn user_id(path: Result<Path<String>, PathRejection>) -> UserResult<i32> {
    let Path(raw) = path.map_err(|e| UserError::Validation(e.body_text()))?;
    raw.parse::<i32>().map_err(|_| UserError::UnknownId(raw))
}

#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<Fields>, JsonRejection>,
) -> UserResult<(StatusCode, [(HeaderName, String); 1], Json<User>)> {
    let fields = json_fields(body)?;
    let user = state.users.create(&fields).await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/users/{}", user.id))],
        Json(user),
    ))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> UserResult<Json<Vec<User>>> {
    Ok(Json(state.users.list().await?))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> UserResult<Json<User>> {
    let id = user_id(id)?;
    Ok(Json(state.users.read(id).await?))
}

#[instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<Fields>, JsonRejection>,
) -> UserResult<Json<User>> {
    let id = user_id(id)?;
    let fields = json_fields(body)?;
    Ok(Json(state.users.update(id, &fields).await?))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> UserResult<Json<MessageResponse>> {
    let id = user_id(id)?;
    state.users.delete(id).await?;
    Ok(Json(MessageResponse {
        message: "User deleted",
    }))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{app::build_app, config::UserSchema, state::AppState};

    fn app() -> Router {
        build_app(AppState::fake(UserSchema::Basic))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                req = req.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn ada() -> Value {
        json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "age": 36,
            "phone_number": 5551234,
            "location": "London"
        })
    }

    #[tokio::test]
    async fn create_returns_201_with_assigned_id_and_location() {
        let app = app();
        let req = Request::builder()
            .method("POST")
            .uri("/users")
            .header("content-type", "application/json")
            .body(Body::from(ada().to_string()))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()["location"], "/users/1");

        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({
                "id": 1,
                "first_name": "Ada",
                "last_name": "Lovelace",
                "age": 36,
                "phone_number": 5551234,
                "location": "London"
            })
        );
    }

    #[tokio::test]
    async fn create_with_bad_age_is_400_and_persists_nothing() {
        let app = app();
        let mut body = ada();
        body["age"] = json!("not-a-number");
        let (status, err) = send(&app, "POST", "/users", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"]["type"], "coercion_error");

        let (_, list) = send(&app, "GET", "/users", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn create_with_missing_fields_is_400() {
        let app = app();
        let (status, err) = send(&app, "POST", "/users", Some(json!({"first_name": "Ada"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"]["type"], "missing_fields");
        assert_eq!(
            err["error"]["message"],
            "Missing fields: last_name, age, phone_number, location"
        );
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let app = app();
        let req = Request::builder()
            .method("POST")
            .uri("/users")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_list_update_delete_flow() {
        let app = app();
        send(&app, "POST", "/users", Some(ada())).await;

        let (status, user) = send(&app, "GET", "/users/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["location"], "London");

        let (status, updated) =
            send(&app, "PUT", "/users/1", Some(json!({"location": "Paris"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["location"], "Paris");
        assert_eq!(updated["first_name"], "Ada");
        assert_eq!(updated["age"], 36);

        let (status, list) = send(&app, "GET", "/users", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, msg) = send(&app, "DELETE", "/users/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(msg["message"], "User deleted");

        let (status, _) = send(&app, "GET", "/users/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, err) = send(&app, "DELETE", "/users/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["error"]["type"], "not_found");
    }

    #[tokio::test]
    async fn update_unknown_user_is_404() {
        let app = app();
        let (status, _) = send(&app, "PATCH", "/users/99", Some(json!({"age": 40}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_integer_ids_are_404_with_error_body() {
        let app = app();
        for uri in ["/users/abc", "/users/99999999999"] {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["error"]["type"], "not_found", "{uri}");
        }
        let (status, body) = send(&app, "DELETE", "/users/abc", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "User 'abc' not found");

        let (status, _) = send(&app, "PUT", "/users/abc", Some(json!({"age": 40}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn integral_float_age_is_accepted() {
        let app = app();
        let mut body = ada();
        body["age"] = json!(36.0);
        let (status, created) = send(&app, "POST", "/users", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["age"], 36);
    }

    #[tokio::test]
    async fn auth_routes_are_absent_in_basic_schema() {
        let app = app();
        let (status, _) = send(&app, "GET", "/profile", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let res = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
