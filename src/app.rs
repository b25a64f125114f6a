use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, categories, comments, ingredients, meal_plans, recipes, shopping, users};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(categories::router())
        .merge(ingredients::router())
        .merge(recipes::router())
        .merge(comments::router())
        .merge(shopping::router())
        .merge(meal_plans::router())
        .route("/health", get(|| async { "ok" }))
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    tracing::info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::jwt::JwtKeys;
    use crate::testing;
    use crate::users::repo_types::CurrentUser;

    fn bearer(st: &AppState, user: &CurrentUser) -> String {
        let pair = JwtKeys::new(&st.config.jwt).issue_pair(user.id).unwrap();
        format!("Bearer {}", pair.access_token)
    }

    async fn call(
        st: &AppState,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = auth {
            req = req.header(header::AUTHORIZATION, token);
        }
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        build_app(st.clone())
            .oneshot(req.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(res: Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn recipe_body(title: &str) -> Value {
        json!({
            "title": title,
            "description": "Warm and filling",
            "instructions": "Chop. Simmer. Serve.",
            "prepTimeMinutes": 15,
            "cookTimeMinutes": 40,
            "servingSize": 4,
            "difficultyLevel": "MEDIUM",
            "calories": 420,
            "categories": ["Soup", "Dinner"],
            "ingredients": [
                {"name": "Carrot", "quantity": "3", "unit": "pc"},
                {"name": "Stock", "quantity": "1", "unit": "l", "notes": "hot"}
            ]
        })
    }

    #[tokio::test]
    async fn health_is_public() {
        let st = AppState::fake();
        let res = call(&st, Method::GET, "/api/v1/health", None, None).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_login_and_me() {
        let st = AppState::fake();
        let res = call(
            &st,
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({"username": "alice", "email": "alice@x.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = json_body(res).await;
        assert_eq!(body["user"]["role"], "USER");

        let res = call(
            &st,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "alice", "password": "wrong-pw"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = call(
            &st,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "alice", "password": "secret1"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let token = format!(
            "Bearer {}",
            json_body(res).await["accessToken"].as_str().unwrap()
        );

        let res = call(&st, Method::GET, "/api/v1/me", Some(&token), None).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = call(&st, Method::GET, "/api/v1/me", None, None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_registration_is_422() {
        let st = AppState::fake();
        let res = call(
            &st,
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({"username": "al", "email": "nope", "password": "123"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(res).await;
        assert_eq!(body["error"], "validation");
        assert_eq!(body["fields"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn blocked_accounts_are_rejected() {
        let st = AppState::fake();
        let alice = testing::user(&st, "alice").await;
        let token = bearer(&st, &alice);
        crate::users::services::toggle_active_status(&st, alice.id)
            .await
            .unwrap();
        let res = call(&st, Method::GET, "/api/v1/me", Some(&token), None).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn recipe_lifecycle_over_http() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        let bob = testing::user(&st, "bob").await;
        let (alice_auth, bob_auth) = (bearer(&st, &alice), bearer(&st, &bob));

        let res = call(
            &st,
            Method::POST,
            "/api/v1/recipes",
            Some(&alice_auth),
            Some(recipe_body("Carrot soup")),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created = json_body(res).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["ingredients"].as_array().unwrap().len(), 2);

        let res = call(
            &st,
            Method::PUT,
            &format!("/api/v1/recipes/{id}"),
            Some(&bob_auth),
            Some(recipe_body("Stolen soup")),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = call(
            &st,
            Method::POST,
            &format!("/api/v1/recipes/{id}/favorite"),
            Some(&bob_auth),
            None,
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = call(
            &st,
            Method::POST,
            &format!("/api/v1/recipes/{id}/comments"),
            Some(&bob_auth),
            Some(json!({"content": "So good", "rating": 4})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = call(
            &st,
            Method::GET,
            &format!("/api/v1/recipes/{id}"),
            Some(&bob_auth),
            None,
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let page = json_body(res).await;
        assert_eq!(page["isFavorite"], true);
        assert_eq!(page["isAuthor"], false);
        assert_eq!(page["favoriteCount"], 1);
        assert_eq!(page["rating"]["averageRating"], 4.0);

        let res = call(
            &st,
            Method::GET,
            &format!("/api/v1/recipes/{id}/pdf"),
            Some(&bob_auth),
            None,
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/pdf");

        let res = call(
            &st,
            Method::DELETE,
            &format!("/api/v1/recipes/{id}"),
            Some(&alice_auth),
            None,
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let res = call(&st, Method::GET, "/api/v1/me/favorites", Some(&bob_auth), None).await;
        assert_eq!(json_body(res).await.as_array().unwrap().len(), 0);
        let res = call(&st, Method::GET, "/api/v1/categories/Soup/recipes", None, None).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn non_positive_limit_lists_everything() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        for title in ["Soup", "Stew", "Salad"] {
            testing::recipe(&st, &alice, title).await;
        }
        let auth = bearer(&st, &alice);

        for uri in ["/api/v1/me/recipes?limit=-1", "/api/v1/me/recipes?limit=0"] {
            let res = call(&st, Method::GET, uri, Some(&auth), None).await;
            assert_eq!(res.status(), StatusCode::OK, "{uri}");
            assert_eq!(json_body(res).await.as_array().unwrap().len(), 3, "{uri}");
        }

        let res = call(&st, Method::GET, "/api/v1/me/recipes?limit=2", Some(&auth), None).await;
        assert_eq!(json_body(res).await.as_array().unwrap().len(), 2);

        let res = call(
            &st,
            Method::GET,
            &format!("/api/v1/users/{}?limit=-5", alice.id),
            Some(&auth),
            None,
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let profile = json_body(res).await;
        assert_eq!(profile["recipes"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn shopping_list_over_http() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        let bob = testing::user(&st, "bob").await;
        let (alice_auth, bob_auth) = (bearer(&st, &alice), bearer(&st, &bob));

        let res = call(
            &st,
            Method::POST,
            "/api/v1/shopping-list/items",
            Some(&alice_auth),
            Some(json!({"name": "Milk", "quantity": "1", "unit": "l", "customCategory": "Dairy"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let item_id = json_body(res).await["id"].as_str().unwrap().to_string();

        let res = call(
            &st,
            Method::PATCH,
            &format!("/api/v1/shopping-list/items/{item_id}/toggle"),
            Some(&bob_auth),
            None,
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = call(
            &st,
            Method::PATCH,
            &format!("/api/v1/shopping-list/items/{item_id}/toggle"),
            Some(&alice_auth),
            None,
        )
        .await;
        assert_eq!(json_body(res).await["completed"], true);

        let res = call(&st, Method::GET, "/api/v1/shopping-list", Some(&alice_auth), None).await;
        let list = json_body(res).await;
        assert_eq!(list["stats"]["completionPercentage"], 100);
        assert_eq!(list["categorized"]["Dairy"].as_array().unwrap().len(), 1);

        let res = call(
            &st,
            Method::POST,
            "/api/v1/shopping-list/items",
            Some(&alice_auth),
            Some(json!({"name": ""})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn admin_routes_require_admin() {
        let st = AppState::fake();
        let root = testing::admin(&st, "root").await;
        let alice = testing::user(&st, "alice").await;

        let res = call(&st, Method::GET, "/api/v1/admin", Some(&bearer(&st, &alice)), None).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let root_auth = bearer(&st, &root);
        let res = call(&st, Method::GET, "/api/v1/admin", Some(&root_auth), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["totalUsers"], 2);

        let res = call(
            &st,
            Method::PATCH,
            &format!("/api/v1/admin/users/{}/role", root.id),
            Some(&root_auth),
            Some(json!({"role": "USER"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn meal_plans_over_http() {
        let st = AppState::fake();
        let alice = testing::user(&st, "alice").await;
        let auth = bearer(&st, &alice);
        let recipe = testing::recipe(&st, &alice, "Porridge").await;

        let res = call(
            &st,
            Method::POST,
            "/api/v1/meal-plans",
            Some(&auth),
            Some(json!({"recipeId": recipe.id, "mealType": "brunch", "plannedDate": "2999-01-01"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = call(
            &st,
            Method::POST,
            "/api/v1/meal-plans",
            Some(&auth),
            Some(json!({"recipeId": recipe.id, "mealType": "breakfast", "plannedDate": "2999-01-01"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = call(
            &st,
            Method::GET,
            "/api/v1/meal-plans?week_start=2998-12-29",
            Some(&auth),
            None,
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let week = json_body(res).await;
        assert_eq!(week["weekStart"], "2998-12-29");
        assert_eq!(week["mealPlans"].as_array().unwrap().len(), 1);
        assert_eq!(week["recipeAvailability"][recipe.id.to_string()], true);
    }
}
