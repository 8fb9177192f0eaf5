/// Common test utilities for the API tests
///
/// Builds the full router over an in-memory repository seeded with one user per
/// role plus a second member, and offers token and request helpers.

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;
use worktasks_api::app::{build_router, AppState};
use worktasks_api::config::Config;
use worktasks_shared::auth::actor::Actor;
use worktasks_shared::auth::jwt::issue_assertion;
use worktasks_shared::auth::password::hash_password;
use worktasks_shared::models::{NewUser, Role};
use worktasks_shared::store::{MemoryRepository, Repository};

pub const PASSWORD: &str = "correct-horse";
pub const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct TestContext {
    pub repo: Arc<dyn Repository>,
    pub app: Router,
    pub config: Config,
    pub admin: Actor,
    pub manager: Actor,
    pub alice: Actor,
    pub bob: Actor,
}

impl TestContext {
    pub async fn new() -> Self {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "postgresql://unused/unused"),
            ("JWT_SECRET", SECRET),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
            .expect("Failed to build test config");

        let repo: Arc<dyn Repository> = Arc::new(MemoryRepository::new());

        // Hashed once for all accounts
        let password_hash = hash_password(PASSWORD).expect("Failed to hash password");

        let mut actors = Vec::new();
        for (email, role) in [
            ("admin@example.com", Role::Admin),
            ("manager@example.com", Role::Manager),
            ("alice@example.com", Role::Member),
            ("bob@example.com", Role::Member),
        ] {
            let user = repo
                .insert_user(NewUser {
                    email: email.to_string(),
                    password_hash: password_hash.clone(),
                    role,
                })
                .await
                .expect("Failed to insert user");
            actors.push(Actor::from(&user));
        }

        let app = build_router(AppState::new(repo.clone(), config.clone()));

        Self {
            repo,
            app,
            config,
            admin: actors[0],
            manager: actors[1],
            alice: actors[2],
            bob: actors[3],
        }
    }

    /// Signs a token for `actor`, whatever its stored role currently is
    pub fn token(&self, actor: &Actor) -> String {
        issue_assertion(actor, "test@example.com", SECRET, self.config.jwt.expiry())
            .expect("Failed to issue token")
            .token
    }

    pub fn expired_token(&self, actor: &Actor) -> String {
        issue_assertion(actor, "test@example.com", SECRET, Duration::minutes(-10))
            .expect("Failed to issue token")
            .token
    }

    /// Sends a request as `actor`
    pub async fn send_as(
        &self,
        actor: &Actor,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> TestResponse {
        let auth = format!("Bearer {}", self.token(actor));
        self.send(method, uri, Some(&auth), body).await
    }

    /// Sends a request with an optional raw `Authorization` header
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = authorization {
            builder = builder.header(header::AUTHORIZATION, auth);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.dispatch(request).await
    }

    /// Sends a raw JSON string, for malformed-body tests
    pub async fn send_raw_json(&self, actor: &Actor, method: &str, uri: &str, raw: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token(actor)))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(raw.to_string()))
            .unwrap();

        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
