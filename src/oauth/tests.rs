//! Tests for oauth module
//!
//! Provider endpoints are served by a local mock server.

#[cfg(test)]
mod tests {
    use super::super::*;
    use super::super::state_store::StatePurpose;
    use crate::auth::{models::RegisterRequest, UserRepository};
    use crate::common::config::MIN_BCRYPT_COST;
    use crate::common::{ApiError, AppConfig, AppState};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn state_for(server: &MockServer) -> AppState {
        let mut config = AppConfig::for_tests();
        config.oauth = OAuthConfig::for_tests(&server.base_url());
        AppState::with_config(config).await
    }

    async fn mock_github(server: &MockServer, emails: serde_json::Value) {
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/github/token")
                    .body_contains("grant_type=authorization_code")
                    .body_contains("client_id=github-client");
                then.status(200)
                    .json_body(json!({ "access_token": "gh-token", "token_type": "bearer" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/github/user")
                    .header("authorization", "Bearer gh-token");
                then.status(200).json_body(json!({
                    "id": 4242,
                    "login": "octocat",
                    "name": null,
                    "avatar_url": "https://avatars.example.com/octocat"
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/github/user/emails");
                then.status(200).json_body(emails);
            })
            .await;
    }

    async fn mock_google(server: &MockServer, subject: &str, email: &str) {
        let profile = json!({
            "id": subject,
            "email": email,
            "name": "Ada Lovelace",
            "picture": "https://avatars.example.com/ada",
            "verified_email": true
        });
        server
            .mock_async(|when, then| {
                when.method(POST).path("/google/token");
                then.status(200)
                    .json_body(json!({ "access_token": "g-token", "token_type": "Bearer" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/google/user");
                then.status(200).json_body(profile);
            })
            .await;
    }

    fn primary_email(email: &str) -> serde_json::Value {
        json!([
            { "email": "old@example.com", "primary": false, "verified": true },
            { "email": email, "primary": true, "verified": true }
        ])
    }

    async fn sign_in(state: &AppState, provider: &str) -> Result<crate::auth::AuthResponse, ApiError> {
        let started = state.oauth_service.begin_authorization(provider).await?;
        state
            .oauth_service
            .exchange_code(provider, "auth-code", &started.state)
            .await
    }

    async fn register_local(state: &AppState, email: &str) -> i64 {
        state
            .auth_service
            .register(RegisterRequest {
                email: email.to_string(),
                password: "secret1".to_string(),
                first_name: "Local".to_string(),
                last_name: "User".to_string(),
                phone: None,
            })
            .await
            .unwrap()
            .user
            .id
    }

    // ========================================================================
    // Authorization URL and state
    // ========================================================================

    #[tokio::test]
    async fn test_authorization_url_for_unknown_provider_fails() {
        let state = AppState::for_tests().await;

        let result = state
            .oauth_service
            .build_authorization_url("twitter", "some-state");
        assert!(matches!(result, Err(ApiError::UnsupportedProvider(p)) if p == "twitter"));
    }

    #[tokio::test]
    async fn test_authorization_url_carries_encoded_parameters() {
        let state = AppState::for_tests().await;

        let url = state
            .oauth_service
            .build_authorization_url("google", "st=te")
            .unwrap();

        assert!(url.starts_with("http://127.0.0.1:0/google/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=google-client"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%2Fapi%2Foauth2%2Fgoogle%2Fcallback"
        ));
        assert!(url.contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fuserinfo.email%20"));
        assert!(url.contains("state=st%3Dte"));
    }

    #[test]
    fn test_generated_state_is_url_safe_and_unique() {
        let a = services::OAuthService::generate_state();
        let b = services::OAuthService::generate_state();

        assert_eq!(a.len(), 24);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '='));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_state_is_single_use() {
        let state = AppState::for_tests().await;
        let started = state
            .oauth_service
            .begin_authorization("github")
            .await
            .unwrap();
        assert_eq!(state.oauth_service.pending_states().await, 1);

        state
            .oauth_service
            .verify_state("github", &started.state, StatePurpose::SignIn)
            .await
            .unwrap();
        let reused = state
            .oauth_service
            .verify_state("github", &started.state, StatePurpose::SignIn)
            .await;

        assert!(matches!(reused, Err(ApiError::InvalidOAuthState)));
        assert_eq!(state.oauth_service.pending_states().await, 0);
    }

    #[tokio::test]
    async fn test_expired_state_is_rejected() {
        let store = state_store::OAuthStateStore::new(std::time::Duration::ZERO);
        store.insert("stale", Provider::Google, StatePurpose::SignIn).await;

        assert_eq!(store.peek("stale").await, None);
        assert!(!store.consume("stale", Provider::Google, StatePurpose::SignIn).await);
        assert_eq!(store.prune_expired().await, 0);
    }

    #[tokio::test]
    async fn test_exchange_rejects_unknown_state_without_calling_provider() {
        let server = MockServer::start_async().await;
        let token_endpoint = server
            .mock_async(|when, then| {
                when.method(POST).path("/github/token");
                then.status(200).json_body(json!({ "access_token": "gh-token" }));
            })
            .await;
        let state = state_for(&server).await;

        let result = state
            .oauth_service
            .exchange_code("github", "auth-code", "never-issued")
            .await;

        assert!(matches!(result, Err(ApiError::InvalidOAuthState)));
        assert_eq!(token_endpoint.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_exchange_rejects_state_from_other_provider() {
        let server = MockServer::start_async().await;
        let state = state_for(&server).await;
        let started = state
            .oauth_service
            .begin_authorization("google")
            .await
            .unwrap();

        let result = state
            .oauth_service
            .exchange_code("github", "auth-code", &started.state)
            .await;

        assert!(matches!(result, Err(ApiError::InvalidOAuthState)));
    }

    #[tokio::test]
    async fn test_link_state_is_bound_to_purpose_and_account() {
        let state = AppState::for_tests().await;

        let sign_in_state = state.oauth_service.begin_authorization("google").await.unwrap();
        let for_link = state
            .oauth_service
            .verify_state("google", &sign_in_state.state, StatePurpose::Link(1))
            .await;
        assert!(matches!(for_link, Err(ApiError::InvalidOAuthState)));

        let link_state = state.oauth_service.begin_link(1, "google").await.unwrap();
        assert_eq!(
            state.oauth_service.state_purpose(&link_state.state).await,
            Some(StatePurpose::Link(1))
        );
        let other_account = state
            .oauth_service
            .verify_state("google", &link_state.state, StatePurpose::Link(2))
            .await;
        assert!(matches!(other_account, Err(ApiError::InvalidOAuthState)));

        let link_state = state.oauth_service.begin_link(1, "google").await.unwrap();
        let as_sign_in = state
            .oauth_service
            .exchange_code("google", "auth-code", &link_state.state)
            .await;
        assert!(matches!(as_sign_in, Err(ApiError::InvalidOAuthState)));
    }

    // ========================================================================
    // Code exchange
    // ========================================================================

    #[tokio::test]
    async fn test_github_sign_in_creates_then_reuses_account() {
        let server = MockServer::start_async().await;
        mock_github(&server, primary_email("octo@example.com")).await;
        let state = state_for(&server).await;

        let first = sign_in(&state, "github").await.unwrap();
        assert_eq!(first.user.email, "octo@example.com");
        assert_eq!(first.user.first_name, "octocat");
        assert_eq!(first.user.last_name, "");
        assert_eq!(first.user.auth_provider, "github");
        assert!(first.user.github_linked);

        let second = sign_in(&state, "github").await.unwrap();
        assert_eq!(second.user.id, first.user.id);

        let claims = state.tokens.validate(&second.token).unwrap();
        assert_eq!(claims.user_id, first.user.id);
    }

    #[tokio::test]
    async fn test_github_without_primary_email_fails() {
        let server = MockServer::start_async().await;
        mock_github(
            &server,
            json!([{ "email": "side@example.com", "primary": false, "verified": true }]),
        )
        .await;
        let state = state_for(&server).await;

        let result = sign_in(&state, "github").await;
        assert!(matches!(result, Err(ApiError::NoPrimaryEmail)));
    }

    #[tokio::test]
    async fn test_google_sign_in_splits_full_name() {
        let server = MockServer::start_async().await;
        mock_google(&server, "g-100", "ada@example.com").await;
        let state = state_for(&server).await;

        let response = sign_in(&state, "google").await.unwrap();
        assert_eq!(response.user.first_name, "Ada");
        assert_eq!(response.user.last_name, "Lovelace");
        assert_eq!(
            response.user.avatar_url.as_deref(),
            Some("https://avatars.example.com/ada")
        );
    }

    #[tokio::test]
    async fn test_provider_rejection_is_exchange_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/github/token");
                then.status(200).json_body(json!({
                    "error": "bad_verification_code",
                    "error_description": "The code passed is incorrect or expired."
                }));
            })
            .await;
        let state = state_for(&server).await;

        let result = sign_in(&state, "github").await;
        assert!(matches!(result, Err(ApiError::OAuthExchange(_))));
    }

    #[tokio::test]
    async fn test_provider_http_failure_is_exchange_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/google/token");
                then.status(502);
            })
            .await;
        let state = state_for(&server).await;

        let result = sign_in(&state, "google").await;
        assert!(matches!(result, Err(ApiError::OAuthExchange(_))));
    }

    #[tokio::test]
    async fn test_sign_in_to_deactivated_account_is_refused() {
        let server = MockServer::start_async().await;
        mock_google(&server, "g-200", "gone@example.com").await;
        let state = state_for(&server).await;

        let created = sign_in(&state, "google").await.unwrap();
        state
            .auth_service
            .delete_account(created.user.id)
            .await
            .unwrap();

        let result = sign_in(&state, "google").await;
        assert!(matches!(result, Err(ApiError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_sign_in_with_email_of_local_account_is_duplicate() {
        let server = MockServer::start_async().await;
        mock_google(&server, "g-300", "taken@example.com").await;
        let state = state_for(&server).await;
        register_local(&state, "taken@example.com").await;

        let result = sign_in(&state, "google").await;
        assert!(matches!(result, Err(ApiError::DuplicateEmail)));
    }

    // ========================================================================
    // Linking
    // ========================================================================

    #[tokio::test]
    async fn test_linking_second_provider_keeps_first_subject() {
        let server = MockServer::start_async().await;
        mock_google(&server, "g-400", "ada@example.com").await;
        mock_github(&server, primary_email("octo@example.com")).await;
        let state = state_for(&server).await;
        let user_id = register_local(&state, "linker@example.com").await;

        let after_google = state
            .oauth_service
            .link_external_to_account(user_id, "google", "auth-code")
            .await
            .unwrap();
        assert!(after_google.google_linked);
        assert_eq!(after_google.auth_provider, "google");

        let after_github = state
            .oauth_service
            .link_external_to_account(user_id, "github", "auth-code")
            .await
            .unwrap();
        assert!(after_github.github_linked);
        assert!(after_github.google_linked);
        assert_eq!(after_github.auth_provider, "github");
        assert_eq!(after_github.email, "linker@example.com");

        let users = UserRepository::new(state.db.clone(), MIN_BCRYPT_COST);
        let row = users.find_by_id(user_id).await.unwrap();
        assert_eq!(row.google_id.as_deref(), Some("g-400"));
        assert_eq!(row.github_id.as_deref(), Some("4242"));
    }

    #[tokio::test]
    async fn test_linking_identity_owned_by_other_account_fails() {
        let server = MockServer::start_async().await;
        mock_google(&server, "g-500", "owner@example.com").await;
        let state = state_for(&server).await;
        sign_in(&state, "google").await.unwrap();
        let user_id = register_local(&state, "second@example.com").await;

        let result = state
            .oauth_service
            .link_external_to_account(user_id, "google", "auth-code")
            .await;
        assert!(matches!(result, Err(ApiError::IdentityAlreadyLinked)));
    }

    #[tokio::test]
    async fn test_unlinking_only_sign_in_method_is_refused() {
        let server = MockServer::start_async().await;
        mock_github(&server, primary_email("solo@example.com")).await;
        let state = state_for(&server).await;
        let created = sign_in(&state, "github").await.unwrap();

        let result = state
            .oauth_service
            .unlink_external_from_account(created.user.id, "github")
            .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));

        let not_linked = state
            .oauth_service
            .unlink_external_from_account(created.user.id, "google")
            .await;
        assert!(matches!(not_linked, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_unlinking_from_password_account_resets_tag() {
        let server = MockServer::start_async().await;
        mock_google(&server, "g-600", "ignored@example.com").await;
        let state = state_for(&server).await;
        let user_id = register_local(&state, "unlink@example.com").await;
        state
            .oauth_service
            .link_external_to_account(user_id, "google", "auth-code")
            .await
            .unwrap();

        let user = state
            .oauth_service
            .unlink_external_from_account(user_id, "google")
            .await
            .unwrap();

        assert!(!user.google_linked);
        assert_eq!(user.auth_provider, "email");
    }

    #[tokio::test]
    async fn test_unlinking_other_provider_keeps_current_tag() {
        let server = MockServer::start_async().await;
        mock_google(&server, "g-700", "ignored@example.com").await;
        mock_github(&server, primary_email("ignored@example.com")).await;
        let state = state_for(&server).await;
        let user_id = register_local(&state, "tagged@example.com").await;
        for provider in ["google", "github"] {
            state
                .oauth_service
                .link_external_to_account(user_id, provider, "auth-code")
                .await
                .unwrap();
        }

        let user = state
            .oauth_service
            .unlink_external_from_account(user_id, "google")
            .await
            .unwrap();

        assert!(!user.google_linked);
        assert!(user.github_linked);
        assert_eq!(user.auth_provider, "github");
    }

    // ========================================================================
    // Routes
    // ========================================================================

    #[tokio::test]
    async fn test_callback_sets_cookie_and_redirects() {
        let server = MockServer::start_async().await;
        mock_github(&server, primary_email("octo@example.com")).await;
        let state = Arc::new(state_for(&server).await);
        let started = state
            .oauth_service
            .begin_authorization("github")
            .await
            .unwrap();

        let uri = format!(
            "/api/oauth2/github/callback?code=auth-code&state={}",
            urlencoding::encode(&started.state)
        );
        let response = crate::router::app_router(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("http://localhost/auth/success?token="));

        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=86400"));
    }

    #[tokio::test]
    async fn test_browser_link_flow_through_callback() {
        let server = MockServer::start_async().await;
        mock_google(&server, "g-800", "ignored@example.com").await;
        let state = Arc::new(state_for(&server).await);
        let user_id = register_local(&state, "browser@example.com").await;
        let bearer = format!(
            "Bearer {}",
            state.tokens.issue(user_id, "browser@example.com").unwrap()
        );
        let app = crate::router::app_router(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/user/link/google/auth")
                    .header(header::AUTHORIZATION, &bearer)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let started: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let link_state = started["state"].as_str().unwrap().to_string();

        let callback_uri = format!(
            "/api/oauth2/google/callback?code=auth-code&state={}",
            urlencoding::encode(&link_state)
        );
        let response = app
            .clone()
            .oneshot(Request::builder().uri(callback_uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("http://localhost/account/link?provider=google&code=auth-code&state="));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/user/link/google")
                    .header(header::AUTHORIZATION, &bearer)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "code": "auth-code", "state": link_state }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let user: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(user["google_linked"], true);
        assert_eq!(user["email"], "browser@example.com");
    }

    #[tokio::test]
    async fn test_callback_with_provider_error_is_bad_request() {
        let state = Arc::new(AppState::for_tests().await);

        let response = crate::router::app_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/oauth2/google/callback?error=access_denied&state=x")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_auth_url_route_rejects_unknown_provider() {
        let state = Arc::new(AppState::for_tests().await);

        let response = crate::router::app_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/oauth2/twitter/auth")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_link_route_requires_bearer_token() {
        let state = Arc::new(AppState::for_tests().await);

        let response = crate::router::app_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/user/link/google")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"code":"c","state":"s"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
