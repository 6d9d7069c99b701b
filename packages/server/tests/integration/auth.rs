use serde_json::json;

use crate::common::{TestApp, TestResponse, routes};

mod bootstrap {
    use super::*;

    #[tokio::test]
    async fn first_account_becomes_admin_and_gets_a_token() {
        let app = TestApp::spawn().await;

        let res = app
            .post_anon(
                routes::REGISTER,
                &json!({"username": "marta", "password": "deckhand-pass1"}),
            )
            .await;

        assert_eq!(res.status, 201);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["user"]["username"], "marta");
        assert_eq!(res.body["user"]["is_admin"], true);
    }

    #[tokio::test]
    async fn anonymous_registration_closes_after_bootstrap() {
        let app = TestApp::spawn().await;
        app.create_admin("marta", "deckhand-pass1").await;

        let res = app
            .post_anon(
                routes::REGISTER,
                &json!({"username": "mallory", "password": "deckhand-pass1"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod registration {
    use super::*;

    #[tokio::test]
    async fn only_admins_may_add_accounts() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("marta", "deckhand-pass1").await;
        let member = app.create_user(&admin, "jonas", "deckhand-pass1").await;

        let new_account = json!({"username": "priya", "password": "deckhand-pass1"});

        let denied = app.post(routes::REGISTER, &new_account, &member).await;
        assert_eq!(denied.status, 403);
        assert_eq!(denied.body["code"], "PERMISSION_DENIED");

        let created = app.post(routes::REGISTER, &new_account, &admin).await;
        assert_eq!(created.status, 201);
        assert_eq!(created.body["user"]["is_admin"], false);
        // Only the bootstrap registration hands out a session token.
        assert!(created.body["token"].is_null());
    }

    #[tokio::test]
    async fn username_collisions_ignore_case() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("Marta", "deckhand-pass1").await;

        let res = app
            .post(
                routes::REGISTER,
                &json!({"username": "marta", "password": "deckhand-pass1"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn rejects_invalid_passwords() {
        let app = TestApp::spawn().await;
        let overlong = "a".repeat(129);

        for bad in ["short", overlong.as_str()] {
            let res = app
                .post_anon(
                    routes::REGISTER,
                    &json!({"username": "marta", "password": bad}),
                )
                .await;
            assert_eq!(res.status, 400, "password {bad:?} should be rejected");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn rejects_blank_and_overlong_usernames() {
        let app = TestApp::spawn().await;
        let overlong = "a".repeat(65);

        for bad in ["   ", overlong.as_str()] {
            let res = app
                .post_anon(
                    routes::REGISTER,
                    &json!({"username": bad, "password": "deckhand-pass1"}),
                )
                .await;
            assert_eq!(res.status, 400, "username {bad:?} should be rejected");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn valid_credentials_return_a_session_token() {
        let app = TestApp::spawn().await;
        app.create_admin("marta", "deckhand-pass1").await;

        let res = app
            .post_anon(
                routes::LOGIN,
                &json!({"username": "marta", "password": "deckhand-pass1"}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["user"]["username"], "marta");
    }

    #[tokio::test]
    async fn username_match_ignores_case_but_keeps_display_form() {
        let app = TestApp::spawn().await;
        app.create_admin("Marta", "deckhand-pass1").await;

        let res = app
            .post_anon(
                routes::LOGIN,
                &json!({"username": "mArTa", "password": "deckhand-pass1"}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["user"]["username"], "Marta");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_read_the_same() {
        let app = TestApp::spawn().await;
        app.create_admin("marta", "deckhand-pass1").await;

        let attempts = [
            json!({"username": "marta", "password": "not-the-password"}),
            json!({"username": "nobody", "password": "deckhand-pass1"}),
        ];
        for creds in attempts {
            let res = app.post_anon(routes::LOGIN, &creds).await;
            assert_eq!(res.status, 401);
            assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
        }
    }
}

mod bad_requests {
    use super::*;

    #[tokio::test]
    async fn non_json_body_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let raw = app
            .client
            .post(format!("http://{}{}", app.addr, routes::REGISTER))
            .header("Content-Type", "application/json")
            .body("registration please")
            .send()
            .await
            .unwrap();

        let res = TestResponse::read(raw).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn missing_and_blank_fields_are_validation_errors() {
        let app = TestApp::spawn().await;

        let missing = app
            .post_anon(routes::REGISTER, &json!({"username": "marta"}))
            .await;
        assert_eq!(missing.status, 400);
        assert_eq!(missing.body["code"], "VALIDATION_ERROR");

        let blank = app
            .post_anon(routes::LOGIN, &json!({"username": "", "password": ""}))
            .await;
        assert_eq!(blank.status, 400);
        assert_eq!(blank.body["code"], "VALIDATION_ERROR");
    }
}

mod tokens {
    use super::*;

    #[tokio::test]
    async fn me_reflects_the_authenticated_account() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("marta", "deckhand-pass1").await;

        let res = app.get(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["username"], "marta");
        assert!(res.body["id"].is_string());
        assert_eq!(res.body["is_admin"], true);
    }

    #[tokio::test]
    async fn request_without_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_anon(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_bearer_token_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_admin("marta", "deckhand-pass1").await;

        let res = app.get(routes::ME, "not-a-valid-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected() {
        let app = TestApp::spawn().await;

        let raw = app
            .client
            .get(format!("http://{}{}", app.addr, routes::ME))
            .header("Authorization", "Basic bWFydGE6cGFzcw==")
            .send()
            .await
            .unwrap();

        let res = TestResponse::read(raw).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn api_credential_is_accepted_as_a_bearer_token() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("marta", "deckhand-pass1").await;

        let account = app.get(routes::ACCOUNT, &token).await;
        let credential = account.body["api_credential"]
            .as_str()
            .expect("account should have an API credential")
            .to_string();

        let res = app.get(routes::ME, &credential).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["username"], "marta");
    }

    #[tokio::test]
    async fn api_credential_is_accepted_in_the_x_api_token_header() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("marta", "deckhand-pass1").await;

        let account = app.get(routes::ACCOUNT, &token).await;
        let credential = account.body["api_credential"]
            .as_str()
            .expect("account should have an API credential");

        let raw = app
            .client
            .get(format!("http://{}{}", app.addr, routes::ME))
            .header("x-api-token", credential)
            .send()
            .await
            .unwrap();

        let res = TestResponse::read(raw).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["username"], "marta");
    }
}
