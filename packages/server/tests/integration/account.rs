use serde_json::{Value, json};

use crate::common::{TestApp, routes};

mod profile {
    use super::*;

    #[tokio::test]
    async fn profile_shows_preferences_and_credential() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;

        let res = app.get(routes::ACCOUNT, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["username"], "alice");
        assert_eq!(res.body["hide_media_default"], false);
        assert_eq!(res.body["copy_url_mode"], "view");
        assert_eq!(
            res.body["api_credential"].as_str().map(str::len),
            Some(48)
        );
    }

    #[tokio::test]
    async fn preferences_can_be_updated() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;

        let res = app
            .patch(
                routes::ACCOUNT,
                &json!({"hide_media_default": true, "copy_url_mode": "share"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["hide_media_default"], true);
        assert_eq!(res.body["copy_url_mode"], "share");

        let check = app.get(routes::ACCOUNT, &token).await;
        assert_eq!(check.body["copy_url_mode"], "share");
    }

    #[tokio::test]
    async fn client_config_distinguishes_clearing_from_omitting() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;

        let res = app
            .patch(
                routes::ACCOUNT,
                &json!({"client_config": "{\"theme\":\"dark\"}"}),
                &token,
            )
            .await;
        assert_eq!(res.body["client_config"], "{\"theme\":\"dark\"}");

        // A request without the field leaves the blob alone.
        let res = app
            .patch(routes::ACCOUNT, &json!({"hide_media_default": true}), &token)
            .await;
        assert_eq!(res.body["client_config"], "{\"theme\":\"dark\"}");

        // An explicit null clears it.
        let res = app
            .patch(routes::ACCOUNT, &json!({"client_config": null}), &token)
            .await;
        assert!(res.body["client_config"].is_null());
    }

    #[tokio::test]
    async fn password_change_takes_effect_immediately() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;

        let res = app
            .patch(routes::ACCOUNT, &json!({"password": "evenmoresecure"}), &token)
            .await;
        assert_eq!(res.status, 200);

        let old = app
            .post_anon(
                routes::LOGIN,
                &json!({"username": "alice", "password": "securepass"}),
            )
            .await;
        assert_eq!(old.status, 401);

        let new = app
            .post_anon(
                routes::LOGIN,
                &json!({"username": "alice", "password": "evenmoresecure"}),
            )
            .await;
        assert_eq!(new.status, 200);
    }

    #[tokio::test]
    async fn too_short_replacement_password_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;

        let res = app
            .patch(routes::ACCOUNT, &json!({"password": "short"}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn username_change_propagates_to_owned_files() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;
        let file = app.upload_entry("mine.txt", b"data", &token).await;
        let id = file["id"].as_str().unwrap();

        let res = app
            .patch(routes::ACCOUNT, &json!({"username": "wonderland"}), &token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["username"], "wonderland");

        let check = app.get(&routes::file(id), &token).await;
        assert_eq!(check.body["owner"]["username"], "wonderland");
    }

    #[tokio::test]
    async fn taken_username_is_a_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("alice", "securepass").await;
        let bob = app.create_user(&admin, "bob", "securepass").await;

        let res = app
            .patch(routes::ACCOUNT, &json!({"username": "ALICE"}), &bob)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }
}

mod credential {
    use super::*;

    #[tokio::test]
    async fn regenerating_invalidates_the_old_credential() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;

        let account = app.get(routes::ACCOUNT, &token).await;
        let old = account.body["api_credential"].as_str().unwrap().to_string();

        let res = app
            .post(routes::API_CREDENTIAL, &json!({}), &token)
            .await;
        assert_eq!(res.status, 200);
        let new = res.body["api_credential"].as_str().unwrap().to_string();
        assert_ne!(new, old);
        assert_eq!(new.len(), 48);

        let stale = app.get(routes::ME, &old).await;
        assert_eq!(stale.status, 401);

        let fresh = app.get(routes::ME, &new).await;
        assert_eq!(fresh.status, 200);
    }
}

mod export {
    use super::*;

    #[tokio::test]
    async fn export_bundles_profile_and_files_without_secrets() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;
        app.upload_entry("a.txt", b"a", &token).await;
        app.upload_entry("b.txt", b"b", &token).await;

        let res = app.get_raw(routes::EXPORT, Some(&token)).await;

        assert_eq!(res.status(), 200);
        let disposition = res
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(disposition.contains("skiff-export-alice.json"));

        let body: Value = res.json().await.expect("export should be JSON");
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["files"].as_array().map(Vec::len), Some(2));

        let user = body["user"].as_object().unwrap();
        assert!(!user.contains_key("api_credential"));
        assert!(!user.contains_key("password_hash"));
        assert!(!user.contains_key("is_admin"));
    }

    #[tokio::test]
    async fn export_only_covers_the_requesters_files() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("alice", "securepass").await;
        let bob = app.create_user(&admin, "bob", "securepass").await;
        app.upload_entry("admins.txt", b"a", &admin).await;
        app.upload_entry("bobs.txt", b"b", &bob).await;

        let res = app.get_raw(routes::EXPORT, Some(&admin)).await;
        let body: Value = res.json().await.expect("export should be JSON");

        assert_eq!(body["files"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["files"][0]["name"], "admins.txt");
    }
}

mod sharex {
    use super::*;

    #[tokio::test]
    async fn uploader_config_downloads_with_the_expected_shape() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;

        let res = app.get_raw(routes::SHAREX, Some(&token)).await;

        assert_eq!(res.status(), 200);
        let disposition = res
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(disposition.contains("skiff.sxcu"));

        let body: Value = res.json().await.expect("config should be JSON");
        assert_eq!(body["Version"], "14.1.0");
        assert_eq!(body["FileFormName"], "files");
        assert_eq!(body["Body"], "MultipartFormData");
        assert!(
            body["RequestURL"]
                .as_str()
                .unwrap_or_default()
                .ends_with("/api/v1/files")
        );
        // Default preference copies the private view link.
        assert_eq!(body["URL"], "$json:view_url$");
        assert_eq!(body["DeletionURL"], "$json:download_url$");
        assert_eq!(body["ErrorMessage"], "$json:message$");
    }

    #[tokio::test]
    async fn url_template_follows_the_copy_url_mode() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;
        app.patch(routes::ACCOUNT, &json!({"copy_url_mode": "raw"}), &token)
            .await;

        let res = app.get_raw(routes::SHAREX, Some(&token)).await;
        let body: Value = res.json().await.expect("config should be JSON");

        assert_eq!(body["URL"], "$json:share_raw_url$");
    }

    #[tokio::test]
    async fn embedded_credential_authenticates_uploads() {
        let app = TestApp::spawn().await;
        let token = app.create_admin("alice", "securepass").await;

        let res = app.get_raw(routes::SHAREX, Some(&token)).await;
        let body: Value = res.json().await.expect("config should be JSON");
        let authorization = body["Headers"]["Authorization"].as_str().unwrap();
        let credential = authorization
            .strip_prefix("Bearer ")
            .expect("Authorization should be a bearer value");

        let res = app.upload_one("via-sharex.png", b"\x89PNG", credential).await;
        assert_eq!(res.status, 200, "Upload failed: {}", res.text);
    }
}
