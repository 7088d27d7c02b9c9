use serde_json::json;

use crate::common::{TestApp, routes, task_body};

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_healthy() {
        let app = TestApp::spawn().await;
        let res = app.get(routes::HEALTH).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "healthy");
        assert!(res.body["timestamp"].as_str().is_some());
    }

    #[tokio::test]
    async fn serves_openapi_document() {
        let app = TestApp::spawn().await;
        let res = app.get(routes::OPENAPI).await;

        assert_eq!(res.status, 200);
        assert!(res.body["paths"]["/api/tasks"]["post"].is_object());
        assert!(res.body["paths"]["/api/tasks/{task_id}"]["get"].is_object());
    }
}

mod task_creation {
    use super::*;

    #[tokio::test]
    async fn stores_task_as_pending() {
        let app = TestApp::spawn().await;
        let res = app
            .post(routes::TASKS, &task_body("k3x9q2_sample-task", "Government"))
            .await;

        assert_eq!(res.status, 201, "create failed: {}", res.text);
        assert_eq!(res.body["task_id"], "k3x9q2_sample-task");
        assert_eq!(res.body["task_name"], "sample-task");
        assert_eq!(res.body["status"], "pending");
        assert!(res.body["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(res.body["created_at"].as_str().is_some());
    }

    #[tokio::test]
    async fn duplicate_task_id_conflicts() {
        let app = TestApp::spawn().await;
        let body = task_body("aaaaaa_dup", "Government");
        assert_eq!(app.post(routes::TASKS, &body).await.status, 201);

        let res = app.post(routes::TASKS, &body).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
        assert_eq!(res.body["detail"], "Task with this ID already exists");
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let res = app.post_raw(routes::TASKS, "{\"task_id\": ").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["detail"].as_str().is_some());
    }

    #[tokio::test]
    async fn missing_field_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let mut body = task_body("aaaaaa_x", "Government");
        body.as_object_mut().unwrap().remove("rubrics");
        let res = app.post(routes::TASKS, &body).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn blank_sector_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app.post(routes::TASKS, &task_body("aaaaaa_x", " ")).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["detail"], "sector must not be empty");
    }

    #[tokio::test]
    async fn difficulty_defaults_to_medium() {
        let app = TestApp::spawn().await;
        let mut body = task_body("aaaaaa_x", "Government");
        body.as_object_mut().unwrap().remove("difficulty");
        assert_eq!(app.post(routes::TASKS, &body).await.status, 201);
    }
}

mod task_lookup {
    use super::*;

    #[tokio::test]
    async fn returns_stored_record() {
        let app = TestApp::spawn().await;
        app.post(routes::TASKS, &task_body("abcdef_lookup", "Government"))
            .await;

        let res = app.get(&routes::task("abcdef_lookup")).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["occupation"], "Compliance Officers");
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app.get(&routes::task("nope")).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body, json!({"code": "NOT_FOUND", "detail": "Task not found"}));
    }
}

mod task_listing {
    use super::*;

    async fn seeded() -> TestApp {
        let app = TestApp::spawn().await;
        for (id, sector) in [
            ("aaaaaa_one", "Government"),
            ("bbbbbb_two", "Finance and Insurance"),
            ("cccccc_three", "Government"),
        ] {
            let res = app.post(routes::TASKS, &task_body(id, sector)).await;
            assert_eq!(res.status, 201, "seed failed: {}", res.text);
        }
        app
    }

    fn ids(body: &serde_json::Value) -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|t| t["task_id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let app = seeded().await;
        let res = app.get(routes::TASKS).await;

        assert_eq!(res.status, 200);
        assert_eq!(ids(&res.body), ["cccccc_three", "bbbbbb_two", "aaaaaa_one"]);
    }

    #[tokio::test]
    async fn filters_by_sector() {
        let app = seeded().await;
        let res = app.get(&format!("{}?sector=Government", routes::TASKS)).await;

        assert_eq!(ids(&res.body), ["cccccc_three", "aaaaaa_one"]);
    }

    #[tokio::test]
    async fn pages_with_limit_and_offset() {
        let app = seeded().await;
        let res = app
            .get(&format!("{}?limit=1&offset=1", routes::TASKS))
            .await;

        assert_eq!(ids(&res.body), ["bbbbbb_two"]);
    }

    #[tokio::test]
    async fn status_filter_matches_nothing_yet() {
        let app = seeded().await;
        let res = app.get(&format!("{}?status=approved", routes::TASKS)).await;

        assert_eq!(res.status, 200);
        assert!(res.body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_limit_is_rejected() {
        let app = seeded().await;
        let res = app.get(&format!("{}?limit=lots", routes::TASKS)).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}
