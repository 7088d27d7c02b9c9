use std::net::SocketAddr;

use reqwest::Client;
use serde_json::Value;

use server::config::AppConfig;
use server::state::AppState;

pub mod routes {
    pub const HEALTH: &str = "/health";
    pub const TASKS: &str = "/api/tasks";
    pub const OPENAPI: &str = "/api-docs/openapi.json";

    pub fn task(task_id: &str) -> String {
        format!("/api/tasks/{task_id}")
    }
}

/// A running collector bound to an ephemeral port.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let mut config = AppConfig::default();
        config.server.port = 0;
        let app = server::build_router(AppState::new(config));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }
}

/// A complete, valid `POST /api/tasks` body.
pub fn task_body(task_id: &str, sector: &str) -> Value {
    serde_json::json!({
        "task_id": task_id,
        "task_name": task_id.split_once('_').map(|(_, n)| n).unwrap_or(task_id),
        "sector": sector,
        "occupation": "Compliance Officers",
        "instruction": "List every compliance gap you can find in the attached memo.",
        "difficulty": "hard",
        "expert_time_min": 120,
        "junior_time_min": 330,
        "rubrics": [
            {"name": "Accuracy", "description": "Every gap is real", "points": 10},
            {"name": "Coverage", "description": null, "points": 15},
            {"name": "Clarity", "description": null, "points": 5}
        ],
        "solution_files": [{"name": "answer.txt", "size": 28, "extension": "txt"}],
        "data_files": [],
        "task_yaml": "instruction: |-\n  List every compliance gap.\n",
        "solution_sh": "#!/bin/bash\nexit 0\n"
    })
}
