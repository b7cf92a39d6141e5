// Demo routes exercised through the axum router
#[cfg(test)]
mod test {
    use std::sync::Arc;

    use actionkit::{
        Executor, TracingActionLog,
        app::{self, API_KEY_HEADER, AppState},
        config::models::StreamingConfig,
    };
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt; // for oneshot

    fn streaming(tick: &str, cancel_after: &str) -> StreamingConfig {
        StreamingConfig {
            tick_interval: tick.to_string(),
            cancel_after: cancel_after.to_string(),
            websocket_interval: tick.to_string(),
        }
    }

    fn test_router(config: &StreamingConfig) -> Router {
        let state = AppState::new(
            config,
            Executor::ambient(),
            Arc::new(TracingActionLog::new()),
            CancellationToken::new(),
        )
        .unwrap();
        app::router(state)
    }

    async fn get(router: Router, request: Request<Body>) -> Response {
        router.oneshot(request).await.unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_hello() {
        let router = test_router(&StreamingConfig::default());
        let response = get(
            router,
            Request::builder().uri("/api/hello").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_string(response).await, "Hello World!\n");
    }

    #[tokio::test]
    async fn test_private_requires_api_key() {
        let router = test_router(&StreamingConfig::default());
        let response = get(
            router,
            Request::builder().uri("/api/private").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        // request_id runs before the header check
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_string(response).await, "Missing x-api-key header\n");
    }

    #[tokio::test]
    async fn test_private_with_api_key() {
        let router = test_router(&StreamingConfig::default());
        let response = get(
            router,
            Request::builder()
                .uri("/api/private")
                .header(API_KEY_HEADER, "secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let request_id = response
            .headers()
            .get("x-request-id")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();

        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["request_id"], request_id.as_str());
        assert_eq!(body["authorized"], true);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sse_stream_ends_after_deadline() {
        let router = test_router(&streaming("1s", "3500ms"));
        let response = get(
            router,
            Request::builder().uri("/api/sse").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );

        let body = body_string(response).await;
        let events: Vec<&str> = body
            .split("\n\n")
            .filter(|event| !event.is_empty())
            .collect();
        assert_eq!(events.len(), 4);
        for event in events {
            let json: serde_json::Value =
                serde_json::from_str(event.strip_prefix("data: ").unwrap()).unwrap();
            assert!(json["time"].is_i64());
            assert_eq!(json["value"], "");
        }
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let router = test_router(&StreamingConfig::default());
        let response = get(
            router,
            Request::builder().uri("/api/missing").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_streaming_config_is_rejected() {
        let result = AppState::new(
            &streaming("often", "5s"),
            Executor::ambient(),
            Arc::new(TracingActionLog::new()),
            CancellationToken::new(),
        );
        assert!(result.is_err());
    }
}
