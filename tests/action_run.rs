// Running actions: the timed hello scenario and execution pool selection
#[cfg(test)]
mod test {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use actionkit::{
        Action, ActionError, ActionLog, ActionResult, ActionStep, Executor, RequestContext,
        steps,
    };
    use http::{Request, StatusCode};

    #[derive(Default)]
    struct RecordingLog {
        before: Mutex<Vec<String>>,
        after: Mutex<Vec<(String, Duration)>>,
    }

    impl ActionLog for RecordingLog {
        fn before(&self, ctx: &RequestContext) {
            self.before.lock().unwrap().push(ctx.path().to_string());
        }

        fn after(&self, ctx: &RequestContext, elapsed: Duration) {
            self.after
                .lock()
                .unwrap()
                .push((ctx.path().to_string(), elapsed));
        }
    }

    fn context_for(uri: &str) -> RequestContext {
        let (parts, ()) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        RequestContext::new(parts, Default::default())
    }

    fn thread_name() -> String {
        std::thread::current().name().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_logged_hello_world() {
        let log = Arc::new(RecordingLog::default());
        let result = steps::logged(log.clone())
            .sync(|_ctx| ActionResult::ok().text("Hello World!\n"))
            .with_context(context_for("/api/hello"))
            .run()
            .await;

        assert_eq!(result.status(), StatusCode::OK);
        assert_eq!(result.body_text(), Some("Hello World!\n"));
        assert_eq!(result.content_type(), Some("text/plain; charset=utf-8"));

        assert_eq!(*log.before.lock().unwrap(), ["/api/hello"]);
        let after = log.after.lock().unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].0, "/api/hello");
        assert!(after[0].1 >= Duration::ZERO);
    }

    #[tokio::test]
    async fn test_logged_times_async_block() {
        let log = Arc::new(RecordingLog::default());
        let result = steps::logged(log.clone())
            .asynchronous(|_ctx| async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<_, ActionError>(ActionResult::ok())
            })
            .run()
            .await;

        assert_eq!(result.status(), StatusCode::OK);
        let after = log.after.lock().unwrap();
        assert_eq!(after.len(), 1);
        assert!(after[0].1 >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_with_executor_runs_block_on_dedicated_pool() {
        let pool = Executor::dedicated(2, "hello-pool").unwrap();
        let result = Action::sync(|_ctx| ActionResult::ok().text(thread_name()))
            .with_executor(pool.clone())
            .run()
            .await;

        assert_eq!(result.body_text(), Some("hello-pool"));
        assert_eq!(pool.name(), "hello-pool");
    }

    #[tokio::test]
    async fn test_last_executor_set_wins() {
        let first = Executor::dedicated(1, "first-pool").unwrap();
        let second = Executor::dedicated(1, "second-pool").unwrap();

        let action = ActionStep::identity()
            .asynchronous_on(first, |_ctx| async {
                Ok::<_, ActionError>(ActionResult::ok().text(thread_name()))
            })
            .with_executor(second);

        assert_eq!(action.executor().name(), "second-pool");
        assert_eq!(action.run().await.body_text(), Some("second-pool"));
    }

    #[tokio::test]
    async fn test_steps_run_on_the_action_pool() {
        let pool = Executor::dedicated(1, "step-pool").unwrap();
        let seen = Arc::new(Mutex::new(String::new()));
        let recorder = {
            let seen = seen.clone();
            ActionStep::new(move |ctx, next| {
                *seen.lock().unwrap() = thread_name();
                next(ctx)
            })
        };

        let result = recorder
            .sync(|_ctx| ActionResult::ok())
            .with_executor(pool)
            .run()
            .await;

        assert_eq!(result.status(), StatusCode::OK);
        assert_eq!(*seen.lock().unwrap(), "step-pool");
    }

    #[tokio::test]
    async fn test_run_is_repeatable() {
        let action = Action::sync(|ctx| ActionResult::ok().text(ctx.path().to_string()))
            .with_context(context_for("/again"));

        for _ in 0..3 {
            assert_eq!(action.run().await.body_text(), Some("/again"));
        }
    }
}
