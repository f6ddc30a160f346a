//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::usecase::{GetQuizDetailUseCase, RegisterUserUseCase, SendMessageUseCase};

use super::{
    handler::{get_quiz_detail, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Terakoya HTTP / WebSocket server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     register_user_usecase,
///     send_message_usecase,
///     get_quiz_detail_usecase,
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// RegisterUserUseCase（リアルタイムチャンネルの紐付け）
    register_user_usecase: Arc<RegisterUserUseCase>,
    /// SendMessageUseCase（ユーザー間メッセージの中継）
    send_message_usecase: Arc<SendMessageUseCase>,
    /// GetQuizDetailUseCase（Quiz 詳細の取得）
    get_quiz_detail_usecase: Arc<GetQuizDetailUseCase>,
}

impl Server {
    pub fn new(
        register_user_usecase: Arc<RegisterUserUseCase>,
        send_message_usecase: Arc<SendMessageUseCase>,
        get_quiz_detail_usecase: Arc<GetQuizDetailUseCase>,
    ) -> Self {
        Self {
            register_user_usecase,
            send_message_usecase,
            get_quiz_detail_usecase,
        }
    }

    /// Build the router with all endpoints
    pub fn router(self) -> Router {
        let app_state = Arc::new(AppState {
            register_user_usecase: self.register_user_usecase,
            send_message_usecase: self.send_message_usecase,
            get_quiz_detail_usecase: self.get_quiz_detail_usecase,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/quizzes/{quiz_id}", get(get_quiz_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the server until Ctrl+C
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), std::io::Error> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        tracing::info!("Terakoya server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
