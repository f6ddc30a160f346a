//! Composition root: wires repository, pusher, usecases, scheduler and server.

use std::sync::Arc;

use terakoya_shared::time::Clock;

use crate::{
    config::ServerConfig,
    domain::{MessagePusher, QuizRepository},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::InMemoryQuizRepository,
        seed::{SeedError, load_seed_file},
    },
    scheduler::DeadlineScheduler,
    ui::Server,
    usecase::{
        CloseExpiredQuizzesUseCase, GetQuizDetailUseCase, RegisterUserUseCase,
        SendDeadlineRemindersUseCase, SendMessageUseCase,
    },
};

/// Fully wired application
pub struct Application {
    pub repository: Arc<dyn QuizRepository>,
    pub scheduler: Arc<DeadlineScheduler>,
    pub server: Server,
}

/// Build the application in dependency order:
///
/// 1. Repository (seeded from the fixture file, if any)
/// 2. MessagePusher
/// 3. UseCases
/// 4. DeadlineScheduler (not started)
/// 5. Server
pub async fn build_application(
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> Result<Application, SeedError> {
    // 1. Repository
    let repository: Arc<dyn QuizRepository> = Arc::new(InMemoryQuizRepository::new());
    if let Some(path) = &config.seed {
        let (quizzes, attempts) = load_seed_file(path, repository.as_ref()).await?;
        tracing::info!(
            "Loaded {} quiz(zes) and {} attempt(s) from {}",
            quizzes,
            attempts,
            path.display()
        );
    }

    // 2. MessagePusher
    let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());

    // 3. UseCases
    let close_expired_quizzes = Arc::new(CloseExpiredQuizzesUseCase::new(repository.clone()));
    let reminders = Arc::new(SendDeadlineRemindersUseCase::new(
        repository.clone(),
        message_pusher.clone(),
        clock.clone(),
        config.reminder_window,
    ));
    let register_user = Arc::new(RegisterUserUseCase::new(message_pusher.clone()));
    let send_message = Arc::new(SendMessageUseCase::new(message_pusher.clone(), clock.clone()));
    let get_quiz_detail = Arc::new(GetQuizDetailUseCase::new(repository.clone()));

    // 4. DeadlineScheduler
    let scheduler = Arc::new(DeadlineScheduler::new(
        close_expired_quizzes,
        reminders,
        clock,
        config.scheduler.clone(),
    ));

    // 5. Server
    let server = Server::new(register_user, send_message, get_quiz_detail);

    Ok(Application {
        repository,
        scheduler,
        server,
    })
}
