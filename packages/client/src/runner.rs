//! Interactive client loop.

use rustyline::{DefaultEditor, error::ReadlineError};
use terakoya_shared::protocol::{SendMessagePayload, event};
use tokio::sync::{broadcast::error::RecvError, mpsc};

use crate::{
    command::Command,
    formatter::MessageFormatter,
    socket::{SocketConfig, SocketService, handler},
    ui::print_with_prompt,
};

/// Run the interactive client until `/quit`, Ctrl+C or Ctrl+D
pub async fn run_client(
    url: String,
    user_id: String,
    auto_reconnect: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = SocketService::new(SocketConfig::new(url.clone()));

    // State changes
    let mut states = service.subscribe_state();
    let prompt_user = user_id.clone();
    let state_task = tokio::spawn(async move {
        loop {
            match states.recv().await {
                Ok(state) => {
                    print_with_prompt(&MessageFormatter::format_state(state), &prompt_user)
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Skipped {} state change(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let prompt_user = user_id.clone();
    service.on_new_message(handler(move |payload| {
        print_with_prompt(&MessageFormatter::format_new_message(payload), &prompt_user);
        Ok(())
    }));
    let prompt_user = user_id.clone();
    service.on(
        event::RECONNECT_FAILED,
        handler(move |_| {
            print_with_prompt(
                "\nGave up reconnecting. Type /reconnect to try again.\n",
                &prompt_user,
            );
            Ok(())
        }),
    );

    tracing::info!("Connecting to {} as '{}'", url, user_id);
    service.connect(user_id.clone(), auto_reconnect).await;
    println!(
        "\nYou are '{}'. Send with '@user message', '/help' for commands. Press Ctrl+C to exit.\n",
        user_id
    );

    let mut input_rx = spawn_readline(user_id.clone());
    while let Some(line) = input_rx.recv().await {
        match Command::parse(&line) {
            Command::Send { to, content } => {
                let payload = SendMessagePayload {
                    to: to.clone(),
                    content,
                };
                match service.emit_with_ack(event::SEND_MESSAGE, &payload).await {
                    Ok(ack) => {
                        print_with_prompt(&MessageFormatter::format_delivery(&to, &ack), &user_id)
                    }
                    Err(e) => {
                        print_with_prompt(&format!("failed to send: {}\n", e), &user_id)
                    }
                }
            }
            Command::Reconnect => {
                if let Err(e) = service.reconnect().await {
                    print_with_prompt(&format!("{}\n", e), &user_id);
                }
            }
            Command::Help => print_with_prompt(&MessageFormatter::format_help(), &user_id),
            Command::Invalid(hint) => print_with_prompt(&format!("{}\n", hint), &user_id),
            Command::Quit => break,
        }
    }

    service.disconnect(true).await;
    state_task.abort();
    tracing::info!("Client session ended normally");
    Ok(())
}

/// Read lines on a blocking thread (rustyline is synchronous)
fn spawn_readline(user_id: String) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", user_id);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}
