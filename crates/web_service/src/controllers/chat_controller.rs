//! Chat turn endpoint.
//!
//! POST /v1/chat drives one turn: truncate history for the routed provider,
//! call the upstream, and relay aggregated message snapshots to the browser
//! as newline-delimited JSON. The thread is persisted when the turn
//! completes; a cancelled turn leaves nothing new in the store.

use std::convert::Infallible;
use std::sync::Arc;

use actix_web::{
    web::{self, Data, Json},
    HttpResponse,
};
use bytes::Bytes;
use chat_core::Message;
use history_manager::truncate_history;
use log::{error, info};
use provider_client::{route, ChatRequest, StreamEvent, UpstreamError};
use serde_json::json;
use tokio::sync::mpsc::{self, Sender};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use thread_store::ThreadPatch;
use uuid::Uuid;

use crate::auth::AuthedUser;
use crate::dto::ChatTurnRequest;
use crate::error::{AppError, Result};
use crate::server::AppState;

type LineSender = Sender<std::result::Result<Bytes, Infallible>>;

async fn send_line(tx: &LineSender, value: serde_json::Value) -> std::result::Result<(), ()> {
    let mut line = value.to_string();
    line.push('\n');
    tx.send(Ok(Bytes::from(line))).await.map_err(|_| ())
}

/// POST /v1/chat
pub async fn chat(
    user: AuthedUser,
    req: Json<ChatTurnRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse> {
    let req = req.into_inner();

    // Prior conversation comes from the store; the client only sends the
    // new query.
    let prior = match &req.thread_id {
        Some(thread_id) => state
            .thread_store
            .get(&user.0, thread_id)
            .await?
            .ok_or(AppError::NotFound)?
            .messages,
        None => Vec::new(),
    };

    // One in-flight turn per thread. New threads cannot collide, they get
    // their id at completion.
    if let Some(thread_id) = &req.thread_id {
        if !state.begin_turn(thread_id) {
            return Err(AppError::TurnInFlight);
        }
    }

    let mut user_message = Message::user(&req.query);
    user_message.attachments = req.attachments.clone();
    let mut messages = prior;
    messages.push(user_message);

    let provider_route = route(&req.model);
    let history = truncate_history(&messages, provider_route.provider);
    let request = ChatRequest::new(&req.query, &req.model, &history)
        .with_attachments(req.attachments.clone());

    let (line_tx, line_rx) = mpsc::channel::<std::result::Result<Bytes, Infallible>>(32);
    let cancel = CancellationToken::new();
    let message_id = Uuid::new_v4().to_string();

    let state = state.into_inner();
    let user_id = user.0.clone();
    let thread_id = req.thread_id.clone();
    let model = req.model.clone();

    tokio::spawn(async move {
        run_turn(
            state.clone(),
            user_id,
            thread_id.clone(),
            model,
            message_id,
            request,
            messages,
            line_tx,
            cancel,
        )
        .await;
        if let Some(thread_id) = &thread_id {
            state.finish_turn(thread_id);
        }
    });

    Ok(HttpResponse::Ok()
        .content_type("application/x-ndjson")
        .streaming(ReceiverStream::new(line_rx)))
}

#[allow(clippy::too_many_arguments)]
async fn run_turn(
    state: Arc<AppState>,
    user_id: String,
    thread_id: Option<String>,
    model: String,
    message_id: String,
    request: ChatRequest,
    mut messages: Vec<Message>,
    line_tx: LineSender,
    cancel: CancellationToken,
) {
    let result = {
        let (event_tx, mut event_rx) = mpsc::channel::<StreamEvent>(32);
        let forward_tx = line_tx.clone();
        let forward_cancel = cancel.clone();
        let forward = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                let value = match &event {
                    StreamEvent::Snapshot(message) | StreamEvent::Completed(message) => {
                        json!({ "message": message })
                    }
                    StreamEvent::AttachmentUploaded(attachment) => {
                        json!({ "attachment": attachment })
                    }
                };
                if send_line(&forward_tx, value).await.is_err() {
                    // Client went away; abort the upstream read.
                    forward_cancel.cancel();
                    break;
                }
            }
        });

        let result = state
            .provider_client
            .stream_chat(&message_id, &request, &event_tx, &cancel)
            .await;
        drop(event_tx);
        let _ = forward.await;
        result
    };

    match result {
        Ok(assistant) => {
            messages.push(assistant);
            let persisted = match &thread_id {
                Some(thread_id) => {
                    state
                        .thread_store
                        .update(
                            &user_id,
                            thread_id,
                            ThreadPatch {
                                messages: Some(messages),
                                model: Some(model),
                                ..Default::default()
                            },
                        )
                        .await
                }
                None => state.thread_store.create(&user_id, "", messages, &model).await,
            };
            match persisted {
                Ok(thread) => {
                    info!("turn completed for thread {} (user {})", thread.id, user_id);
                    let _ = send_line(&line_tx, json!({ "done": true, "threadId": thread.id })).await;
                }
                Err(err) => {
                    error!("failed to persist thread for user {user_id}: {err}");
                    let app_err: AppError = err.into();
                    let _ = send_line(&line_tx, json!({ "error": app_err.envelope() })).await;
                }
            }
        }
        Err(UpstreamError::Aborted) => {
            // Bytes already relayed stay with the client; nothing persists.
            info!("turn aborted for user {user_id}");
        }
        Err(err) => {
            error!("upstream failure for user {user_id}: {err}");
            let app_err: AppError = err.into();
            let _ = send_line(&line_tx, json!({ "error": app_err.envelope() })).await;
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/chat", web::post().to(chat));
}
