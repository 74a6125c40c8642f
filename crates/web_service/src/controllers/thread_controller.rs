//! Thread CRUD surface.
//!
//! All routes require the session cookie; every response uses the
//! `{ success, thread | threads, error?, authRequired? }` envelope.

use actix_web::{
    web::{self, Data, Json, Path},
    HttpResponse,
};
use log::info;
use thread_store::ThreadPatch;

use crate::auth::AuthedUser;
use crate::dto::{
    CreateThreadRequest, DeleteResponse, ThreadResponse, ThreadsResponse, UpdateThreadRequest,
};
use crate::error::{AppError, Result};
use crate::server::AppState;

/// GET /v1/threads
pub async fn list_threads(
    user: AuthedUser,
    state: Data<AppState>,
) -> Result<HttpResponse> {
    let threads = state.thread_store.list(&user.0).await?;
    Ok(HttpResponse::Ok().json(ThreadsResponse {
        success: true,
        threads,
    }))
}

/// POST /v1/threads
pub async fn create_thread(
    user: AuthedUser,
    req: Json<CreateThreadRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let thread = state
        .thread_store
        .create(&user.0, &req.title, req.messages, &req.model)
        .await?;
    info!("created thread {} for user {}", thread.id, user.0);
    Ok(HttpResponse::Ok().json(ThreadResponse {
        success: true,
        thread,
    }))
}

/// GET /v1/threads/{id}
pub async fn get_thread(
    user: AuthedUser,
    path: Path<String>,
    state: Data<AppState>,
) -> Result<HttpResponse> {
    let thread_id = path.into_inner();
    let thread = state
        .thread_store
        .get(&user.0, &thread_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(ThreadResponse {
        success: true,
        thread,
    }))
}

/// PUT /v1/threads/{id}
pub async fn update_thread(
    user: AuthedUser,
    path: Path<String>,
    req: Json<UpdateThreadRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse> {
    let thread_id = path.into_inner();
    let req = req.into_inner();
    let patch = ThreadPatch {
        title: req.title,
        messages: req.messages,
        model: req.model,
    };
    let thread = state
        .thread_store
        .update(&user.0, &thread_id, patch)
        .await?;
    Ok(HttpResponse::Ok().json(ThreadResponse {
        success: true,
        thread,
    }))
}

/// DELETE /v1/threads/{id}
pub async fn delete_thread(
    user: AuthedUser,
    path: Path<String>,
    state: Data<AppState>,
) -> Result<HttpResponse> {
    let thread_id = path.into_inner();
    if !state.thread_store.delete(&user.0, &thread_id).await? {
        return Err(AppError::NotFound);
    }
    info!("deleted thread {} for user {}", thread_id, user.0);
    Ok(HttpResponse::Ok().json(DeleteResponse { success: true }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/threads")
            .route("", web::get().to(list_threads))
            .route("", web::post().to(create_thread))
            .route("/{id}", web::get().to(get_thread))
            .route("/{id}", web::put().to(update_thread))
            .route("/{id}", web::delete().to(delete_thread)),
    );
}
