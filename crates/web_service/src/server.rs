use std::collections::HashSet;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use chat_core::Config;
use log::{error, info};
use provider_client::ProviderClient;
use thread_store::{FileKvStorage, ThreadStore};

use crate::controllers::{chat_controller, system_controller, thread_controller};

const DEFAULT_WORKER_COUNT: usize = 10;

pub struct AppState {
    pub config: Config,
    pub provider_client: ProviderClient,
    pub thread_store: ThreadStore<FileKvStorage>,
    /// Thread ids with a turn currently streaming; one in-flight turn per
    /// thread.
    in_flight: Mutex<HashSet<String>>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let provider_client = ProviderClient::new(config.clone())?;
        let thread_store = ThreadStore::new(FileKvStorage::new(&config.data_dir));
        Ok(Self {
            config,
            provider_client,
            thread_store,
            in_flight: Mutex::new(HashSet::new()),
        })
    }

    /// Mark a thread as having an in-flight turn. Returns false when one is
    /// already streaming.
    pub fn begin_turn(&self, thread_id: &str) -> bool {
        self.in_flight
            .lock()
            .map(|mut set| set.insert(thread_id.to_string()))
            .unwrap_or(false)
    }

    pub fn finish_turn(&self, thread_id: &str) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(thread_id);
        }
    }
}

pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1")
            .configure(thread_controller::config)
            .configure(chat_controller::config)
            .configure(system_controller::config),
    );
}

pub async fn run(config: Config) -> Result<(), String> {
    info!("Starting web service...");

    let port = config.port;
    let state = AppState::new(config).map_err(|e| format!("Failed to build app state: {e}"))?;
    let app_state = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Cors::permissive())
            .configure(app_config)
    })
    .workers(DEFAULT_WORKER_COUNT)
    .bind(format!("127.0.0.1:{port}"))
    .map_err(|e| format!("Failed to bind server: {e}"))?
    .run();

    info!("Web service listening on http://127.0.0.1:{port}");

    if let Err(e) = server.await {
        error!("Web server error: {}", e);
        return Err(format!("Web server error: {e}"));
    }

    Ok(())
}
