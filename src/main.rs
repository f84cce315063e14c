use std::sync::Arc;

use weatherify::{config, error, info, management::CredentialStore, server};

#[tokio::main]
async fn main() {
    config::load_env();

    let store_path = config::store_path();
    let store = match CredentialStore::open(store_path.clone()).await {
        Ok(store) => Arc::new(store),
        Err(e) => error!("Failed to open credential store at {:?}: {:?}", store_path, e),
    };

    let state = Arc::new(server::AppState::from_env(store));

    info!("Listening on {}", config::server_addr());
    server::start_api_server(state).await;
}
