mod auth;
mod store;

pub use auth::AuthFlow;
pub use store::CredentialStore;
pub use store::StoreError;
