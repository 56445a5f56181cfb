pub mod clock;
pub mod credentials;
pub mod error;
pub mod models;
pub mod settings;
pub mod store;
