mod store;

pub use store::{JsonStore, APP_DIR_NAME, PROJECT_DIR_NAME};
