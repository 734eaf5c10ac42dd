pub mod dashboard;
pub mod logging;
pub mod model;
pub mod notifications;
pub mod preferences;
pub mod quotes;
pub mod settings;
