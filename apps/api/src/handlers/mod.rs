pub mod assistant;
pub mod health;
pub mod recommendations;

pub use assistant::assistant_config;
pub use health::health_check;
pub use recommendations::recommendations_config;
