use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub database: String,
}

impl HealthReport {
    pub fn connected() -> Self {
        Self {
            status: "OK".to_string(),
            database: "connected".to_string(),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            status: "ERROR".to_string(),
            database: "disconnected".to_string(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "OK"
    }
}
