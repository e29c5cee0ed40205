#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ComponentStatus {
    Running,
    Connected,
    Disconnected,
}

impl<T> From<&crate::Result<T>> for ComponentStatus {
    fn from(check: &crate::Result<T>) -> Self {
        if check.is_ok() {
            Self::Connected
        } else {
            Self::Disconnected
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub api: ComponentStatus,
    pub ethereum: ComponentStatus,
    pub database: ComponentStatus,
}
