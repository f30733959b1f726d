use serde::Serialize;

/// Period of the recurring timer
pub const SCHEDULE_RATE_MINUTES: u32 = 5;

/// Fixed-rate timer invoking exactly one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleDecl {
    pub logical_id: String,
    pub rate_minutes: u32,
    pub target: String,
}

impl ScheduleDecl {
    pub fn every(rate_minutes: u32, target: &str) -> Self {
        Self {
            logical_id: "ScheduleRule".to_string(),
            rate_minutes,
            target: target.to_string(),
        }
    }

    /// EventBridge schedule expression
    pub fn expression(&self) -> String {
        match self.rate_minutes {
            1 => "rate(1 minute)".to_string(),
            n => format!("rate({} minutes)", n),
        }
    }
}
