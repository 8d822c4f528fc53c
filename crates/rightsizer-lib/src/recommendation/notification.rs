//! Notifications attached to a recommendation attempt

use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSeverity {
    Critical,
    Error,
    Warning,
    Notice,
    Info,
}

impl fmt::Display for NotificationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationSeverity::Critical => write!(f, "critical"),
            NotificationSeverity::Error => write!(f, "error"),
            NotificationSeverity::Warning => write!(f, "warning"),
            NotificationSeverity::Notice => write!(f, "notice"),
            NotificationSeverity::Info => write!(f, "info"),
        }
    }
}

/// Known notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationCode {
    RecommendationsAvailable,
    CpuRecordsAreIdle,
    CpuRecordsAreZero,
    MemoryRecordsAreZero,
    AcceleratorRecordsAreZero,
}

impl NotificationCode {
    pub fn code(&self) -> u32 {
        match self {
            NotificationCode::RecommendationsAvailable => 111000,
            NotificationCode::CpuRecordsAreIdle => 323001,
            NotificationCode::CpuRecordsAreZero => 323002,
            NotificationCode::MemoryRecordsAreZero => 324001,
            NotificationCode::AcceleratorRecordsAreZero => 325001,
        }
    }

    pub fn severity(&self) -> NotificationSeverity {
        match self {
            NotificationCode::RecommendationsAvailable => NotificationSeverity::Info,
            _ => NotificationSeverity::Notice,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            NotificationCode::RecommendationsAvailable => "Recommendations Are Available",
            NotificationCode::CpuRecordsAreIdle => {
                "CPU Usage is less than a millicore, No CPU Recommendations can be generated"
            }
            NotificationCode::CpuRecordsAreZero => {
                "CPU usage is zero, No CPU Recommendations can be generated"
            }
            NotificationCode::MemoryRecordsAreZero => {
                "Memory Usage is zero, No Memory Recommendations can be generated"
            }
            NotificationCode::AcceleratorRecordsAreZero => {
                "Accelerator usage is zero, No Accelerator Recommendations can be generated"
            }
        }
    }
}

/// A structured warning or info record for the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationNotification {
    pub code: u32,
    pub severity: NotificationSeverity,
    pub message: String,
}

impl RecommendationNotification {
    pub fn is(&self, code: NotificationCode) -> bool {
        self.code == code.code()
    }
}

impl From<NotificationCode> for RecommendationNotification {
    fn from(code: NotificationCode) -> Self {
        Self {
            code: code.code(),
            severity: code.severity(),
            message: code.message().to_string(),
        }
    }
}

impl fmt::Display for RecommendationNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.severity, self.code, self.message)
    }
}
