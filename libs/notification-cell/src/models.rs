use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToastKind::Success => write!(f, "success"),
            ToastKind::Error => write!(f, "error"),
            ToastKind::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ToastKind,
}
