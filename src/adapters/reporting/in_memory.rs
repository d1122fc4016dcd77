//! In-memory error reporter for testing.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{ErrorReport, ErrorReporter, ReportError};

#[derive(Default)]
pub struct InMemoryErrorReporter {
    reports: Mutex<Vec<ErrorReport>>,
}

impl InMemoryErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ErrorReport> {
        self.reports.lock().unwrap().clone()
    }

    /// Reports filed by one handler.
    pub fn reports_for(&self, function: &str) -> Vec<ErrorReport> {
        self.reports()
            .into_iter()
            .filter(|r| r.function == function)
            .collect()
    }
}

#[async_trait]
impl ErrorReporter for InMemoryErrorReporter {
    async fn report(&self, report: ErrorReport) -> Result<(), ReportError> {
        self.reports.lock().unwrap().push(report);
        Ok(())
    }
}
