//! Top-level error handling shared by every handler.

use std::sync::Arc;

use serde_json::json;

use crate::domain::foundation::{field, DocumentPath};
use crate::ports::{DocumentStore, ErrorReport, ErrorReporter, StoreError};

use super::error::HandlerError;

/// Records a caught handler error: logs it, writes the sanitized message
/// onto the owning document and files a report.
///
/// Nothing here fails; secondary errors are logged and dropped.
#[derive(Clone)]
pub struct FailureRecorder {
    store: Arc<dyn DocumentStore>,
    reporter: Arc<dyn ErrorReporter>,
}

/// Where a failure happened.
#[derive(Debug, Clone, Default)]
pub struct FailureContext<'a> {
    pub user: Option<&'a str>,
    /// Document the sanitized message is merged onto, if any.
    pub annotate: Option<&'a DocumentPath>,
    /// Triggering document, reported but not written.
    pub document: Option<&'a DocumentPath>,
    /// Only annotate a document that still exists.
    pub annotate_existing: bool,
}

impl FailureRecorder {
    pub fn new(store: Arc<dyn DocumentStore>, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { store, reporter }
    }

    pub async fn record(
        &self,
        function: &'static str,
        error: &HandlerError,
        context: FailureContext<'_>,
    ) {
        tracing::error!(
            function,
            user = context.user,
            document = context.document.map(|p| p.to_string()),
            error = %error,
            "Trigger handler failed"
        );

        if let Some(path) = context.annotate {
            let fields = field("error", json!(error.user_facing_message()));
            let written = if context.annotate_existing {
                self.store.update(path, fields).await
            } else {
                self.store.merge(path, fields).await
            };
            match written {
                Ok(()) => {}
                Err(StoreError::NotFound(_)) => {
                    tracing::debug!(function, path = %path, "Document is gone, error not written");
                }
                Err(e) => {
                    tracing::warn!(function, path = %path, error = %e, "Failed to write error onto document");
                }
            }
        }

        let mut report = ErrorReport::new(function, error.to_string());
        if let Some(user) = context.user {
            report = report.with_context("user", user);
        }
        if let Some(document) = context.document.or(context.annotate) {
            report = report.with_context("document", document.to_string());
        }
        if let Err(e) = self.reporter.report(report).await {
            tracing::warn!(function, error = %e, "Failed to report error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::reporting::InMemoryErrorReporter;
    use crate::adapters::store::InMemoryDocumentStore;
    use crate::ports::PaymentError;

    fn recorder() -> (FailureRecorder, Arc<InMemoryDocumentStore>, Arc<InMemoryErrorReporter>) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let reporter = Arc::new(InMemoryErrorReporter::new());
        (
            FailureRecorder::new(store.clone(), reporter.clone()),
            store,
            reporter,
        )
    }

    #[tokio::test]
    async fn writes_sanitized_message_and_reports_raw_one() {
        let (recorder, store, reporter) = recorder();
        let path = DocumentPath::parse("customers/u1/payments/p1").unwrap();
        let error: HandlerError = PaymentError::Network("connection reset".into()).into();

        recorder
            .record(
                "create_payment_intent",
                &error,
                FailureContext {
                    user: Some("u1"),
                    annotate: Some(&path),
                    document: Some(&path),
                    annotate_existing: false,
                },
            )
            .await;

        let doc = store.document(&path).unwrap();
        assert_eq!(
            doc.get("error"),
            Some(&json!("An error occurred, developers have been alerted"))
        );
        let reports = reporter.reports_for("create_payment_intent");
        assert_eq!(reports.len(), 1);
        assert!(reports[0].message.contains("connection reset"));
        assert_eq!(reports[0].context["user"], "u1");
        assert_eq!(reports[0].context["document"], "customers/u1/payments/p1");
    }

    #[tokio::test]
    async fn report_only_leaves_store_untouched() {
        let (recorder, store, reporter) = recorder();
        let error: HandlerError = PaymentError::Network("down".into()).into();

        recorder
            .record(
                "cleanup_user",
                &error,
                FailureContext {
                    user: Some("u1"),
                    ..Default::default()
                },
            )
            .await;

        assert!(store.is_empty());
        assert_eq!(reporter.reports().len(), 1);
    }

    #[tokio::test]
    async fn existing_only_annotation_skips_deleted_documents() {
        let (recorder, store, reporter) = recorder();
        let owner = DocumentPath::parse("customers/u1").unwrap();
        let card = DocumentPath::parse("customers/u1/payment_methods/pm_1").unwrap();
        let error: HandlerError = PaymentError::Network("down".into()).into();

        recorder
            .record(
                "detach_payment_method",
                &error,
                FailureContext {
                    user: Some("u1"),
                    annotate: Some(&owner),
                    document: Some(&card),
                    annotate_existing: true,
                },
            )
            .await;

        assert!(store.is_empty());
        let reports = reporter.reports_for("detach_payment_method");
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].context["document"], "customers/u1/payment_methods/pm_1");
    }
}
