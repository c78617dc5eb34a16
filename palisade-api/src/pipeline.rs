//! Request pipeline composition.
//!
//! Orders the security layers around a protected handler:
//!
//! 1. network admission (client address vs. tenant allow-list)
//! 2. identity - the caller supplies an already-resolved [`Subject`]
//! 3. permission resolution (default-deny)
//! 4. the protected handler
//! 5. row filtering over the handler's records
//! 6. field decryption for registered encrypted fields
//! 7. column masking, on the decrypted plaintext
//!
//! Admission and authorization failures short-circuit; the handler never
//! runs for a denied request. Authorization denials surface the opaque
//! [`DENIED_MESSAGE`](crate::error::DENIED_MESSAGE) while the concrete
//! reason goes to the logs.

use crate::error::{ApiError, Result};
use crate::registry::ResourceRegistry;
use palisade_admission::{resolve_client_ip, Admission, NetworkAdmissionGuard, SettingsSource};
use palisade_core::{Record, Subject};
use palisade_crypto::{decrypt_fields, FieldCipher};
use palisade_policy::{
    ColumnMaskEvaluator, PermissionResolver, PolicyStore, RowFilterEvaluator,
};
use std::sync::Arc;

/// A request entering the pipeline.
///
/// The subject comes pre-resolved from the identity collaborator; the
/// proxy headers are carried verbatim so the pipeline can resolve the
/// client address with the fixed precedence.
#[derive(Debug, Clone)]
pub struct ProtectedRequest {
    /// The resolved request identity.
    pub subject: Subject,
    /// Resource type being accessed.
    pub resource: String,
    /// Action being performed (e.g. `READ`).
    pub action: String,
    /// Raw `X-Forwarded-For` header, if present.
    pub x_forwarded_for: Option<String>,
    /// Raw `X-Real-IP` header, if present.
    pub x_real_ip: Option<String>,
}

impl ProtectedRequest {
    /// Create a request with no proxy headers.
    pub fn new(
        subject: Subject,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject,
            resource: resource.into(),
            action: action.into(),
            x_forwarded_for: None,
            x_real_ip: None,
        }
    }

    /// Attach the `X-Forwarded-For` header value.
    pub fn with_forwarded_for(mut self, value: impl Into<String>) -> Self {
        self.x_forwarded_for = Some(value.into());
        self
    }

    /// Attach the `X-Real-IP` header value.
    pub fn with_real_ip(mut self, value: impl Into<String>) -> Self {
        self.x_real_ip = Some(value.into());
        self
    }
}

/// The composed security pipeline around protected handlers.
///
/// All layers are stateless evaluators over shared read-only stores, so
/// one pipeline instance serves concurrent requests without locking.
pub struct RequestPipeline {
    guard: NetworkAdmissionGuard,
    resolver: PermissionResolver,
    row_filter: RowFilterEvaluator,
    column_mask: ColumnMaskEvaluator,
    cipher: Arc<FieldCipher>,
    registry: ResourceRegistry,
}

impl RequestPipeline {
    /// Compose a pipeline from its collaborators.
    pub fn new(
        store: Arc<dyn PolicyStore>,
        settings: Arc<dyn SettingsSource>,
        cipher: Arc<FieldCipher>,
        registry: ResourceRegistry,
    ) -> Self {
        Self {
            guard: NetworkAdmissionGuard::new(settings),
            resolver: PermissionResolver::new(store.clone()),
            row_filter: RowFilterEvaluator::new(store.clone()),
            column_mask: ColumnMaskEvaluator::new(store, cipher.clone()),
            cipher,
            registry,
        }
    }

    /// Run a protected handler under the full pipeline.
    ///
    /// The handler receives the subject and returns the candidate records
    /// for the response; the pipeline filters, decrypts, and masks them
    /// before they reach the caller.
    ///
    /// # Errors
    ///
    /// - [`ApiError::AdmissionDenied`] when the client address fails the
    ///   allow-list check
    /// - [`ApiError::AuthorizationDenied`] (opaque) when permission
    ///   resolution denies
    /// - [`ApiError::Policy`] / [`ApiError::Crypto`] for evaluation and
    ///   decryption failures on the response path
    pub fn execute<F>(&self, request: &ProtectedRequest, handler: F) -> Result<Vec<Record>>
    where
        F: FnOnce(&Subject) -> Result<Vec<Record>>,
    {
        let subject = &request.subject;

        let client_ip = resolve_client_ip(
            request.x_forwarded_for.as_deref(),
            request.x_real_ip.as_deref(),
        );
        if let Admission::Denied { reason } =
            self.guard.check_admission(&client_ip, &subject.tenant_id)
        {
            return Err(ApiError::AdmissionDenied { reason });
        }

        let decision = self
            .resolver
            .resolve(subject, &request.resource, &request.action, None);
        if let Some(reason) = decision.reason() {
            tracing::debug!(
                tenant_id = %subject.tenant_id,
                user_id = %subject.user_id,
                resource = %request.resource,
                action = %request.action,
                reason,
                "request denied"
            );
            return Err(ApiError::authorization_denied());
        }

        let records = handler(subject)?;

        let visible = self
            .row_filter
            .filter_visible(subject, &request.resource, records)?;

        let mut decrypted = visible;
        if let Some(caps) = self.registry.get(&request.resource) {
            for record in &mut decrypted {
                decrypt_fields(
                    &self.cipher,
                    record,
                    &caps.encrypted_fields,
                    &subject.tenant_id,
                )?;
            }
        }

        let masked = self
            .column_mask
            .mask_records(subject, &request.resource, &decrypted)?;
        Ok(masked)
    }
}
