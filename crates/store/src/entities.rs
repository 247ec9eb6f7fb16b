//! Per-table conveniences over [`Repository`].

use funda_core::{
    CaseId, CaseRecord, Draft, Email, MailEntry, TrackingDraft, TrackingSession, UserProfile,
    ValidationError,
};

use crate::error::StoreError;
use crate::repository::Repository;
use crate::store::Patch;

impl Repository<CaseRecord> {
    /// Cases for one phone model, cheapest first.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn by_phone_model(&self, phone_model: &str) -> Result<Vec<CaseRecord>, StoreError> {
        self.filter_by("phone_model", phone_model).await
    }

    /// Cases of one material, cheapest first.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn by_material(&self, material: &str) -> Result<Vec<CaseRecord>, StoreError> {
        self.filter_by("material", material).await
    }

    /// Overwrite the stock level of one case.
    ///
    /// # Errors
    ///
    /// `Invalid` for a negative level, `NotFound` for an unknown id.
    pub async fn update_stock(&self, id: CaseId, stock: i32) -> Result<CaseRecord, StoreError> {
        if stock < 0 {
            return Err(ValidationError::Negative("stock").into());
        }
        self.update_field(id.to_string(), "stock", stock).await
    }
}

impl Repository<MailEntry> {
    /// # Errors
    ///
    /// Store failures.
    pub async fn list_subscribed(&self) -> Result<Vec<MailEntry>, StoreError> {
        self.filter_by("subscribed", true).await
    }

    /// Opt an address in or out. The address is matched in canonical form.
    ///
    /// # Errors
    ///
    /// `Invalid` for a malformed address, `NotFound` when it is not on the list.
    pub async fn set_subscribed(&self, email: &str, subscribed: bool) -> Result<MailEntry, StoreError> {
        let email = Email::parse(email).map_err(ValidationError::from)?;
        self.update_field(email.as_str(), "subscribed", subscribed).await
    }
}

impl Repository<UserProfile> {
    /// # Errors
    ///
    /// Store failures.
    pub async fn by_country(&self, country: &str) -> Result<Vec<UserProfile>, StoreError> {
        self.filter_by("country", country).await
    }
}

impl Repository<TrackingSession> {
    /// Record a new visitor session.
    ///
    /// # Errors
    ///
    /// `Invalid` for a blank session id, `ConstraintViolation` when the
    /// session is already tracked.
    pub async fn track(&self, draft: &TrackingDraft) -> Result<TrackingSession, StoreError> {
        draft.validate()?;
        self.insert_one(draft).await
    }

    /// # Errors
    ///
    /// `NotFound` when the session is not tracked.
    pub async fn by_session(&self, session_id: &str) -> Result<TrackingSession, StoreError> {
        self.find_one("session_id", session_id).await
    }

    /// # Errors
    ///
    /// Store failures.
    pub async fn by_device(&self, device_type: &str) -> Result<Vec<TrackingSession>, StoreError> {
        self.filter_by("device_type", device_type).await
    }

    /// Register another page view: moves `current_page`, bumps `visit_count`
    /// and stamps `last_visit`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the session is not tracked.
    pub async fn record_visit(&self, session_id: &str, page: &str) -> Result<TrackingSession, StoreError> {
        let patch = Patch::new()
            .set("current_page", page)
            .increment("visit_count", 1)
            .now("last_visit");
        self.update(session_id, patch).await
    }
}
