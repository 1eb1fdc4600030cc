use chrono::Utc;

use crate::auth;
use crate::db::models::{ImageAttachment, RequestStatus, RequestType, ServiceRequest, User};
use crate::db::slots::{self, DynSlotStore, REQUESTS_SLOT};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct NewServiceRequest {
    pub title: String,
    pub description: String,
    pub kind: RequestType,
    pub budget: Option<f64>,
    pub skills: String,
    pub deadline: String,
    pub reference_images: Vec<ImageAttachment>,
    pub what_is_needed: String,
}

/// Service requests posted by users looking to hire.
#[derive(Clone)]
pub struct ServiceRequests {
    store: DynSlotStore,
}

impl ServiceRequests {
    pub fn new(store: DynSlotStore) -> Self {
        Self { store }
    }

    /// All requests, newest first (the feed order).
    pub async fn list(&self) -> AppResult<Vec<ServiceRequest>> {
        let mut requests = slots::load_records::<ServiceRequest>(self.store.as_ref(), REQUESTS_SLOT)
            .await?
            .records;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    pub async fn find(&self, id: &str) -> AppResult<Option<ServiceRequest>> {
        Ok(self.list().await?.into_iter().find(|r| r.id == id))
    }

    /// Post a request. Paid requests must carry a positive budget;
    /// volunteer requests never carry one. Always opens as `aberto`.
    pub async fn create(&self, requester: &User, input: NewServiceRequest) -> AppResult<ServiceRequest> {
        if input.title.trim().is_empty()
            || input.description.trim().is_empty()
            || input.what_is_needed.trim().is_empty()
        {
            return Err(AppError::Validation(
                "Title, description and what is needed are required".into(),
            ));
        }

        let budget = match input.kind {
            RequestType::Remunerado => match input.budget {
                Some(b) if b > 0.0 && b.is_finite() => Some(b),
                _ => {
                    return Err(AppError::Validation(
                        "A positive budget is required for paid requests".into(),
                    ))
                }
            },
            RequestType::Voluntario => None,
        };

        let request = ServiceRequest {
            id: uuid::Uuid::now_v7().to_string(),
            title: input.title,
            description: input.description,
            kind: input.kind,
            budget,
            skills: input.skills,
            deadline: input.deadline,
            reference_images: input.reference_images,
            what_is_needed: input.what_is_needed,
            requester_id: requester.id.clone(),
            requester_name: requester.username.clone(),
            requester_avatar: requester.avatar.clone(),
            created_at: Utc::now(),
            status: RequestStatus::Aberto,
        };

        self.insert(request).await
    }

    /// Append a fully-formed record (REST surface path).
    pub async fn insert(&self, request: ServiceRequest) -> AppResult<ServiceRequest> {
        slots::update_records(
            self.store.as_ref(),
            REQUESTS_SLOT,
            |requests: &mut Vec<ServiceRequest>| -> AppResult<()> {
                requests.push(request.clone());
                Ok(())
            },
        )
        .await?;
        Ok(request)
    }

    /// Remove one request. Requester only.
    pub async fn delete(&self, user: &User, id: &str) -> AppResult<()> {
        let id = id.to_string();
        let user = user.clone();
        slots::update_records(
            self.store.as_ref(),
            REQUESTS_SLOT,
            move |requests: &mut Vec<ServiceRequest>| {
                let request = requests
                    .iter()
                    .find(|r| r.id == id)
                    .ok_or(AppError::NotFound)?;
                auth::ensure_owner(&user, &request.requester_id)?;
                requests.retain(|r| r.id != id);
                Ok(())
            },
        )
        .await
    }
}
