//! CRUD surface over the admin panel resources.
//!
//! Five resources share one shape: paged list with optional search, detail by
//! id, create, update, delete. The panel routes creates through POST with a
//! `_method` marker and updates through PUT.

use reqwest::Method;
use serde_json::{json, Value};

use super::{unwrap_record, unwrap_rows, AdminClient, AdminError};

const TALENT: &str = "talent";
const CANDIDATE: &str = "candidate";
const COMPANY: &str = "company";
const COMPANY_PROPERTY: &str = "company-property";
const JOB_OPENING: &str = "job-opening";

impl AdminClient {
    async fn list(
        &self,
        resource: &str,
        page: u32,
        per_page: u32,
        search: Option<&str>,
    ) -> Result<Vec<Value>, AdminError> {
        let mut query = vec![
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        if let Some(s) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query.push(("search", s.to_string()));
        }
        let body = self.send(Method::GET, resource, &query, None).await?;
        Ok(unwrap_rows(body))
    }

    async fn detail(&self, resource: &str, id: i64) -> Result<Value, AdminError> {
        let body = self
            .send(Method::GET, &format!("{resource}/{id}"), &[], None)
            .await?;
        Ok(unwrap_record(body))
    }

    async fn create(&self, resource: &str, mut payload: Value) -> Result<Value, AdminError> {
        if let Some(map) = payload.as_object_mut() {
            map.insert("_method".to_string(), Value::String("POST".to_string()));
        }
        self.send(Method::POST, resource, &[], Some(&payload)).await
    }

    async fn update(&self, resource: &str, id: i64, payload: Value) -> Result<Value, AdminError> {
        self.send(Method::PUT, &format!("{resource}/{id}"), &[], Some(&payload))
            .await
    }

    async fn delete(&self, resource: &str, id: i64) -> Result<Value, AdminError> {
        self.send(Method::DELETE, &format!("{resource}/{id}"), &[], None)
            .await?;
        Ok(json!({ "deleted": true }))
    }

    // ── Talent ──────────────────────────────────────────────────────────────

    pub async fn list_talents(
        &self,
        page: u32,
        per_page: u32,
        search: Option<&str>,
    ) -> Result<Vec<Value>, AdminError> {
        self.list(TALENT, page, per_page, search).await
    }

    pub async fn talent_detail(&self, id: i64) -> Result<Value, AdminError> {
        self.detail(TALENT, id).await
    }

    pub async fn create_talent(&self, payload: Value) -> Result<Value, AdminError> {
        self.create(TALENT, payload).await
    }

    pub async fn update_talent(&self, id: i64, payload: Value) -> Result<Value, AdminError> {
        self.update(TALENT, id, payload).await
    }

    pub async fn delete_talent(&self, id: i64) -> Result<Value, AdminError> {
        self.delete(TALENT, id).await
    }

    // ── Candidate ───────────────────────────────────────────────────────────

    pub async fn list_candidates(
        &self,
        page: u32,
        per_page: u32,
        search: Option<&str>,
    ) -> Result<Vec<Value>, AdminError> {
        self.list(CANDIDATE, page, per_page, search).await
    }

    pub async fn candidate_detail(&self, id: i64) -> Result<Value, AdminError> {
        self.detail(CANDIDATE, id).await
    }

    pub async fn create_candidate(&self, payload: Value) -> Result<Value, AdminError> {
        self.create(CANDIDATE, payload).await
    }

    pub async fn update_candidate(&self, id: i64, payload: Value) -> Result<Value, AdminError> {
        self.update(CANDIDATE, id, payload).await
    }

    pub async fn delete_candidate(&self, id: i64) -> Result<Value, AdminError> {
        self.delete(CANDIDATE, id).await
    }

    // ── Company ─────────────────────────────────────────────────────────────

    pub async fn list_companies(
        &self,
        page: u32,
        per_page: u32,
        search: Option<&str>,
    ) -> Result<Vec<Value>, AdminError> {
        self.list(COMPANY, page, per_page, search).await
    }

    pub async fn company_detail(&self, id: i64) -> Result<Value, AdminError> {
        self.detail(COMPANY, id).await
    }

    pub async fn create_company(&self, payload: Value) -> Result<Value, AdminError> {
        self.create(COMPANY, payload).await
    }

    pub async fn update_company(&self, id: i64, payload: Value) -> Result<Value, AdminError> {
        self.update(COMPANY, id, payload).await
    }

    pub async fn delete_company(&self, id: i64) -> Result<Value, AdminError> {
        self.delete(COMPANY, id).await
    }

    // ── Company property ────────────────────────────────────────────────────

    pub async fn list_company_properties(
        &self,
        page: u32,
        per_page: u32,
        search: Option<&str>,
    ) -> Result<Vec<Value>, AdminError> {
        self.list(COMPANY_PROPERTY, page, per_page, search).await
    }

    pub async fn company_property_detail(&self, id: i64) -> Result<Value, AdminError> {
        self.detail(COMPANY_PROPERTY, id).await
    }

    pub async fn create_company_property(&self, payload: Value) -> Result<Value, AdminError> {
        self.create(COMPANY_PROPERTY, payload).await
    }

    pub async fn update_company_property(
        &self,
        id: i64,
        payload: Value,
    ) -> Result<Value, AdminError> {
        self.update(COMPANY_PROPERTY, id, payload).await
    }

    pub async fn delete_company_property(&self, id: i64) -> Result<Value, AdminError> {
        self.delete(COMPANY_PROPERTY, id).await
    }

    // ── Job opening ─────────────────────────────────────────────────────────

    pub async fn list_job_openings(
        &self,
        page: u32,
        per_page: u32,
        search: Option<&str>,
    ) -> Result<Vec<Value>, AdminError> {
        self.list(JOB_OPENING, page, per_page, search).await
    }

    pub async fn job_opening_detail(&self, id: i64) -> Result<Value, AdminError> {
        self.detail(JOB_OPENING, id).await
    }

    pub async fn create_job_opening(&self, payload: Value) -> Result<Value, AdminError> {
        self.create(JOB_OPENING, payload).await
    }

    pub async fn update_job_opening(&self, id: i64, payload: Value) -> Result<Value, AdminError> {
        self.update(JOB_OPENING, id, payload).await
    }

    pub async fn delete_job_opening(&self, id: i64) -> Result<Value, AdminError> {
        self.delete(JOB_OPENING, id).await
    }
}
