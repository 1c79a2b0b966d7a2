use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use chrono::Utc;
use uuid::Uuid;

use dentist_cell::models::DentistError;
use dentist_cell::services::DentistDirectoryService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{CreateReviewRequest, RatingSummary, Review, ReviewError};

pub struct ReviewService {
    supabase: SupabaseClient,
    dentists: DentistDirectoryService,
}

impl ReviewService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            dentists: DentistDirectoryService::new(config),
        }
    }

    /// Create a review and fold it into the dentist's published rating.
    ///
    /// A patient can review a dentist once, and only after having had an
    /// appointment with them.
    pub async fn create_review(
        &self,
        request: CreateReviewRequest,
        user: &User,
        auth_token: &str,
    ) -> Result<Review, ReviewError> {
        debug!("Creating review for dentist: {}", request.dentist_id);

        if !(1..=5).contains(&request.rating) {
            return Err(ReviewError::ValidationError(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        if request.comment.trim().is_empty() {
            return Err(ReviewError::ValidationError(
                "Comment is required".to_string(),
            ));
        }

        self.dentists
            .get_dentist(&request.dentist_id.to_string())
            .await
            .map_err(|e| match e {
                DentistError::NotFound => ReviewError::DentistNotFound,
                other => ReviewError::DatabaseError(other.to_string()),
            })?;

        let visits_path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&dentist_id=eq.{}",
            user.id, request.dentist_id
        );
        let visits: Vec<Value> = self.supabase.request(
            Method::GET,
            &visits_path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ReviewError::DatabaseError(e.to_string()))?;

        if visits.is_empty() {
            return Err(ReviewError::NoAppointmentHistory);
        }

        let existing_path = format!(
            "/rest/v1/reviews?patient_id=eq.{}&dentist_id=eq.{}",
            user.id, request.dentist_id
        );
        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &existing_path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ReviewError::DatabaseError(e.to_string()))?;

        if !existing.is_empty() {
            return Err(ReviewError::DuplicateReview);
        }

        let patient_name = self.fetch_patient_name(&user.id, auth_token).await?;

        let review_data = json!({
            "dentist_id": request.dentist_id,
            "patient_id": user.id,
            "patient_name": patient_name,
            "rating": request.rating,
            "comment": request.comment,
            "date": Utc::now().date_naive(),
            "procedure": request.procedure,
            "dentist_response": null,
            "is_visible": true,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/reviews",
            Some(auth_token),
            Some(review_data),
            Some(headers),
        ).await.map_err(|e| ReviewError::DatabaseError(e.to_string()))?;

        let review: Review = result
            .into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| ReviewError::DatabaseError(e.to_string()))?
            .ok_or_else(|| ReviewError::DatabaseError("Failed to create review".to_string()))?;

        self.refresh_dentist_rating(&review.dentist_id, auth_token).await?;

        debug!("Review created with id: {}", review.id);
        Ok(review)
    }

    /// Visible reviews for a dentist, newest first.
    pub async fn get_reviews_for_dentist(
        &self,
        dentist_id: &str,
    ) -> Result<Vec<Review>, ReviewError> {
        self.visible_reviews(dentist_id, None).await
    }

    /// Aggregate over the visible reviews, computed from the live rows rather
    /// than the cached columns on the dentist.
    pub async fn get_rating_summary(
        &self,
        dentist_id: &str,
    ) -> Result<RatingSummary, ReviewError> {
        let reviews = self.visible_reviews(dentist_id, None).await?;
        Ok(Self::summarize(&reviews))
    }

    /// Attach the dentist's reply to a review of their own practice.
    pub async fn respond_to_review(
        &self,
        review_id: &str,
        response_text: &str,
        user: &User,
        auth_token: &str,
    ) -> Result<Review, ReviewError> {
        if response_text.trim().is_empty() {
            return Err(ReviewError::ValidationError(
                "Response text is required".to_string(),
            ));
        }

        let review = self.get_review(review_id, auth_token).await?;

        match self.dentist_identity(user).await? {
            Some(own_id) if own_id == review.dentist_id => {}
            _ => return Err(ReviewError::NotReviewSubject),
        }

        debug!("Storing dentist response on review: {}", review_id);
        self.patch_review(
            review_id,
            json!({
                "dentist_response": response_text,
                "updated_at": Utc::now().to_rfc3339()
            }),
            auth_token,
        )
        .await
    }

    /// Moderation toggle. Hidden reviews drop out of the listing and the
    /// published rating, so the rollup is refreshed afterwards.
    pub async fn set_review_visibility(
        &self,
        review_id: &str,
        is_visible: bool,
        auth_token: &str,
    ) -> Result<Review, ReviewError> {
        debug!("Setting review {} visibility to {}", review_id, is_visible);

        let review = self
            .patch_review(
                review_id,
                json!({
                    "is_visible": is_visible,
                    "updated_at": Utc::now().to_rfc3339()
                }),
                auth_token,
            )
            .await?;

        self.refresh_dentist_rating(&review.dentist_id, auth_token).await?;

        Ok(review)
    }

    /// Resolve the dentist directory entry behind a dentist-role account.
    pub async fn dentist_identity(&self, user: &User) -> Result<Option<Uuid>, ReviewError> {
        if user.role.as_deref() != Some("dentist") {
            return Ok(None);
        }
        let Some(email) = user.email.as_deref() else {
            return Ok(None);
        };

        let path = format!("/rest/v1/dentists?email=eq.{}", email);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await.map_err(|e| ReviewError::DatabaseError(e.to_string()))?;

        Ok(result
            .first()
            .and_then(|row| row["id"].as_str())
            .and_then(|id| Uuid::parse_str(id).ok()))
    }

    async fn get_review(&self, review_id: &str, auth_token: &str) -> Result<Review, ReviewError> {
        let path = format!("/rest/v1/reviews?id=eq.{}", review_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ReviewError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ReviewError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| ReviewError::DatabaseError(e.to_string()))
    }

    async fn visible_reviews(
        &self,
        dentist_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<Review>, ReviewError> {
        let path = format!(
            "/rest/v1/reviews?dentist_id=eq.{}&is_visible=eq.true&order=created_at.desc",
            dentist_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            auth_token,
            None,
        ).await.map_err(|e| ReviewError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Review>, _>>()
            .map_err(|e| ReviewError::DatabaseError(e.to_string()))
    }

    fn summarize(reviews: &[Review]) -> RatingSummary {
        if reviews.is_empty() {
            return RatingSummary {
                average: 0.0,
                count: 0,
            };
        }
        let sum: i64 = reviews.iter().map(|r| r.rating as i64).sum();
        let average = (sum as f64 / reviews.len() as f64 * 10.0).round() / 10.0;
        RatingSummary {
            average,
            count: reviews.len() as i64,
        }
    }

    /// Recompute the cached rating columns on the dentist row from the
    /// visible reviews. Dentists with no visible reviews go back to 0.
    async fn refresh_dentist_rating(
        &self,
        dentist_id: &Uuid,
        auth_token: &str,
    ) -> Result<(), ReviewError> {
        let reviews = self
            .visible_reviews(&dentist_id.to_string(), Some(auth_token))
            .await?;
        let summary = Self::summarize(&reviews);

        let path = format!("/rest/v1/dentists?id=eq.{}", dentist_id);
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let updated: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({
                "rating": summary.average,
                "review_count": summary.count,
                "updated_at": Utc::now().to_rfc3339()
            })),
            Some(headers),
        ).await.map_err(|e| ReviewError::DatabaseError(e.to_string()))?;

        if updated.is_empty() {
            return Err(ReviewError::DatabaseError(
                "Failed to update dentist rating".to_string(),
            ));
        }

        debug!(
            "Dentist {} rating refreshed to {} across {} reviews",
            dentist_id, summary.average, summary.count
        );
        Ok(())
    }

    async fn patch_review(
        &self,
        review_id: &str,
        update_data: Value,
        auth_token: &str,
    ) -> Result<Review, ReviewError> {
        let path = format!("/rest/v1/reviews?id=eq.{}", review_id);
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(headers),
        ).await.map_err(|e| ReviewError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ReviewError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| ReviewError::DatabaseError(e.to_string()))
    }

    async fn fetch_patient_name(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<String, ReviewError> {
        let path = format!("/rest/v1/users?id=eq.{}", user_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ReviewError::DatabaseError(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| ReviewError::ValidationError("Patient profile not found".to_string()))?;

        let first = row["first_name"].as_str().unwrap_or_default();
        let last = row["last_name"].as_str().unwrap_or_default();
        let full = format!("{} {}", first, last).trim().to_string();
        if !full.is_empty() {
            return Ok(full);
        }

        Ok(row["username"].as_str().unwrap_or("Patient").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn review_with_rating(rating: i32) -> Review {
        Review {
            id: Uuid::new_v4(),
            dentist_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            patient_name: "Test User".to_string(),
            rating,
            comment: "Great experience".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            procedure: None,
            dentist_response: None,
            is_visible: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        let reviews: Vec<Review> = [5, 4, 4].into_iter().map(review_with_rating).collect();
        let summary = ReviewService::summarize(&reviews);
        assert_eq!(summary.average, 4.3);
        assert_eq!(summary.count, 3);
    }

    #[test]
    fn no_reviews_means_zero_rating() {
        let summary = ReviewService::summarize(&[]);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.count, 0);
    }

    #[test]
    fn single_review_average_is_its_rating() {
        let reviews = vec![review_with_rating(5)];
        let summary = ReviewService::summarize(&reviews);
        assert_eq!(summary.average, 5.0);
        assert_eq!(summary.count, 1);
    }
}
