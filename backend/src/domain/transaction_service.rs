//! Transaction service: validation and access rules around transaction storage.
//!
//! ## Key Responsibilities
//! - Validate new transactions (worker in the roster, non-empty service name,
//!   earnings between 0 and [`MAX_EARNINGS`] with at most two decimals)
//!   before they are stored
//! - Scope listings to a single worker for employee callers
//! - Edit comments and delete transactions, reporting unknown ids as not found

use crate::domain::models::NewTransaction;
use crate::errors::{ApiError, ApiResult, ValidationError};
use crate::storage::traits::TransactionStorage;
use chrono::Local;
use rust_decimal::Decimal;
use shared::{CreateTransactionRequest, Transaction, TransactionListRequest, UpdateCommentRequest, Worker};
use std::sync::Arc;
use tracing::info;

pub const MAX_COMMENT_CHARS: usize = 500;

/// Largest accepted amount for one service
pub const MAX_EARNINGS: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

#[derive(Clone)]
pub struct TransactionService {
    storage: Arc<dyn TransactionStorage>,
}

impl TransactionService {
    pub fn new(storage: Arc<dyn TransactionStorage>) -> Self {
        Self { storage }
    }

    /// Transactions in date order; `scope` limits the result to one worker
    pub async fn list_transactions(
        &self,
        request: &TransactionListRequest,
        scope: Option<Worker>,
    ) -> ApiResult<Vec<Transaction>> {
        if let (Some(start), Some(end)) = (request.start_date, request.end_date) {
            if start > end {
                return Err(ValidationError::InvalidQuery(format!(
                    "startDate {} is after endDate {}",
                    start, end
                ))
                .into());
            }
        }

        let transactions = self
            .storage
            .list_transactions(request.start_date, request.end_date)
            .await?;

        Ok(match scope {
            Some(worker) => transactions.into_iter().filter(|t| t.worker == worker).collect(),
            None => transactions,
        })
    }

    pub async fn create_transaction(&self, request: CreateTransactionRequest) -> ApiResult<Transaction> {
        let new_transaction = validate_create(request)?;
        let transaction = self.storage.store_transaction(&new_transaction).await?;
        info!(
            "Created transaction {} for {} ({})",
            transaction.id, transaction.worker, transaction.earnings
        );
        Ok(transaction)
    }

    /// Replace the comment; a blank comment clears it
    pub async fn update_comment(&self, id: i64, request: UpdateCommentRequest) -> ApiResult<Transaction> {
        if request.comment.chars().count() > MAX_COMMENT_CHARS {
            return Err(ValidationError::CommentTooLong { max: MAX_COMMENT_CHARS }.into());
        }

        let trimmed = request.comment.trim();
        let comment = (!trimmed.is_empty()).then_some(trimmed);

        if !self.storage.update_comment(id, comment).await? {
            return Err(not_found(id));
        }

        self.storage
            .get_transaction(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn delete_transaction(&self, id: i64) -> ApiResult<()> {
        if !self.storage.delete_transaction(id).await? {
            return Err(not_found(id));
        }
        info!("Deleted transaction {}", id);
        Ok(())
    }
}

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Transaction {} not found", id))
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn validate_create(request: CreateTransactionRequest) -> Result<NewTransaction, ValidationError> {
    let worker = Worker::parse(&request.worker)
        .ok_or_else(|| ValidationError::UnknownWorker(request.worker.clone()))?;

    let service_name = request.service_name.trim().to_string();
    if service_name.is_empty() {
        return Err(ValidationError::EmptyServiceName);
    }

    if request.earnings < Decimal::ZERO {
        return Err(ValidationError::NegativeEarnings);
    }
    if request.earnings > MAX_EARNINGS {
        return Err(ValidationError::EarningsTooLarge { max: MAX_EARNINGS });
    }
    if request.earnings.normalize().scale() > 2 {
        return Err(ValidationError::EarningsPrecision);
    }

    Ok(NewTransaction {
        worker,
        service_name,
        client: optional_text(request.client),
        time: optional_text(request.time),
        earnings: request.earnings,
        date: request.date.unwrap_or_else(|| Local::now().date_naive()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repositories::TransactionRepository;
    use crate::storage::DbConnection;
    use chrono::NaiveDate;

    async fn setup_test() -> TransactionService {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        TransactionService::new(Arc::new(TransactionRepository::new(db)))
    }

    fn create_request(worker: &str, earnings: Decimal, date: Option<NaiveDate>) -> CreateTransactionRequest {
        CreateTransactionRequest {
            worker: worker.to_string(),
            service_name: "SERVICIO DE IMPRESION".to_string(),
            client: Some("  Carlos Ruiz ".to_string()),
            time: Some("".to_string()),
            earnings,
            date,
        }
    }

    #[test]
    fn test_validate_create_normalizes_fields() {
        let validated = validate_create(create_request("marleni", Decimal::new(1250, 2), None)).unwrap();

        assert_eq!(validated.worker, Worker::Marleni);
        assert_eq!(validated.client.as_deref(), Some("Carlos Ruiz"));
        assert_eq!(validated.time, None);
        assert_eq!(validated.date, Local::now().date_naive());
    }

    #[test]
    fn test_validate_create_rejections() {
        assert_eq!(
            validate_create(create_request("pedro", Decimal::ONE, None)),
            Err(ValidationError::UnknownWorker("pedro".to_string()))
        );
        assert_eq!(
            validate_create(create_request("hengi", Decimal::new(-1, 0), None)),
            Err(ValidationError::NegativeEarnings)
        );
        assert_eq!(
            validate_create(create_request("hengi", Decimal::new(1001, 3), None)),
            Err(ValidationError::EarningsPrecision)
        );
        assert_eq!(
            validate_create(create_request("hengi", MAX_EARNINGS + Decimal::new(1, 2), None)),
            Err(ValidationError::EarningsTooLarge { max: MAX_EARNINGS })
        );
        assert!(validate_create(create_request("hengi", MAX_EARNINGS, None)).is_ok());
        // Trailing zeros do not count as precision
        assert!(validate_create(create_request("hengi", Decimal::new(12500, 3), None)).is_ok());

        let mut blank = create_request("hengi", Decimal::ONE, None);
        blank.service_name = "   ".to_string();
        assert_eq!(validate_create(blank), Err(ValidationError::EmptyServiceName));
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_worker() {
        let service = setup_test().await;
        let day = NaiveDate::from_ymd_opt(2024, 5, 1);

        service.create_transaction(create_request("HENGI", Decimal::new(100, 0), day)).await.unwrap();
        service.create_transaction(create_request("ISRAEL", Decimal::new(50, 0), day)).await.unwrap();

        let everything = service
            .list_transactions(&TransactionListRequest::default(), None)
            .await
            .unwrap();
        assert_eq!(everything.len(), 2);

        let israel = service
            .list_transactions(&TransactionListRequest::default(), Some(Worker::Israel))
            .await
            .unwrap();
        assert_eq!(israel.len(), 1);
        assert_eq!(israel[0].worker, Worker::Israel);
    }

    #[tokio::test]
    async fn test_list_rejects_inverted_range() {
        let service = setup_test().await;
        let request = TransactionListRequest {
            start_date: NaiveDate::from_ymd_opt(2024, 5, 3),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 1),
        };

        let result = service.list_transactions(&request, None).await;
        assert!(matches!(result, Err(ApiError::Validation(ValidationError::InvalidQuery(_)))));
    }

    #[tokio::test]
    async fn test_update_comment_rules() {
        let service = setup_test().await;
        let created = service
            .create_transaction(create_request("thaicar", Decimal::new(75, 0), NaiveDate::from_ymd_opt(2024, 5, 1)))
            .await
            .unwrap();

        let updated = service
            .update_comment(created.id, UpdateCommentRequest { comment: " pagado ".to_string() })
            .await
            .unwrap();
        assert_eq!(updated.comment.as_deref(), Some("pagado"));

        let cleared = service
            .update_comment(created.id, UpdateCommentRequest { comment: "  ".to_string() })
            .await
            .unwrap();
        assert_eq!(cleared.comment, None);

        let too_long = service
            .update_comment(created.id, UpdateCommentRequest { comment: "x".repeat(501) })
            .await;
        assert!(matches!(too_long, Err(ApiError::Validation(ValidationError::CommentTooLong { .. }))));

        let missing = service
            .update_comment(created.id + 100, UpdateCommentRequest { comment: "x".to_string() })
            .await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_transaction() {
        let service = setup_test().await;
        let created = service
            .create_transaction(create_request("hengi", Decimal::new(10, 0), None))
            .await
            .unwrap();

        service.delete_transaction(created.id).await.unwrap();
        assert!(matches!(service.delete_transaction(created.id).await, Err(ApiError::NotFound(_))));
    }
}
