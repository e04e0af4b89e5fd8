use crate::db::DbConnection;
use crate::error::BankError;
use shared::{Bank, CreateBankRequest, FieldError, UpdateBankRequest};
use tracing::info;

/// Longest accepted name or location, matching the width of the original columns
pub const MAX_FIELD_LEN: usize = 255;

/// CRUD operations on banks, shared by the JSON API and the HTML pages
#[derive(Clone)]
pub struct BankService {
    db: DbConnection,
}

impl BankService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// All banks in insertion order
    pub async fn list(&self) -> Result<Vec<Bank>, BankError> {
        Ok(self.db.list_banks().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Bank, BankError> {
        self.db.get_bank(id).await?.ok_or(BankError::NotFound(id))
    }

    pub async fn create(&self, request: CreateBankRequest) -> Result<Bank, BankError> {
        let mut errors = Vec::new();
        let name = check_field("name", &request.name, &mut errors);
        let location = check_field("location", &request.location, &mut errors);
        if !errors.is_empty() {
            return Err(BankError::InvalidInput(errors));
        }

        let bank = self.db.insert_bank(name, location).await?;
        info!("Created bank {} ({:?})", bank.id, bank.name);
        Ok(bank)
    }

    /// Apply the supplied fields to an existing bank.
    ///
    /// A missing id is reported before any field error.
    pub async fn update(&self, id: i64, request: UpdateBankRequest) -> Result<Bank, BankError> {
        let mut errors = Vec::new();
        let name = request
            .name
            .as_deref()
            .map(|value| check_field("name", value, &mut errors));
        let location = request
            .location
            .as_deref()
            .map(|value| check_field("location", value, &mut errors));
        if request.is_empty() {
            errors.push(FieldError::new("body", "must contain name or location"));
        }

        if !errors.is_empty() {
            self.get(id).await?;
            return Err(BankError::InvalidInput(errors));
        }

        let bank = self
            .db
            .update_bank(id, name, location)
            .await?
            .ok_or(BankError::NotFound(id))?;
        info!("Updated bank {}", bank.id);
        Ok(bank)
    }

    pub async fn delete(&self, id: i64) -> Result<(), BankError> {
        if !self.db.delete_bank(id).await? {
            return Err(BankError::NotFound(id));
        }
        info!("Deleted bank {}", id);
        Ok(())
    }
}

/// Trim a field and record why it is unacceptable, if it is
fn check_field<'a>(field: &str, value: &'a str, errors: &mut Vec<FieldError>) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::new(field, "is required"));
    } else if trimmed.chars().count() > MAX_FIELD_LEN {
        errors.push(FieldError::new(
            field,
            format!("must be at most {} characters", MAX_FIELD_LEN),
        ));
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_service() -> BankService {
        let db = DbConnection::init_test().await.expect("Failed to init test DB");
        BankService::new(db)
    }

    fn new_bank(name: &str, location: &str) -> CreateBankRequest {
        CreateBankRequest {
            name: name.to_string(),
            location: location.to_string(),
        }
    }

    fn changes(name: Option<&str>, location: Option<&str>) -> UpdateBankRequest {
        UpdateBankRequest {
            name: name.map(str::to_string),
            location: location.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let service = create_test_service().await;

        let created = service.create(new_bank("First National", "Springfield")).await.unwrap();
        assert_eq!(created.id, 1);

        let fetched = service.get(created.id).await.unwrap();
        assert_eq!(fetched.name, "First National");
        assert_eq!(fetched.location, "Springfield");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_trims_input() {
        let service = create_test_service().await;

        let created = service.create(new_bank("  Trimmed  ", "\tTown\n")).await.unwrap();
        assert_eq!(created.name, "Trimmed");
        assert_eq!(created.location, "Town");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_fields() {
        let service = create_test_service().await;

        for (name, location, field) in [("", "x", "name"), ("x", "", "location"), ("   ", "x", "name")] {
            match service.create(new_bank(name, location)).await {
                Err(BankError::InvalidInput(errors)) => {
                    assert_eq!(errors.len(), 1);
                    assert_eq!(errors[0].field, field);
                }
                other => panic!("expected InvalidInput, got {:?}", other),
            }
        }

        assert!(service.list().await.unwrap().is_empty(), "no row may be created");
    }

    #[tokio::test]
    async fn test_create_reports_name_before_location() {
        let service = create_test_service().await;

        let err = service.create(new_bank("", "")).await.unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "location"]);
    }

    #[tokio::test]
    async fn test_create_rejects_overlong_name() {
        let service = create_test_service().await;

        let long_name = "b".repeat(MAX_FIELD_LEN + 1);
        let err = service.create(new_bank(&long_name, "x")).await.unwrap_err();
        assert!(matches!(err, BankError::InvalidInput(_)));

        let exact = "b".repeat(MAX_FIELD_LEN);
        assert!(service.create(new_bank(&exact, "x")).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_id_is_not_found() {
        let service = create_test_service().await;

        assert!(matches!(service.get(7).await, Err(BankError::NotFound(7))));
        assert!(matches!(
            service.update(7, changes(Some("a"), Some("b"))).await,
            Err(BankError::NotFound(7))
        ));
        assert!(matches!(service.delete(7).await, Err(BankError::NotFound(7))));
    }

    #[tokio::test]
    async fn test_update_missing_id_with_invalid_fields_is_not_found() {
        let service = create_test_service().await;

        let result = service.update(7, changes(Some(""), Some(""))).await;
        assert!(matches!(result, Err(BankError::NotFound(7))));
    }

    #[tokio::test]
    async fn test_update_changes_only_target() {
        let service = create_test_service().await;
        let first = service.create(new_bank("Bank 1", "Dhaka")).await.unwrap();
        let second = service.create(new_bank("Bank 2", "Chittagong")).await.unwrap();

        let updated = service
            .update(second.id, changes(Some("Bank Two"), Some("Sylhet")))
            .await
            .unwrap();
        assert_eq!(updated.id, second.id);
        assert_eq!(updated.name, "Bank Two");
        assert_eq!(updated.location, "Sylhet");

        let all = service.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], first);
        assert_eq!(all[1], updated);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_field() {
        let service = create_test_service().await;
        let bank = service.create(new_bank("Dhaka Bank", "City")).await.unwrap();

        let updated = service.update(bank.id, changes(None, Some("New City"))).await.unwrap();
        assert_eq!(updated.name, "Dhaka Bank");
        assert_eq!(updated.location, "New City");
    }

    #[tokio::test]
    async fn test_invalid_update_leaves_record_unchanged() {
        let service = create_test_service().await;
        let bank = service.create(new_bank("First National", "Springfield")).await.unwrap();

        let err = service
            .update(bank.id, changes(Some(""), Some("Springfield")))
            .await
            .unwrap_err();
        assert!(matches!(err, BankError::InvalidInput(_)));

        let err = service.update(bank.id, UpdateBankRequest::default()).await.unwrap_err();
        assert!(matches!(err, BankError::InvalidInput(_)));

        assert_eq!(service.get(bank.id).await.unwrap(), bank);
    }

    #[tokio::test]
    async fn test_update_without_fields_names_the_body() {
        let service = create_test_service().await;
        let bank = service.create(new_bank("Quiet", "Town")).await.unwrap();

        let err = service.update(bank.id, UpdateBankRequest::default()).await.unwrap_err();
        assert_eq!(err.field_errors(), &[FieldError::new("body", "must contain name or location")]);
        assert_eq!(err.to_string(), "body must contain name or location");
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let service = create_test_service().await;
        let bank = service.create(new_bank("Short Lived", "Here")).await.unwrap();

        service.delete(bank.id).await.unwrap();
        assert!(matches!(service.get(bank.id).await, Err(BankError::NotFound(_))));
        assert!(matches!(service.delete(bank.id).await, Err(BankError::NotFound(_))));
    }
}
