//! Person registry: validate and normalize untrusted input, then persist.
//!
//! Registration writes the person row and its audit event inside one
//! transaction, so a half-registered person can never be observed.

use chrono::NaiveDate;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use crate::db::{DbError, SqlParam, Store};
use crate::errors::{AppError, FieldError};
use crate::models::pagination::{Page, Pagination};
use crate::models::person::{CreatePerson, Person};
use crate::validation::{
    format_cpf, format_phone, is_valid_cpf, is_valid_date, is_valid_email, is_valid_phone,
};

const PERSON_COLUMNS: &str = "id, name, cpf, email, phone, birth_date, created_at";

/// Collect field-level validation errors for a registration input.
/// Phone numbers are accepted in any punctuation as long as they format to
/// the canonical pattern.
fn validate(input: &CreatePerson) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if input.name.trim().is_empty() {
        errors.push(FieldError::new("name", "name is required"));
    }
    if !is_valid_cpf(&input.cpf) {
        errors.push(FieldError::new("cpf", "invalid CPF"));
    }
    if !is_valid_email(&input.email) {
        errors.push(FieldError::new("email", "invalid email address"));
    }
    if !is_valid_phone(&format_phone(&input.phone)) {
        errors.push(FieldError::new("phone", "invalid phone number"));
    }
    if !is_valid_date(&input.birth_date) {
        errors.push(FieldError::new(
            "birth_date",
            "invalid date, expected YYYY-MM-DD",
        ));
    }

    errors
}

/// Register a person. Input is validated and normalized (CPF and phone to
/// canonical display form, email lowercased) before anything touches the
/// database; the row and its audit event commit atomically.
pub async fn create(store: &Store, input: &CreatePerson) -> Result<Person, AppError> {
    let errors = validate(input);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let id = Uuid::new_v4();
    let name = input.name.trim().to_string();
    let cpf = format_cpf(&input.cpf);
    let email = input.email.trim().to_lowercase();
    let phone = format_phone(&input.phone);
    let birth_date = NaiveDate::parse_from_str(&input.birth_date, "%Y-%m-%d")
        .map_err(|_| AppError::Internal("validated date failed to parse".to_string()))?;

    let result: Result<Person, AppError> = store
        .run_transaction(move |tx| {
            Box::pin(async move {
                let person = sqlx::query_as::<_, Person>(
                    r#"
                    INSERT INTO people (id, name, cpf, email, phone, birth_date)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING id, name, cpf, email, phone, birth_date, created_at
                    "#,
                )
                .bind(id)
                .bind(&name)
                .bind(&cpf)
                .bind(&email)
                .bind(&phone)
                .bind(birth_date)
                .fetch_one(&mut **tx)
                .await
                .map_err(DbError::from)?;

                sqlx::query("INSERT INTO registration_events (person_id, event) VALUES ($1, $2)")
                    .bind(person.id)
                    .bind("person.created")
                    .execute(&mut **tx)
                    .await
                    .map_err(DbError::from)?;

                Ok(person)
            })
        })
        .await;

    result.map_err(|err| match err {
        AppError::Db(ref db) if db.is_unique_violation() => {
            AppError::Conflict("A person with this CPF is already registered".to_string())
        }
        other => other,
    })
}

/// Fetch one person by id.
pub async fn find_by_id(store: &Store, id: Uuid) -> Result<Person, AppError> {
    let rows = store
        .query(
            &format!("SELECT {PERSON_COLUMNS} FROM people WHERE id = $1"),
            &[SqlParam::Uuid(id)],
        )
        .await?;

    let row = rows
        .first()
        .ok_or_else(|| AppError::NotFound(format!("person {id} not found")))?;

    Person::from_row(row).map_err(|e| AppError::Db(DbError::Query(e)))
}

/// List people, newest first, with pagination.
pub async fn list(store: &Store, pagination: &Pagination) -> Result<Page<Person>, AppError> {
    let count_rows = store.query("SELECT COUNT(*) FROM people", &[]).await?;
    let total: i64 = count_rows
        .first()
        .map(|row| row.try_get(0))
        .transpose()
        .map_err(DbError::Query)?
        .unwrap_or(0);

    let rows = store
        .query(
            &format!(
                "SELECT {PERSON_COLUMNS} FROM people ORDER BY created_at DESC LIMIT $1 OFFSET $2"
            ),
            &[
                SqlParam::Int(pagination.limit()),
                SqlParam::Int(pagination.offset()),
            ],
        )
        .await?;

    let items = rows
        .iter()
        .map(Person::from_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::Query)?;

    Ok(Page::new(items, total, pagination))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> CreatePerson {
        CreatePerson {
            name: "Maria Silva".to_string(),
            cpf: "529.982.247-25".to_string(),
            email: "maria@example.com".to_string(),
            phone: "11934567890".to_string(),
            birth_date: "1990-05-20".to_string(),
        }
    }

    #[test]
    fn validate_accepts_well_formed_input() {
        assert!(validate(&valid_input()).is_empty());
    }

    #[test]
    fn validate_accepts_pre_formatted_phone() {
        let mut input = valid_input();
        input.phone = "(11) 93456-7890".to_string();
        assert!(validate(&input).is_empty());
    }

    #[test]
    fn validate_flags_each_bad_field() {
        let input = CreatePerson {
            name: "   ".to_string(),
            cpf: "111.111.111-11".to_string(),
            email: "not-an-email".to_string(),
            phone: "123".to_string(),
            birth_date: "2023-02-29".to_string(),
        };
        let errors = validate(&input);
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["name", "cpf", "email", "phone", "birth_date"]);
    }

    #[test]
    fn validate_reports_only_failing_fields() {
        let mut input = valid_input();
        input.cpf = "529.982.247-24".to_string();
        let errors = validate(&input);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "cpf");
    }
}
