use serde::{Deserialize, Serialize};
use time::Date;

use crate::error::AppError;
use crate::expenses::repo_types::CategoryTotal;

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub amount: f64,
    pub description: String,
    /// Defaults to the current date when omitted.
    pub expense_date: Option<Date>,
    pub category: Option<String>,
}

/// Partial update: absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateExpenseRequest {
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub expense_date: Option<Date>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MonthlySummaryResponse {
    pub year: i32,
    pub month: u8,
    pub summary: Vec<CategoryTotal>,
}

fn validate_amount(amount: f64) -> Result<(), AppError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::Validation(
            "Amount must be greater than zero.".into(),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), AppError> {
    if description.trim().is_empty() {
        return Err(AppError::Validation(
            "Description must not be empty.".into(),
        ));
    }
    if description.chars().count() > 255 {
        return Err(AppError::Validation(
            "Description must be at most 255 characters.".into(),
        ));
    }
    Ok(())
}

fn validate_category(category: Option<&str>) -> Result<(), AppError> {
    if let Some(category) = category {
        if category.chars().count() > 100 {
            return Err(AppError::Validation(
                "Category must be at most 100 characters.".into(),
            ));
        }
    }
    Ok(())
}

impl CreateExpenseRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_amount(self.amount)?;
        validate_description(&self.description)?;
        validate_category(self.category.as_deref())
    }
}

impl UpdateExpenseRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        validate_category(self.category.as_deref())
    }
}
