//! Input validation for catalog writes and search parameters.

use sweetshop_core::{CreateSweetRequest, SweetFilters, UpdateSweetRequest};

use crate::db::sweet_ops::{NewSweet, SweetChanges, SweetSearch};
use crate::error::AppError;

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// 单价上限，保证 `price * i32::MAX` 仍在 `Decimal` 的表示范围内
pub(crate) const MAX_PRICE: f64 = 1e12;

fn check_price(price: f64) -> Result<f64, AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::validation("Price must be a non-negative number"));
    }
    if price > MAX_PRICE {
        return Err(AppError::validation(format!(
            "Price must not exceed {MAX_PRICE}"
        )));
    }
    Ok(price)
}

fn check_quantity(quantity: i64) -> Result<i32, AppError> {
    if quantity < 0 {
        return Err(AppError::validation("Quantity must be a non-negative number"));
    }
    i32::try_from(quantity).map_err(|_| AppError::validation("Quantity is too large"))
}

pub(crate) fn validate_new_sweet(request: CreateSweetRequest) -> Result<NewSweet, AppError> {
    let (Some(name), Some(category), Some(price), Some(quantity)) = (
        non_empty(request.name),
        non_empty(request.category),
        request.price,
        request.quantity,
    ) else {
        return Err(AppError::validation(
            "Name, category, price, and quantity are required",
        ));
    };

    Ok(NewSweet {
        name,
        category,
        price: check_price(price)?,
        quantity: check_quantity(quantity)?,
        description: non_empty(request.description),
        image_url: non_empty(request.image_url),
    })
}

pub(crate) fn validate_changes(request: UpdateSweetRequest) -> Result<SweetChanges, AppError> {
    if matches!(&request.name, Some(name) if name.trim().is_empty()) {
        return Err(AppError::validation("Name cannot be empty"));
    }
    if matches!(&request.category, Some(category) if category.trim().is_empty()) {
        return Err(AppError::validation("Category cannot be empty"));
    }

    Ok(SweetChanges {
        name: request.name,
        category: request.category,
        price: request.price.map(check_price).transpose()?,
        quantity: request.quantity.map(check_quantity).transpose()?,
        description: request.description,
        image_url: request.image_url,
    })
}

fn parse_price_bound(field: &str, value: Option<&str>) -> Result<Option<f64>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(text) => text
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| AppError::validation(format!("{field} must be a number"))),
    }
}

/// 空字符串视为未提供
pub(crate) fn parse_search(filters: &SweetFilters) -> Result<SweetSearch, AppError> {
    Ok(SweetSearch {
        name: non_empty(filters.name.clone()),
        category: non_empty(filters.category.clone()),
        min_price: parse_price_bound("minPrice", filters.min_price.as_deref())?,
        max_price: parse_price_bound("maxPrice", filters.max_price.as_deref())?,
    })
}
