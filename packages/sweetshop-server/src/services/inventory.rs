//! Purchase and restock flows.
//!
//! Both adjustments are applied as a single conditional `UPDATE`, so concurrent
//! purchases against the same sweet can never drive its stock below zero.

use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::db::sweet_ops;
use crate::db::sweets::Model as SweetModel;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Purchase {
    pub sweet: SweetModel,
    pub purchased: i32,
    pub total_cost: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Restock {
    pub sweet: SweetModel,
    pub restocked: i32,
}

fn requested_quantity(quantity: Option<i64>) -> Result<i32, AppError> {
    match quantity {
        Some(q) if q >= 1 => {
            i32::try_from(q).map_err(|_| AppError::validation("Quantity is too large"))
        }
        _ => Err(AppError::validation("Quantity must be at least 1")),
    }
}

/// `price * quantity`，四舍五入到两位小数
pub(crate) fn total_cost(price: f64, quantity: i32) -> Result<String, AppError> {
    let price = Decimal::from_f64_retain(price)
        .ok_or_else(|| AppError::Internal(format!("price {price} is not representable")))?;
    let total = price
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| AppError::Internal("total cost overflow".to_string()))?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Ok(format!("{total:.2}"))
}

/// 购买：默认数量为 1
///
/// 金额在扣减之前算好，失败时库存保持不变。
pub(crate) async fn purchase(
    db: &DatabaseConnection,
    id: i32,
    quantity: Option<i64>,
) -> Result<Purchase, AppError> {
    let quantity = requested_quantity(Some(quantity.unwrap_or(1)))?;

    let sweet = sweet_ops::find_by_id(db, id)
        .await?
        .ok_or(AppError::SweetNotFound)?;
    if sweet.quantity < quantity {
        return Err(AppError::InsufficientStock {
            available: sweet.quantity,
        });
    }
    let total_cost = total_cost(sweet.price, quantity)?;

    let Some(sweet) = sweet_ops::decrement_quantity(db, id, quantity).await? else {
        // 并发购买抢先扣减，重新读取以报告当前库存
        return match sweet_ops::find_by_id(db, id).await? {
            Some(current) => Err(AppError::InsufficientStock {
                available: current.quantity,
            }),
            None => Err(AppError::SweetNotFound),
        };
    };

    info!(
        sweet_id = id,
        purchased = quantity,
        remaining = sweet.quantity,
        %total_cost,
        "purchase completed"
    );

    Ok(Purchase {
        sweet,
        purchased: quantity,
        total_cost,
    })
}

/// 补货：数量必须提供且至少为 1
pub(crate) async fn restock(
    db: &DatabaseConnection,
    id: i32,
    quantity: Option<i64>,
) -> Result<Restock, AppError> {
    let quantity = requested_quantity(quantity)?;

    let Some(sweet) = sweet_ops::increment_quantity(db, id, quantity).await? else {
        return match sweet_ops::find_by_id(db, id).await? {
            Some(_) => Err(AppError::validation("Restock would exceed the maximum stock level")),
            None => Err(AppError::SweetNotFound),
        };
    };

    info!(
        sweet_id = id,
        restocked = quantity,
        stock = sweet.quantity,
        "restock completed"
    );

    Ok(Restock {
        sweet,
        restocked: quantity,
    })
}
