//! Partial updates for stored records.
//!
//! A patch carries only the fields the caller wants to change. Patches parse
//! from `field=value` pairs separated by commas, e.g. `amount=5, cost=2.5`.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockroom_core::DomainError;

/// Fields that may be merged into an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub amount: Option<i64>,
    pub cost: Option<f64>,
    pub supplier: Option<String>,
    pub quality: Option<String>,
    pub usage: Option<i64>,
    pub condition: Option<i64>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub(crate) fn touches_category_fields(&self) -> bool {
        self.supplier.is_some()
            || self.quality.is_some()
            || self.usage.is_some()
            || self.condition.is_some()
    }
}

impl FromStr for ItemPatch {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut patch = Self::default();
        for (field, value) in pairs(s)? {
            match field {
                "name" => patch.name = Some(value.to_string()),
                "amount" => patch.amount = Some(number(field, value)?),
                "cost" => patch.cost = Some(finite(field, value)?),
                "supplier" => patch.supplier = Some(value.to_string()),
                "quality" => patch.quality = Some(value.to_string()),
                "usage" => patch.usage = Some(number(field, value)?),
                "condition" => patch.condition = Some(number(field, value)?),
                other => return Err(unknown_field(other)),
            }
        }
        Ok(patch)
    }
}

/// Fields that may be merged into a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub age: Option<i64>,
}

impl FromStr for UserPatch {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut patch = Self::default();
        for (field, value) in pairs(s)? {
            match field {
                "name" => patch.name = Some(value.to_string()),
                "age" => patch.age = Some(number(field, value)?),
                other => return Err(unknown_field(other)),
            }
        }
        Ok(patch)
    }
}

fn pairs(s: &str) -> Result<Vec<(&str, &str)>, DomainError> {
    let pairs = s
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .ok_or_else(|| DomainError::validation(format!("expected field=value, got {part:?}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if pairs.is_empty() {
        return Err(DomainError::validation("no fields to update"));
    }
    Ok(pairs)
}

fn number<T: FromStr>(field: &str, value: &str) -> Result<T, DomainError> {
    value
        .parse()
        .map_err(|_| DomainError::validation(format!("{field} must be a number, got {value:?}")))
}

fn finite(field: &str, value: &str) -> Result<f64, DomainError> {
    let number: f64 = number(field, value)?;
    if !number.is_finite() {
        return Err(DomainError::validation(format!(
            "{field} must be a finite number, got {value:?}"
        )));
    }
    Ok(number)
}

fn unknown_field(field: &str) -> DomainError {
    DomainError::validation(format!("unknown field {field:?}"))
}
