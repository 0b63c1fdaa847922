//! Show credits
//!
//! A credit (in the "film credits" sense) records a person's role on a show
//! over a date range. Credits are versioned by their effective range rather
//! than deleted: a presenter leaving gets an `effective_to`.

use crate::db::members::Member;
use crate::time::{from_epoch_nanos, to_epoch_nanos};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

/// A type of show credit, e.g. "Presenter", "Producer", "Reporter"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowCreditType {
    pub id: i64,
    /// Human-readable, singular name
    pub name: String,
    /// Human-readable plural
    pub plural: String,
    /// Credits of this type appear in bylines
    pub is_in_byline: bool,
}

/// A credit joined with the credited person's name and the credit type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowCredit {
    pub id: i64,
    pub show_id: i64,
    pub person: i64,
    pub person_name: String,
    pub creator: i64,
    pub approver: Option<i64>,
    pub credit_type: ShowCreditType,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl ShowCredit {
    /// True if `as_of` falls within `[effective_from, effective_to)`
    pub fn is_effective_at(&self, as_of: DateTime<Utc>) -> bool {
        self.effective_from <= as_of && self.effective_to.map_or(true, |to| as_of < to)
    }
}

/// New credit to record
#[derive(Debug, Clone)]
pub struct NewShowCredit {
    pub show_id: i64,
    pub person: i64,
    pub creator: i64,
    pub approver: Option<i64>,
    pub credit_type_id: i64,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
}

/// List credit types, alphabetically
pub async fn list_credit_types(pool: &SqlitePool) -> Result<Vec<ShowCreditType>> {
    let rows = sqlx::query(
        "SELECT credit_type_id, name, plural, is_in_byline FROM show_credit_type ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| ShowCreditType {
            id: row.get("credit_type_id"),
            name: row.get("name"),
            plural: row.get("plural"),
            is_in_byline: row.get::<i64, _>("is_in_byline") != 0,
        })
        .collect())
}

/// Look up a credit type by singular name
pub async fn load_credit_type(pool: &SqlitePool, name: &str) -> Result<ShowCreditType> {
    list_credit_types(pool)
        .await?
        .into_iter()
        .find(|t| t.name == name)
        .ok_or_else(|| Error::NotFound(format!("Credit type '{}'", name)))
}

/// Record a credit
///
/// An `effective_to` not after `effective_from` would make the credit never
/// effective and is rejected with [`Error::InvalidArgument`].
pub async fn record_credit(pool: &SqlitePool, credit: &NewShowCredit) -> Result<i64> {
    if let Some(to) = credit.effective_to {
        if to <= credit.effective_from {
            return Err(Error::InvalidArgument(format!(
                "Credit ends ({}) before it starts ({})",
                to, credit.effective_from
            )));
        }
    }

    let result = sqlx::query(
        r#"
        INSERT INTO show_credit (
            show_id, creditid, memberid, approvedid, credit_type_id,
            effective_from, effective_to
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(credit.show_id)
    .bind(credit.person)
    .bind(credit.creator)
    .bind(credit.approver)
    .bind(credit.credit_type_id)
    .bind(to_epoch_nanos(credit.effective_from)?)
    .bind(credit.effective_to.map(to_epoch_nanos).transpose()?)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Credits on a show effective at `as_of`
///
/// Ordered by credit type name, then by the credited person's name.
pub async fn current_credits(
    pool: &SqlitePool,
    show_id: i64,
    as_of: DateTime<Utc>,
) -> Result<Vec<ShowCredit>> {
    let as_of_epoch = to_epoch_nanos(as_of)?;
    let rows = sqlx::query(
        r#"
        SELECT c.show_credit_id, c.show_id, c.creditid, c.memberid, c.approvedid,
               c.effective_from, c.effective_to,
               m.fname, m.sname,
               t.credit_type_id, t.name, t.plural, t.is_in_byline
        FROM show_credit c
        JOIN member m ON m.memberid = c.creditid
        JOIN show_credit_type t ON t.credit_type_id = c.credit_type_id
        WHERE c.show_id = ?
          AND c.effective_from <= ?
          AND (c.effective_to IS NULL OR c.effective_to > ?)
        ORDER BY t.name ASC, m.sname ASC, m.fname ASC, c.show_credit_id ASC
        "#,
    )
    .bind(show_id)
    .bind(as_of_epoch)
    .bind(as_of_epoch)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let person = Member {
                id: row.get("creditid"),
                first_name: row.get("fname"),
                last_name: row.get("sname"),
            };
            let effective_to: Option<i64> = row.get("effective_to");
            ShowCredit {
                id: row.get("show_credit_id"),
                show_id: row.get("show_id"),
                person: person.id,
                person_name: person.full_name(),
                creator: row.get("memberid"),
                approver: row.get("approvedid"),
                credit_type: ShowCreditType {
                    id: row.get("credit_type_id"),
                    name: row.get("name"),
                    plural: row.get("plural"),
                    is_in_byline: row.get::<i64, _>("is_in_byline") != 0,
                },
                effective_from: from_epoch_nanos(row.get("effective_from")),
                effective_to: effective_to.map(from_epoch_nanos),
            }
        })
        .collect())
}

/// Names for a show's byline at `as_of`
///
/// Only credits whose type is in the byline count; a person credited twice
/// appears once.
pub async fn byline(pool: &SqlitePool, show_id: i64, as_of: DateTime<Utc>) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    for credit in current_credits(pool, show_id, as_of).await? {
        if credit.credit_type.is_in_byline && !names.contains(&credit.person_name) {
            names.push(credit.person_name);
        }
    }
    Ok(names)
}

/// Join byline names: "A", "A and B", "A, B and C"
pub fn format_byline(names: &[String]) -> Option<String> {
    match names {
        [] => None,
        [only] => Some(only.clone()),
        [init @ .., last] => Some(format!("{} and {}", init.join(", "), last)),
    }
}
