//! Station members
//!
//! Members appear as credited people, as creators of records and as
//! approvers. They all live in the one `member` table.

use crate::{Error, Result};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

/// A station member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Insert a member
pub async fn create_member(pool: &SqlitePool, first_name: &str, last_name: &str) -> Result<Member> {
    let result = sqlx::query("INSERT INTO member (fname, sname) VALUES (?, ?)")
        .bind(first_name)
        .bind(last_name)
        .execute(pool)
        .await?;

    Ok(Member {
        id: result.last_insert_rowid(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
    })
}

/// Load a member; missing rows are [`Error::NotFound`]
pub async fn load_member(pool: &SqlitePool, member_id: i64) -> Result<Member> {
    let row = sqlx::query("SELECT memberid, fname, sname FROM member WHERE memberid = ?")
        .bind(member_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Member {}", member_id)))?;

    Ok(Member {
        id: row.get("memberid"),
        first_name: row.get("fname"),
        last_name: row.get("sname"),
    })
}
