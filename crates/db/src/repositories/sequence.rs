//! Document number allocation, e.g. `PO-2026-00042`.
//!
//! One `document_sequences` row per (prefix, year), advanced with a
//! compare-and-swap so two writers never receive the same number.

use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

use procura_core::numbering::DocumentKind;
use procura_shared::{AppError, AppResult};

use crate::db_err;
use crate::entities::document_sequences;

/// Allocates the next number for `kind` in `year`.
///
/// # Errors
///
/// `Conflict` when every attempt lost a race, or a database error.
pub(crate) async fn allocate<C: ConnectionTrait>(
    conn: &C,
    kind: DocumentKind,
    year: i32,
    max_attempts: u32,
) -> AppResult<String> {
    let prefix = kind.prefix();

    for attempt in 1..=max_attempts.max(1) {
        let current = document_sequences::Entity::find_by_id((prefix.to_string(), year))
            .one(conn)
            .await
            .map_err(db_err)?;

        match current {
            None => {
                let seed = document_sequences::ActiveModel {
                    prefix: Set(prefix.to_string()),
                    year: Set(year),
                    next_value: Set(2),
                };
                let inserted = document_sequences::Entity::insert(seed)
                    .on_conflict(
                        OnConflict::columns([
                            document_sequences::Column::Prefix,
                            document_sequences::Column::Year,
                        ])
                        .do_nothing()
                        .to_owned(),
                    )
                    .exec_without_returning(conn)
                    .await
                    .map_err(db_err)?;
                if inserted == 1 {
                    return Ok(kind.format(year, 1));
                }
            }
            Some(row) => {
                let result = document_sequences::Entity::update_many()
                    .col_expr(
                        document_sequences::Column::NextValue,
                        Expr::value(row.next_value + 1),
                    )
                    .filter(document_sequences::Column::Prefix.eq(prefix))
                    .filter(document_sequences::Column::Year.eq(year))
                    .filter(document_sequences::Column::NextValue.eq(row.next_value))
                    .exec(conn)
                    .await
                    .map_err(db_err)?;
                if result.rows_affected == 1 {
                    return Ok(kind.format(year, row.next_value));
                }
            }
        }

        tracing::debug!(prefix, year, attempt, "document number collision, retrying");
    }

    Err(AppError::Conflict(format!(
        "could not allocate a {prefix} number after {max_attempts} attempts"
    )))
}
