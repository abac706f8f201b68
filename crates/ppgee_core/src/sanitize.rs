//! Import row normalization.
//!
//! # Responsibility
//! - Prepare spreadsheet-derived rows for a bulk create.
//!
//! # Invariants
//! - Every row leaving `sanitize_for_import` has a non-blank `id`.
//! - Optional columns listed by `Entity::fill_import_defaults` are present
//!   (empty string when the row omitted them).
//! - Output is plain JSON data: each row is re-decoded from its own
//!   `serde_json::Value` form.

use crate::model::entity::Entity;
use log::debug;
use uuid::Uuid;

/// Normalizes rows for bulk import. Single-record creates skip this step.
pub fn sanitize_for_import<E: Entity>(rows: Vec<E>) -> Result<Vec<E>, serde_json::Error> {
    let mut generated = 0usize;
    let sanitized = rows
        .into_iter()
        .map(|mut row| {
            if row.id().trim().is_empty() {
                row.set_id(Uuid::new_v4().to_string());
                generated += 1;
            }
            row.fill_import_defaults();
            serde_json::to_value(&row).and_then(serde_json::from_value)
        })
        .collect::<Result<Vec<E>, _>>()?;

    debug!(
        "event=import_sanitize module=sanitize status=ok collection={} rows={} generated_ids={}",
        E::KIND.collection(),
        sanitized.len(),
        generated
    );
    Ok(sanitized)
}
