pub mod api;
pub mod auth;
pub mod completions;
pub mod confirm;
pub mod count;
pub mod export;
pub mod init;
pub mod item;
pub mod materials;
pub mod snapshot;

use crate::output::{CliError, OutputMode, fail};
use crate::project::Project;
use inventura_core::api::{Api, ApiError};
use inventura_core::auth::AuthError;
use inventura_core::cache::ValueStore;
use inventura_core::error::ErrorCode;
use inventura_core::merge::{merge_rows, unify};
use inventura_core::model::{Cadence, InventoryRow};

/// API handlers bound to the project's store and auth settings.
pub fn store_api(project: &Project) -> Api<'_> {
    Api::new(&project.conn, project.config.auth.clone())
}

/// Map an API failure onto a coded CLI error, render it, and return it.
///
/// `not_found` picks the code for 404s, which depends on what was looked up.
pub fn api_failure(output: OutputMode, err: ApiError, not_found: ErrorCode) -> anyhow::Error {
    let code = match &err {
        ApiError::Validation(_) | ApiError::BadRequest(_) => ErrorCode::ValidationFailed,
        ApiError::Unauthorized(AuthError::MissingToken) => ErrorCode::NotLoggedIn,
        ApiError::Unauthorized(AuthError::InvalidCredentials) => ErrorCode::InvalidCredentials,
        ApiError::Unauthorized(_) => ErrorCode::SessionExpired,
        ApiError::NotFound(_) => not_found,
        ApiError::Conflict(_) => ErrorCode::DuplicateItemNumber,
        ApiError::Internal(_) => ErrorCode::StoreUnavailable,
    };
    fail(output, CliError::coded(code, err.to_string()))
}

/// Catalog for `cadence` merged with the local value cache.
pub fn load_rows(
    project: &Project,
    cadence: Cadence,
    output: OutputMode,
) -> anyhow::Result<Vec<InventoryRow>> {
    let items = store_api(project)
        .list_items(Some(cadence))
        .map_err(|err| api_failure(output, err, ErrorCode::ItemNotFound))?;
    Ok(merge_rows(&items, &project.value_store().load(cadence)))
}

/// Rows of every cadence, de-duplicated on item number and sorted.
pub fn load_material_rows(
    project: &Project,
    output: OutputMode,
) -> anyhow::Result<Vec<InventoryRow>> {
    let groups = Cadence::ALL
        .iter()
        .map(|cadence| load_rows(project, *cadence, output))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let slices: Vec<&[InventoryRow]> = groups.iter().map(Vec::as_slice).collect();
    Ok(unify(&slices))
}

/// Find a row by item id or item number.
pub fn find_row<'a>(rows: &'a [InventoryRow], key: &str) -> Option<(usize, &'a InventoryRow)> {
    let key = key.trim();
    rows.iter()
        .enumerate()
        .find(|(_, row)| row.id() == key || row.item_number() == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventura_core::model::{CountValue, Item, ItemStatus};

    fn row(id: &str, number: &str) -> InventoryRow {
        InventoryRow::new(
            Item {
                id: id.into(),
                cadence: Cadence::Daily,
                item_number: number.into(),
                description: "Gloves".into(),
                unit_labels: ["BAL".into(), "KUS".into(), "KU".into()],
                status: ItemStatus::Active,
            },
            CountValue::default(),
        )
    }

    #[test]
    fn find_row_by_id_or_number() {
        let rows = vec![row("itm-1", "100"), row("itm-2", "200")];
        assert_eq!(find_row(&rows, "itm-2").map(|(i, _)| i), Some(1));
        assert_eq!(find_row(&rows, " 100 ").map(|(i, _)| i), Some(0));
        assert!(find_row(&rows, "300").is_none());
    }
}
