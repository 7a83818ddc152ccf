//! Handler for `forgekeeper assets`.

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::output;
use crate::domain::AssetKind;
use crate::error::Result;

#[derive(Tabled)]
struct AssetRow {
    #[tabled(rename = "ID")]
    id: u8,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Obtained by")]
    source: String,
}

fn recipe_names(kind: AssetKind) -> Vec<&'static str> {
    kind.recipe().iter().map(|k| k.name()).collect()
}

fn source_of(kind: AssetKind) -> String {
    if kind.is_primary() {
        "mint (60s cooldown) or trade".to_string()
    } else {
        format!("forge: {}", recipe_names(kind).join(" + "))
    }
}

/// Execute `assets`.
pub fn execute() -> Result<()> {
    if output::is_json() {
        let assets: Vec<_> = AssetKind::ALL
            .into_iter()
            .map(|kind| {
                json!({
                    "id": kind.id(),
                    "name": kind.name(),
                    "primary": kind.is_primary(),
                    "recipe": kind.recipe().iter().map(|k| k.id()).collect::<Vec<_>>(),
                })
            })
            .collect();
        output::json_output(json!({
            "command": "assets",
            "assets": assets,
        }));
        return Ok(());
    }

    let rows: Vec<AssetRow> = AssetKind::ALL
        .into_iter()
        .map(|kind| AssetRow {
            id: kind.id(),
            name: kind.name(),
            kind: if kind.is_primary() { "primary" } else { "derived" },
            source: source_of(kind),
        })
        .collect();

    output::section("Assets");
    output::lines(&Table::new(rows).to_string());
    output::hint("forging burns one unit of each ingredient");
    Ok(())
}
