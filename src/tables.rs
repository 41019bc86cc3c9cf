use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use serde_json::Value;

use crate::{
    core::{
        snapshot::EngineResult,
        tempo::{TempoColor, TempoDay},
    },
    prelude::*,
};

const fn color_of(color: TempoColor) -> Color {
    match color {
        TempoColor::Unknown => Color::Reset,
        TempoColor::Blue => Color::Blue,
        TempoColor::White => Color::White,
        TempoColor::Red => Color::Red,
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

/// Snapshot as the key-value mapping exposed to the consumers.
pub fn build_snapshot_table(snapshot: &EngineResult) -> Result<Table> {
    let mut table = new_table();
    table.set_header(vec!["Attribute", "Value"]);
    for (key, value) in snapshot.to_flat_map()? {
        let cell = match value {
            Value::Null => Cell::new("unavailable").add_attribute(Attribute::Dim),
            Value::Bool(flag) => Cell::new(flag).fg(if flag { Color::Green } else { Color::Reset }),
            Value::Number(number) => Cell::new(number).set_alignment(CellAlignment::Right),
            Value::String(text) => {
                let color = [TempoColor::Blue, TempoColor::White, TempoColor::Red]
                    .into_iter()
                    .find(|color| color.label() == text)
                    .map_or(Color::Reset, color_of);
                Cell::new(text).fg(color)
            }
            other => Cell::new(other),
        };
        table.add_row(vec![Cell::new(key), cell]);
    }
    Ok(table)
}

#[must_use]
pub fn build_tempo_days_table(days: &[TempoDay]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Date", "Color"]);
    for day in days {
        table.add_row(vec![
            Cell::new(day.date.format("%a %d %b %Y")),
            Cell::new(day.color)
                .fg(color_of(day.color))
                .add_attribute(if day.color.is_known() { Attribute::Bold } else { Attribute::Dim }),
        ]);
    }
    table
}
