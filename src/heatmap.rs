use crate::models::{Slot, SlotCount};
use crate::window::{HOURS_PER_DAY, Window};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Vote count drawn at full intensity.
pub const FULL_SCALE: u32 = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub day: String,
    pub hour: u32,
    pub count: i64,
    pub intensity: f64,
    pub selectable: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRow {
    pub hour: u32,
    pub label: String,
    pub cells: Vec<HeatmapCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendStep {
    pub count: u32,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub days: Vec<String>,
    pub rows: Vec<HeatmapRow>,
    pub legend: Vec<LegendStep>,
    pub scale: u32,
    pub total_votes: i64,
}

pub fn intensity(count: i64) -> f64 {
    if count <= 0 {
        return 0.0;
    }
    (count as f64 / f64::from(FULL_SCALE)).min(1.0)
}

pub fn legend() -> Vec<LegendStep> {
    (0..=FULL_SCALE)
        .map(|count| LegendStep {
            count,
            intensity: intensity(i64::from(count)),
        })
        .collect()
}

/// Lays the sparse counts and the viewer's own selection onto the full
/// day x hour grid of the window. Counts outside the window are still shown
/// but their cells stay closed.
pub fn build_heatmap(window: &Window, counts: &[SlotCount], selected: &[Slot]) -> Heatmap {
    let by_slot: BTreeMap<(&str, u32), i64> = counts
        .iter()
        .map(|slot| ((slot.day.as_str(), slot.hour), slot.count))
        .collect();
    let mine: BTreeSet<(&str, u32)> = selected
        .iter()
        .map(|slot| (slot.day.as_str(), slot.hour))
        .collect();

    let days = window.days();
    let keys = window.day_keys();

    let rows = (0..HOURS_PER_DAY)
        .map(|hour| HeatmapRow {
            hour,
            label: format!("{hour}:00"),
            cells: days
                .iter()
                .zip(&keys)
                .map(|(day, key)| {
                    let count = by_slot.get(&(key.as_str(), hour)).copied().unwrap_or(0);
                    HeatmapCell {
                        day: key.clone(),
                        hour,
                        count,
                        intensity: intensity(count),
                        selectable: window.is_selectable(*day, hour),
                        selected: mine.contains(&(key.as_str(), hour)),
                    }
                })
                .collect(),
        })
        .collect();

    Heatmap {
        days: keys,
        rows,
        legend: legend(),
        scale: FULL_SCALE,
        total_votes: counts.iter().map(|slot| slot.count).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(day: &str, hour: u32, count: i64) -> SlotCount {
        SlotCount {
            day: day.to_string(),
            hour,
            count,
        }
    }

    fn cell<'a>(map: &'a Heatmap, day: &str, hour: u32) -> &'a HeatmapCell {
        map.rows[hour as usize]
            .cells
            .iter()
            .find(|cell| cell.day == day)
            .expect("missing cell")
    }

    #[test]
    fn grid_covers_every_day_and_hour() {
        let window = Window::parse("2024-01-01 09:00:00", "2024-01-03 17:00:00").unwrap();
        let map = build_heatmap(&window, &[], &[]);
        assert_eq!(map.days, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(map.rows.len(), 24);
        assert!(map.rows.iter().all(|row| row.cells.len() == 3));
        assert_eq!(map.rows[9].label, "9:00");
        assert_eq!(map.total_votes, 0);
    }

    #[test]
    fn counts_and_selection_land_on_their_cells() {
        let window = Window::parse("2024-05-01 10:00:00", "2024-05-01 12:00:00").unwrap();
        let counts = vec![count("2024-05-01", 10, 3), count("2024-05-01", 11, 9)];
        let selected = vec![Slot {
            day: "2024-05-01".to_string(),
            hour: 11,
        }];
        let map = build_heatmap(&window, &counts, &selected);

        let ten = cell(&map, "2024-05-01", 10);
        assert_eq!(ten.count, 3);
        assert!((ten.intensity - 0.5).abs() < f64::EPSILON);
        assert!(ten.selectable);
        assert!(!ten.selected);

        let eleven = cell(&map, "2024-05-01", 11);
        assert_eq!(eleven.intensity, 1.0);
        assert!(eleven.selected);

        let noon = cell(&map, "2024-05-01", 12);
        assert_eq!(noon.count, 0);
        assert!(!noon.selectable);
        assert_eq!(map.total_votes, 12);
    }

    #[test]
    fn legend_runs_from_empty_to_full() {
        let steps = legend();
        assert_eq!(steps.len(), 7);
        assert_eq!(steps[0].intensity, 0.0);
        assert_eq!(steps[6].intensity, 1.0);
    }
}
