use common::RubricEntry;
use serde::{Deserialize, Serialize};

use crate::error::DraftError;

/// A rubric always keeps at least this many categories.
pub const MIN_RUBRIC_ITEMS: usize = 3;
pub const DEFAULT_POINTS: u32 = 10;
pub const MAX_POINTS: u32 = 100;

const DEFAULT_DESCRIPTION: &str = "Evaluation criteria";

/// One scoring category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_points", deserialize_with = "deserialize_points")]
    pub points: u32,
}

fn default_points() -> u32 {
    DEFAULT_POINTS
}

fn deserialize_points<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(normalize_points(raw))
}

/// Zero falls back to the default; everything else is clamped into `1..=100`.
pub fn normalize_points(raw: i64) -> u32 {
    if raw == 0 {
        DEFAULT_POINTS
    } else {
        raw.clamp(1, MAX_POINTS as i64) as u32
    }
}

impl RubricItem {
    pub fn new(name: impl Into<String>, description: impl Into<String>, points: i64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            points: normalize_points(points),
        }
    }

    fn blank() -> Self {
        Self::new("", "", DEFAULT_POINTS as i64)
    }

    pub fn is_named(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Description shown in the descriptor when the author left it empty.
    pub fn description_or_default(&self) -> &str {
        if self.description.is_empty() {
            DEFAULT_DESCRIPTION
        } else {
            &self.description
        }
    }

    pub fn to_entry(&self) -> RubricEntry {
        RubricEntry {
            name: self.name.clone(),
            description: (!self.description.is_empty()).then(|| self.description.clone()),
            points: self.points,
        }
    }

    fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            points: self.points,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    id: u32,
    item: RubricItem,
}

/// Ordered, editable list of rubric categories.
///
/// Slots are identified by a stable id; display numbering is derived from
/// position and carries no identity.
#[derive(Debug, Clone)]
pub struct RubricModel {
    slots: Vec<Slot>,
    next_id: u32,
}

impl Default for RubricModel {
    fn default() -> Self {
        Self::new()
    }
}

impl RubricModel {
    /// A model seeded with the minimum number of blank categories.
    pub fn new() -> Self {
        let mut model = Self {
            slots: Vec::new(),
            next_id: 1,
        };
        for _ in 0..MIN_RUBRIC_ITEMS {
            model.add_item();
        }
        model
    }

    /// Build from existing items, padding with blank slots up to the floor.
    pub fn from_items(items: impl IntoIterator<Item = RubricItem>) -> Self {
        let mut model = Self {
            slots: Vec::new(),
            next_id: 1,
        };
        for item in items {
            model.push(item);
        }
        while model.slots.len() < MIN_RUBRIC_ITEMS {
            model.add_item();
        }
        model
    }

    fn push(&mut self, mut item: RubricItem) -> u32 {
        item.points = normalize_points(i64::from(item.points));
        let id = self.next_id;
        self.next_id += 1;
        self.slots.push(Slot { id, item });
        id
    }

    /// Append a blank category and return its id.
    pub fn add_item(&mut self) -> u32 {
        self.push(RubricItem::blank())
    }

    /// Replace the contents of a category. Points are clamped the same way
    /// [`RubricItem::new`] clamps them.
    pub fn update(&mut self, id: u32, mut item: RubricItem) -> Result<(), DraftError> {
        item.points = normalize_points(i64::from(item.points));
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(DraftError::UnknownRubricItem(id))?;
        slot.item = item;
        Ok(())
    }

    /// Remove a category unless that would drop the rubric below the floor,
    /// counting either all slots or the named ones.
    pub fn remove_item(&mut self, id: u32) -> Result<RubricItem, DraftError> {
        let index = self
            .slots
            .iter()
            .position(|s| s.id == id)
            .ok_or(DraftError::UnknownRubricItem(id))?;

        if self.slots.len() <= MIN_RUBRIC_ITEMS {
            return Err(DraftError::RubricFloor);
        }
        if self.slots[index].item.is_named() && self.named_count() <= MIN_RUBRIC_ITEMS {
            return Err(DraftError::RubricFloor);
        }

        Ok(self.slots.remove(index).item)
    }

    pub fn get(&self, id: u32) -> Option<&RubricItem> {
        self.slots.iter().find(|s| s.id == id).map(|s| &s.item)
    }

    /// Slot ids in display order.
    pub fn ids(&self) -> Vec<u32> {
        self.slots.iter().map(|s| s.id).collect()
    }

    /// Number of slots, named or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn named_count(&self) -> usize {
        self.slots.iter().filter(|s| s.item.is_named()).count()
    }

    /// Named categories in insertion order, with names and descriptions trimmed.
    pub fn list_items(&self) -> Vec<RubricItem> {
        self.slots
            .iter()
            .filter(|s| s.item.is_named())
            .map(|s| s.item.trimmed())
            .collect()
    }

    /// Sum of points over the named categories.
    pub fn total_points(&self) -> u32 {
        total_points(&self.list_items())
    }

    /// `(id, "Category N")` for every slot, numbered by current position.
    pub fn category_labels(&self) -> Vec<(u32, String)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id, format!("Category {}", i + 1)))
            .collect()
    }
}

pub fn total_points(items: &[RubricItem]) -> u32 {
    items.iter().map(|r| r.points).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(model: &mut RubricModel, names: &[(&str, i64)]) {
        let ids = model.ids();
        for (i, (name, points)) in names.iter().enumerate() {
            let id = match ids.get(i) {
                Some(id) => *id,
                None => model.add_item(),
            };
            model
                .update(id, RubricItem::new(*name, "", *points))
                .unwrap();
        }
    }

    #[test]
    fn seeds_three_blank_items() {
        let model = RubricModel::new();
        assert_eq!(model.len(), 3);
        assert!(model.list_items().is_empty());
        assert_eq!(model.total_points(), 0);
    }

    #[test]
    fn total_is_sum_of_named_items() {
        let mut model = RubricModel::new();
        named(&mut model, &[("Accuracy", 10), ("Clarity", 15), ("Format", 5)]);
        model.add_item(); // blank, ignored
        assert_eq!(model.list_items().len(), 3);
        assert_eq!(model.total_points(), 30);
    }

    #[test]
    fn removal_at_floor_always_fails() {
        let mut model = RubricModel::new();
        named(&mut model, &[("A", 10), ("B", 10), ("C", 10)]);
        let first = model.ids()[0];
        for _ in 0..5 {
            assert_eq!(model.remove_item(first), Err(DraftError::RubricFloor));
        }
        assert_eq!(model.len(), 3);
        assert_eq!(model.list_items().len(), 3);
    }

    #[test]
    fn removal_keeps_three_named_even_with_blank_slots() {
        let mut model = RubricModel::new();
        named(&mut model, &[("A", 10), ("B", 10), ("C", 10)]);
        let blank = model.add_item();
        let first = model.ids()[0];
        assert_eq!(model.remove_item(first), Err(DraftError::RubricFloor));
        assert!(model.remove_item(blank).is_ok());
        assert_eq!(model.len(), 3);
    }

    #[test]
    fn removal_above_floor_renumbers_labels() {
        let mut model = RubricModel::new();
        named(&mut model, &[("A", 1), ("B", 2), ("C", 3), ("D", 4)]);
        let second = model.ids()[1];
        let removed = model.remove_item(second).unwrap();
        assert_eq!(removed.name, "B");

        let labels: Vec<String> = model.category_labels().into_iter().map(|(_, l)| l).collect();
        assert_eq!(labels, vec!["Category 1", "Category 2", "Category 3"]);
        let names: Vec<String> = model.list_items().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["A", "C", "D"]);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut model = RubricModel::new();
        assert_eq!(
            model.remove_item(99),
            Err(DraftError::UnknownRubricItem(99))
        );
        assert!(model.update(99, RubricItem::new("x", "", 1)).is_err());
    }

    #[test]
    fn update_clamps_raw_points() {
        let mut model = RubricModel::new();
        let ids = model.ids();
        let mut item = RubricItem::new("Accuracy", "", 20);
        item.points = 0;
        model.update(ids[0], item.clone()).unwrap();
        item.points = 500;
        model.update(ids[1], item).unwrap();

        let points: Vec<u32> = model.list_items().iter().map(|i| i.points).collect();
        assert_eq!(points, vec![DEFAULT_POINTS, MAX_POINTS]);
        assert_eq!(model.total_points(), 110);
    }

    #[test]
    fn points_are_normalized() {
        assert_eq!(normalize_points(0), 10);
        assert_eq!(normalize_points(-4), 1);
        assert_eq!(normalize_points(250), 100);
        assert_eq!(normalize_points(42), 42);
    }

    #[test]
    fn entry_maps_empty_description_to_none() {
        let item = RubricItem::new("Accuracy", "", 5);
        assert_eq!(item.to_entry().description, None);
        assert_eq!(item.description_or_default(), "Evaluation criteria");
    }
}
