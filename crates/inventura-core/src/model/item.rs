use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::InvalidEnumValue;

/// Counting period. Each cadence owns its own catalog and value cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
}

impl Cadence {
    pub const ALL: [Self; 3] = [Self::Daily, Self::Weekly, Self::Monthly];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Title-case label used in document titles.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cadence {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" | "d" => Ok(Self::Daily),
            "weekly" | "week" | "w" => Ok(Self::Weekly),
            "monthly" | "month" | "m" => Ok(Self::Monthly),
            _ => Err(InvalidEnumValue::new(
                "cadence",
                s,
                "daily, weekly, monthly",
            )),
        }
    }
}

/// Catalog lifecycle status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    #[serde(alias = "Aktívne")]
    Active,
    #[serde(alias = "Predaktivácia")]
    PreActivation,
    #[serde(alias = "Neaktívne")]
    Inactive,
}

impl ItemStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PreActivation => "pre_activation",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "active" | "aktívne" => Ok(Self::Active),
            "pre_activation" | "preactivation" | "predaktivácia" => Ok(Self::PreActivation),
            "inactive" | "neaktívne" => Ok(Self::Inactive),
            _ => Err(InvalidEnumValue::new(
                "item status",
                s,
                "active, pre_activation, inactive",
            )),
        }
    }
}

/// A countable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub cadence: Cadence,
    /// Business key: displayed, and the de-duplication key across cadences.
    pub item_number: String,
    pub description: String,
    pub unit_labels: [String; 3],
    #[serde(default)]
    pub status: ItemStatus,
}

/// Payload for creating a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub cadence: Cadence,
    pub item_number: String,
    pub description: String,
    pub unit_labels: [String; 3],
    #[serde(default)]
    pub status: ItemStatus,
}

impl NewItem {
    /// Trimmed copy; returns the list of violated rules when any required
    /// field is blank.
    pub fn normalized(&self) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();
        let item_number = self.item_number.trim().to_string();
        let description = self.description.trim().to_string();
        if item_number.is_empty() {
            errors.push("item number is required".to_string());
        }
        if description.is_empty() {
            errors.push("description is required".to_string());
        }
        let unit_labels = self.unit_labels.clone().map(|label| label.trim().to_string());
        for (slot, label) in unit_labels.iter().enumerate() {
            if label.is_empty() {
                errors.push(format!("unit label {} is required", slot + 1));
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self {
            cadence: self.cadence,
            item_number,
            description,
            unit_labels,
            status: self.status,
        })
    }
}

/// Partial update for a catalog item. Absent fields stay as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemPatch {
    pub item_number: Option<String>,
    pub description: Option<String>,
    pub unit_labels: Option<[String; 3]>,
    pub status: Option<ItemStatus>,
}

impl ItemPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.item_number.is_none()
            && self.description.is_none()
            && self.unit_labels.is_none()
            && self.status.is_none()
    }

    /// Apply onto `item`, trimming text fields. Blank text is rejected.
    pub fn apply_to(&self, item: &Item) -> Result<Item, Vec<String>> {
        let mut next = item.clone();
        let mut errors = Vec::new();
        if let Some(number) = &self.item_number {
            let number = number.trim();
            if number.is_empty() {
                errors.push("item number is required".to_string());
            }
            next.item_number = number.to_string();
        }
        if let Some(description) = &self.description {
            let description = description.trim();
            if description.is_empty() {
                errors.push("description is required".to_string());
            }
            next.description = description.to_string();
        }
        if let Some(labels) = &self.unit_labels {
            next.unit_labels = labels.clone().map(|label| label.trim().to_string());
            for (slot, label) in next.unit_labels.iter().enumerate() {
                if label.is_empty() {
                    errors.push(format!("unit label {} is required", slot + 1));
                }
            }
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if errors.is_empty() { Ok(next) } else { Err(errors) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units() -> [String; 3] {
        ["BAL".into(), "KUS".into(), "KU".into()]
    }

    #[test]
    fn cadence_parse_roundtrip() {
        for cadence in Cadence::ALL {
            assert_eq!(cadence.as_str().parse::<Cadence>(), Ok(cadence));
        }
        assert_eq!("Week".parse::<Cadence>(), Ok(Cadence::Weekly));
        assert!("yearly".parse::<Cadence>().is_err());
    }

    #[test]
    fn item_status_accepts_legacy_labels() {
        assert_eq!("Aktívne".parse::<ItemStatus>(), Ok(ItemStatus::Active));
        assert_eq!("pre-activation".parse::<ItemStatus>(), Ok(ItemStatus::PreActivation));
        let parsed: ItemStatus = serde_json::from_str("\"Neaktívne\"").expect("alias");
        assert_eq!(parsed, ItemStatus::Inactive);
    }

    #[test]
    fn item_serializes_camel_case() {
        let item = Item {
            id: "itm-1".into(),
            cadence: Cadence::Daily,
            item_number: "A1".into(),
            description: "Paper".into(),
            unit_labels: units(),
            status: ItemStatus::Active,
        };
        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json["itemNumber"], "A1");
        assert_eq!(json["unitLabels"][2], "KU");
        assert_eq!(json["cadence"], "daily");
    }

    #[test]
    fn new_item_normalized_trims_and_collects_errors() {
        let draft = NewItem {
            cadence: Cadence::Weekly,
            item_number: "  5847/076 ".into(),
            description: " Breakfast paper ".into(),
            unit_labels: units(),
            status: ItemStatus::Active,
        };
        let clean = draft.normalized().expect("valid");
        assert_eq!(clean.item_number, "5847/076");
        assert_eq!(clean.description, "Breakfast paper");

        let blank = NewItem {
            item_number: " ".into(),
            unit_labels: ["".into(), "KUS".into(), " ".into()],
            ..draft
        };
        let errors = blank.normalized().expect_err("invalid");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn patch_keeps_absent_fields() {
        let item = Item {
            id: "itm-1".into(),
            cadence: Cadence::Daily,
            item_number: "A1".into(),
            description: "Paper".into(),
            unit_labels: units(),
            status: ItemStatus::Active,
        };
        let patch = ItemPatch {
            description: Some("Napkins".into()),
            ..ItemPatch::default()
        };
        let next = patch.apply_to(&item).expect("patch");
        assert_eq!(next.description, "Napkins");
        assert_eq!(next.item_number, "A1");
        assert!(ItemPatch::default().is_empty());
    }
}
