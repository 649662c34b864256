use serde::{Deserialize, Serialize};

use crate::model::item::{DrillItem, ItemError, ItemType};

/// One zhuyin symbol and its pinyin spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub pinyin: String,
    pub zhuyin: String,
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl MappingEntry {
    /// Turn the entry into a drill item: the zhuyin is shown, the pinyin typed.
    ///
    /// # Errors
    ///
    /// Returns `ItemError` if either spelling is blank.
    pub fn to_item(&self, item_type: ItemType) -> Result<DrillItem, ItemError> {
        let item = DrillItem::new(
            self.pinyin.as_str(),
            self.zhuyin.as_str(),
            self.pinyin.as_str(),
            item_type,
        )?
        .with_group(self.group.as_str());
        Ok(match &self.hint {
            Some(hint) => item.with_hint(hint.as_str()),
            None => item,
        })
    }
}

/// Two spellings learners tend to mix up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionPair {
    pub pair: Vec<String>,
    pub hint: String,
}

/// The zhuyin ↔ pinyin table served by `GET /api/mappings`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MappingTable {
    pub initials: Vec<MappingEntry>,
    pub finals: Vec<MappingEntry>,
    #[serde(default)]
    pub special_syllables: Vec<MappingEntry>,
    #[serde(default)]
    pub confusion_pairs: Vec<ConfusionPair>,
}

/// Which slice of the table a sounds session drills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupFilter {
    AllInitials,
    AllFinals,
    /// Union of initials and finals.
    All,
    /// A named group tag, matched in both tables.
    Named(String),
}

impl GroupFilter {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "all_initials" => Self::AllInitials,
            "all_finals" => Self::AllFinals,
            "all" | "" => Self::All,
            other => Self::Named(other.to_string()),
        }
    }

    /// Wildcard filters draw distractors from the whole table.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        !matches!(self, Self::Named(_))
    }
}

impl MappingTable {
    /// Initials and finals as drill items.
    ///
    /// # Errors
    ///
    /// Returns `ItemError` if any entry has a blank spelling.
    pub fn sound_items(&self) -> Result<Vec<DrillItem>, ItemError> {
        self.select(&GroupFilter::All)
    }

    /// Items matching a group filter, initials first.
    ///
    /// # Errors
    ///
    /// Returns `ItemError` if any selected entry has a blank spelling.
    pub fn select(&self, filter: &GroupFilter) -> Result<Vec<DrillItem>, ItemError> {
        let initials = self.initials.iter().filter(|entry| match filter {
            GroupFilter::AllInitials | GroupFilter::All => true,
            GroupFilter::AllFinals => false,
            GroupFilter::Named(group) => entry.group == *group,
        });
        let finals = self.finals.iter().filter(|entry| match filter {
            GroupFilter::AllFinals | GroupFilter::All => true,
            GroupFilter::AllInitials => false,
            GroupFilter::Named(group) => entry.group == *group,
        });

        initials
            .map(|entry| entry.to_item(ItemType::Initial))
            .chain(finals.map(|entry| entry.to_item(ItemType::Final)))
            .collect()
    }

    /// Total number of initials and finals.
    #[must_use]
    pub fn sound_count(&self) -> usize {
        self.initials.len() + self.finals.len()
    }

    /// Group tags in table order, deduplicated.
    #[must_use]
    pub fn groups(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for entry in self.initials.iter().chain(self.finals.iter()) {
            if !seen.contains(&entry.group.as_str()) {
                seen.push(entry.group.as_str());
            }
        }
        seen
    }
}
