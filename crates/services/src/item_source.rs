use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;

use drill_core::catalog::{self, RuleTopic};
use drill_core::model::{AnswerMode, AppSettings, DrillItem, GroupFilter, ItemType, MappingTable};
use drill_core::pool::{draw, shuffle, shuffle_options, with_choices};

use crate::api::BackendClient;
use crate::error::{ApiError, DrillError};

/// Per-character pinyin lookup used by the characters phase.
#[async_trait]
pub trait CharacterLookup: Send + Sync {
    /// Reading for `character`, or `None` if there is none.
    async fn pinyin_for(&self, character: char) -> Result<Option<String>, ApiError>;
}

#[async_trait]
impl CharacterLookup for BackendClient {
    async fn pinyin_for(&self, character: char) -> Result<Option<String>, ApiError> {
        self.character_pinyin(character).await
    }
}

/// Supplies the item list for each phase.
#[derive(Clone)]
pub struct ItemSource {
    mappings: MappingTable,
    words: Vec<DrillItem>,
    characters: Vec<char>,
    lookup: Option<Arc<dyn CharacterLookup>>,
    character_session_size: usize,
    character_fallback_size: usize,
    word_session_size: usize,
}

impl ItemSource {
    /// # Errors
    ///
    /// Returns `DrillError::Catalog` if the bundled word list is malformed.
    pub fn new(
        mappings: MappingTable,
        lookup: Option<Arc<dyn CharacterLookup>>,
        settings: &AppSettings,
    ) -> Result<Self, DrillError> {
        Ok(Self {
            mappings,
            words: catalog::word_items()?,
            characters: catalog::common_characters(),
            lookup,
            character_session_size: settings.character_session_size(),
            character_fallback_size: settings.character_fallback_size(),
            word_session_size: settings.word_session_size(),
        })
    }

    #[must_use]
    pub fn mappings(&self) -> &MappingTable {
        &self.mappings
    }

    /// Initials and finals selected by `filter`, shuffled.
    ///
    /// Recognition items get option sets; distractors come from the whole
    /// table for wildcard filters and from the selected group otherwise.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::Pool` if some item has no distractor.
    pub fn sounds<R: Rng + ?Sized>(
        &self,
        filter: &GroupFilter,
        mode: AnswerMode,
        rng: &mut R,
    ) -> Result<Vec<DrillItem>, DrillError> {
        let selected = self.mappings.select(filter)?;
        let items = shuffle(&selected, rng);
        match mode {
            AnswerMode::Input => Ok(items),
            AnswerMode::MultipleChoice => {
                let pool = if filter.is_wildcard() {
                    self.mappings.sound_items()?
                } else {
                    selected
                };
                Ok(with_choices(items, &pool, rng)?)
            }
        }
    }

    /// The topic's quiz in random order, each option set reshuffled.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::NoQuiz` for topics without questions.
    pub fn rules<R: Rng + ?Sized>(
        &self,
        topic: RuleTopic,
        rng: &mut R,
    ) -> Result<Vec<DrillItem>, DrillError> {
        let quiz = topic.quiz_items()?;
        if quiz.is_empty() {
            return Err(DrillError::NoQuiz {
                topic: topic.slug().to_string(),
            });
        }
        let ordered = shuffle(&quiz, rng);
        Ok(shuffle_options(ordered, rng))
    }

    /// Characters to look up for one session.
    pub fn character_candidates<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<char> {
        let mut picked = shuffle(&self.characters, rng);
        picked.truncate(self.character_session_size);
        picked
    }

    /// Look each character up in turn; failures and empty readings are skipped.
    pub async fn resolve_characters(&self, candidates: &[char]) -> Vec<DrillItem> {
        let Some(lookup) = self.lookup.as_ref() else {
            return Vec::new();
        };

        let mut items = Vec::with_capacity(candidates.len());
        for &character in candidates {
            match lookup.pinyin_for(character).await {
                Ok(Some(pinyin)) => {
                    let text = character.to_string();
                    match DrillItem::new(text.as_str(), text.as_str(), pinyin, ItemType::Character)
                    {
                        Ok(item) => items.push(item),
                        Err(err) => tracing::debug!(%character, error = %err, "skipping character"),
                    }
                }
                Ok(None) => tracing::debug!(%character, "no reading, skipping"),
                Err(err) => tracing::debug!(%character, error = %err, "lookup failed, skipping"),
            }
        }
        items
    }

    /// Stand-in for the characters phase when no lookup succeeded: random
    /// initials and finals, shown as zhuyin.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::Item` if the mapping table holds a blank entry.
    pub fn character_fallback<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Vec<DrillItem>, DrillError> {
        let sounds = self.mappings.sound_items()?;
        draw(&sounds, |_| true, Some(self.character_fallback_size), rng)
            .into_iter()
            .map(|item| {
                DrillItem::new(
                    item.prompt(),
                    item.prompt(),
                    item.expected_answer(),
                    ItemType::Character,
                )
                .map_err(DrillError::from)
            })
            .collect()
    }

    /// A random slice of the bundled word list.
    pub fn words<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<DrillItem> {
        draw(&self.words, |_| true, Some(self.word_session_size), rng)
    }

    /// The cycling pool for speed mode: every initial and final.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::Item` if the mapping table holds a blank entry.
    pub fn speed_pool(&self) -> Result<Vec<DrillItem>, DrillError> {
        Ok(self.mappings.sound_items()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    struct MapLookup(HashMap<char, Option<&'static str>>);

    #[async_trait]
    impl CharacterLookup for MapLookup {
        async fn pinyin_for(&self, character: char) -> Result<Option<String>, ApiError> {
            match self.0.get(&character) {
                Some(reading) => Ok(reading.map(str::to_string)),
                None => Err(ApiError::Disabled),
            }
        }
    }

    fn source(lookup: Option<Arc<dyn CharacterLookup>>) -> ItemSource {
        ItemSource::new(
            catalog::bundled_mappings().unwrap(),
            lookup,
            &AppSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn typed_sounds_cover_the_whole_group() {
        let source = source(None);
        let mut rng = StdRng::seed_from_u64(1);
        let items = source
            .sounds(&GroupFilter::AllInitials, AnswerMode::Input, &mut rng)
            .unwrap();
        assert_eq!(items.len(), 21);
        assert!(items.iter().all(|i| i.options().is_none()));
    }

    #[test]
    fn recognition_in_small_group_draws_distractors_from_group() {
        let source = source(None);
        let mut rng = StdRng::seed_from_u64(2);
        let items = source
            .sounds(
                &GroupFilter::parse("palatal"),
                AnswerMode::MultipleChoice,
                &mut rng,
            )
            .unwrap();
        assert_eq!(items.len(), 3);
        for item in &items {
            let options = item.options().unwrap();
            assert_eq!(options.len(), 3);
            assert!(options.iter().all(|o| ["j", "q", "x"].contains(&o.as_str())));
        }
    }

    #[test]
    fn recognition_with_wildcard_uses_full_table() {
        let source = source(None);
        let mut rng = StdRng::seed_from_u64(3);
        let items = source
            .sounds(&GroupFilter::AllInitials, AnswerMode::MultipleChoice, &mut rng)
            .unwrap();
        assert!(items.iter().all(|i| i.options().unwrap().len() == 4));
    }

    #[test]
    fn unknown_group_yields_no_items() {
        let source = source(None);
        let mut rng = StdRng::seed_from_u64(4);
        let items = source
            .sounds(&GroupFilter::parse("nasal-ish"), AnswerMode::Input, &mut rng)
            .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn confusion_topic_has_nothing_to_drill() {
        let source = source(None);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(matches!(
            source.rules(RuleTopic::Confusion, &mut rng),
            Err(DrillError::NoQuiz { .. })
        ));
        assert_eq!(source.rules(RuleTopic::URule, &mut rng).unwrap().len(), 6);
    }

    #[tokio::test]
    async fn characters_skip_failed_and_empty_lookups() {
        let lookup = MapLookup(HashMap::from([('中', Some("zhōng")), ('的', None)]));
        let source = source(Some(Arc::new(lookup) as Arc<dyn CharacterLookup>));

        let items = source.resolve_characters(&['中', '的', '一']).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].prompt(), "中");
        assert_eq!(items[0].expected_answer(), "zhōng");
        assert_eq!(items[0].item_type(), ItemType::Character);
    }

    #[test]
    fn character_fallback_uses_zhuyin_prompts() {
        let source = source(None);
        let mut rng = StdRng::seed_from_u64(6);
        let items = source.character_fallback(&mut rng).unwrap();
        assert_eq!(items.len(), 20);
        assert!(items.iter().all(|i| i.item_type() == ItemType::Character));
        assert!(items.iter().all(|i| i.prompt() != i.expected_answer()));
    }

    #[test]
    fn bounded_draws_respect_settings() {
        let source = source(None);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(source.words(&mut rng).len(), 20);
        assert_eq!(source.character_candidates(&mut rng).len(), 30);
        assert_eq!(source.speed_pool().unwrap().len(), source.mappings().sound_count());
    }
}
