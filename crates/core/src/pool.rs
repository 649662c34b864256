//! Item pool: shuffling, bounded draws and multiple-choice option sets.

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use thiserror::Error;

use crate::model::{DrillItem, ItemId};

/// Number of wrong options shown next to the correct one.
pub const CHOICE_DISTRACTORS: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PoolError {
    #[error("no distractors available for item {item}")]
    NoDistractors { item: ItemId },
}

/// Uniformly shuffled copy of `items`; the source slice is never reordered.
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}

/// Select the items accepted by `filter`, shuffle them, and keep at most `count`.
pub fn draw<R, F>(source: &[DrillItem], filter: F, count: Option<usize>, rng: &mut R) -> Vec<DrillItem>
where
    R: Rng + ?Sized,
    F: Fn(&DrillItem) -> bool,
{
    let selected: Vec<DrillItem> = source.iter().filter(|item| filter(item)).cloned().collect();
    let mut drawn = shuffle(&selected, rng);
    if let Some(count) = count {
        drawn.truncate(count);
    }
    drawn
}

/// Build the option set for one multiple-choice question.
///
/// Up to [`CHOICE_DISTRACTORS`] distinct wrong answers are drawn from `pool`
/// and shuffled together with the correct answer. With fewer candidates the
/// set shrinks accordingly; at least one distractor is required.
///
/// # Errors
///
/// Returns `PoolError::NoDistractors` if `pool` holds no answer different
/// from the correct one.
pub fn choice_options<R: Rng + ?Sized>(
    correct: &DrillItem,
    pool: &[DrillItem],
    rng: &mut R,
) -> Result<Vec<String>, PoolError> {
    let expected = correct.expected_answer();
    let mut candidates: Vec<&str> = Vec::new();
    for item in pool {
        let answer = item.expected_answer();
        if answer != expected && !candidates.contains(&answer) {
            candidates.push(answer);
        }
    }

    if candidates.is_empty() {
        return Err(PoolError::NoDistractors {
            item: correct.id().clone(),
        });
    }

    let mut options: Vec<String> = std::iter::once(expected.to_string())
        .chain(
            candidates
                .choose_multiple(rng, CHOICE_DISTRACTORS)
                .map(|answer| (*answer).to_string()),
        )
        .collect();
    options.shuffle(rng);
    Ok(options)
}

/// Attach a freshly drawn option set to every item.
///
/// # Errors
///
/// Returns `PoolError::NoDistractors` for the first item that cannot get one.
pub fn with_choices<R: Rng + ?Sized>(
    items: Vec<DrillItem>,
    pool: &[DrillItem],
    rng: &mut R,
) -> Result<Vec<DrillItem>, PoolError> {
    items
        .into_iter()
        .map(|item| {
            let options = choice_options(&item, pool, rng)?;
            Ok(item.with_options(options))
        })
        .collect()
}

/// Reorder the fixed option sets carried by quiz items.
pub fn shuffle_options<R: Rng + ?Sized>(items: Vec<DrillItem>, rng: &mut R) -> Vec<DrillItem> {
    items
        .into_iter()
        .map(|item| match item.options() {
            Some(options) => {
                let shuffled = shuffle(options, rng);
                item.with_options(shuffled)
            }
            None => item,
        })
        .collect()
}
