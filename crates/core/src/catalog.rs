//! Bundled practice content: the zhuyin/pinyin table, common characters,
//! common words and the spelling-rule quizzes.

use thiserror::Error;

use crate::model::{DrillItem, ItemError, ItemType, MappingTable};

const MAPPINGS_JSON: &str = include_str!("../data/mappings.json");

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("bundled mapping table is malformed: {0}")]
    Mappings(#[from] serde_json::Error),
    #[error(transparent)]
    Item(#[from] ItemError),
}

/// Parse the mapping table shipped with the binary.
///
/// # Errors
///
/// Returns `CatalogError::Mappings` if the embedded JSON does not parse.
pub fn bundled_mappings() -> Result<MappingTable, CatalogError> {
    Ok(serde_json::from_str(MAPPINGS_JSON)?)
}

// ─── Characters ────────────────────────────────────────────────────────────

const COMMON_CHARACTERS: &str = "的一是不了人我在有他這中大來上個國到說們為子和你地出會也時要就可以對生能而都行使去作如還下家學多然自回所果成發見只間方長又公三已老從動兩機工之天種面年什開它者裡等新心點問情知道話力理爾其實全才好部水高沒小軍法當起與現門事很比更名第將組外產此想手兒先被分無但信關進入找前頭位後少數表美相正明書看體幾定月題平同業氣十代打則世次教張因邊條寫運再活星記品站資意";

/// Common characters in frequency order, without repeats.
#[must_use]
pub fn common_characters() -> Vec<char> {
    let mut seen = Vec::new();
    for c in COMMON_CHARACTERS.chars() {
        if !seen.contains(&c) {
            seen.push(c);
        }
    }
    seen
}

// ─── Words ─────────────────────────────────────────────────────────────────

const COMMON_WORDS: &[(&str, &str)] = &[
    ("你好", "ni hao"),
    ("謝謝", "xie xie"),
    ("不是", "bu shi"),
    ("可以", "ke yi"),
    ("什麼", "shen me"),
    ("知道", "zhi dao"),
    ("時候", "shi hou"),
    ("現在", "xian zai"),
    ("怎麼", "zen me"),
    ("已經", "yi jing"),
    ("因為", "yin wei"),
    ("所以", "suo yi"),
    ("如果", "ru guo"),
    ("但是", "dan shi"),
    ("還是", "hai shi"),
    ("或者", "huo zhe"),
    ("一起", "yi qi"),
    ("覺得", "jue de"),
    ("應該", "ying gai"),
    ("然後", "ran hou"),
    ("非常", "fei chang"),
    ("可能", "ke neng"),
    ("需要", "xu yao"),
    ("開始", "kai shi"),
    ("問題", "wen ti"),
    ("學習", "xue xi"),
    ("工作", "gong zuo"),
    ("生活", "sheng huo"),
    ("朋友", "peng you"),
    ("電話", "dian hua"),
    ("公司", "gong si"),
    ("學校", "xue xiao"),
    ("老師", "lao shi"),
    ("同學", "tong xue"),
    ("喜歡", "xi huan"),
    ("漂亮", "piao liang"),
    ("認為", "ren wei"),
    ("準備", "zhun bei"),
    ("影響", "ying xiang"),
    ("重要", "zhong yao"),
    ("發現", "fa xian"),
    ("環境", "huan jing"),
    ("世界", "shi jie"),
    ("歷史", "li shi"),
    ("文化", "wen hua"),
    ("健康", "jian kang"),
    ("教育", "jiao yu"),
    ("自己", "zi ji"),
    ("大家", "da jia"),
    ("地方", "di fang"),
    ("東西", "dong xi"),
    ("多少", "duo shao"),
    ("電腦", "dian nao"),
    ("手機", "shou ji"),
    ("音樂", "yin yue"),
    ("運動", "yun dong"),
    ("旅行", "lv xing"),
    ("醫院", "yi yuan"),
    ("銀行", "yin hang"),
    ("早上", "zao shang"),
    ("晚上", "wan shang"),
    ("明天", "ming tian"),
    ("昨天", "zuo tian"),
    ("今天", "jin tian"),
    ("天氣", "tian qi"),
    ("吃飯", "chi fan"),
    ("睡覺", "shui jiao"),
    ("說話", "shuo hua"),
    ("開車", "kai che"),
    ("游泳", "you yong"),
    ("唱歌", "chang ge"),
    ("看書", "kan shu"),
    ("寫字", "xie zi"),
    ("考試", "kao shi"),
    ("回家", "hui jia"),
    ("出去", "chu qu"),
    ("起來", "qi lai"),
    ("容易", "rong yi"),
    ("簡單", "jian dan"),
    ("快樂", "kuai le"),
    ("安全", "an quan"),
];

/// All bundled words as typing items; the expected answer is toneless pinyin.
///
/// # Errors
///
/// Returns `CatalogError::Item` if an entry is blank.
pub fn word_items() -> Result<Vec<DrillItem>, CatalogError> {
    COMMON_WORDS
        .iter()
        .map(|(word, pinyin)| {
            DrillItem::new(*word, *word, *pinyin, ItemType::Word).map_err(CatalogError::from)
        })
        .collect()
}

// ─── Rules ─────────────────────────────────────────────────────────────────

struct QuizQuestion {
    question: &'static str,
    options: [&'static str; 4],
    answer: &'static str,
    explanation: &'static str,
}

const U_RULE_QUIZ: &[QuizQuestion] = &[
    QuizQuestion {
        question: "Pinyin for ㄐㄩ?",
        options: ["ju", "jü", "jv", "ji"],
        answer: "ju",
        explanation: "After j the dots on ü are dropped.",
    },
    QuizQuestion {
        question: "Pinyin for ㄋㄩ?",
        options: ["nu", "nü", "nv", "ni"],
        answer: "nü",
        explanation: "After n the dots stay; nu would be ㄋㄨ.",
    },
    QuizQuestion {
        question: "Pinyin for ㄑㄩ?",
        options: ["qü", "qu", "qv", "qi"],
        answer: "qu",
        explanation: "After q the dots on ü are dropped.",
    },
    QuizQuestion {
        question: "Pinyin for ㄌㄩ?",
        options: ["lu", "lü", "lv", "li"],
        answer: "lü",
        explanation: "After l the dots stay; lu would be ㄌㄨ.",
    },
    QuizQuestion {
        question: "Pinyin for ㄒㄩㄢ?",
        options: ["xüan", "xuan", "xvan", "xian"],
        answer: "xuan",
        explanation: "After x the dots on ü are dropped.",
    },
    QuizQuestion {
        question: "How is ㄩ written on its own?",
        options: ["yu", "ü", "wu", "yi"],
        answer: "yu",
        explanation: "A standalone ü takes a leading y and loses its dots.",
    },
];

const WHOLE_SYLLABLE_QUIZ: &[QuizQuestion] = &[
    QuizQuestion {
        question: "Pinyin for 知?",
        options: ["zhi", "zi", "zh", "ji"],
        answer: "zhi",
        explanation: "ㄓ on its own is spelled zhi.",
    },
    QuizQuestion {
        question: "Pinyin for 吃?",
        options: ["ci", "chi", "ch", "qi"],
        answer: "chi",
        explanation: "ㄔ on its own is spelled chi.",
    },
    QuizQuestion {
        question: "Pinyin for 日?",
        options: ["ri", "r", "rhi", "li"],
        answer: "ri",
        explanation: "ㄖ on its own is spelled ri.",
    },
    QuizQuestion {
        question: "Pinyin for 四?",
        options: ["shi", "si", "sz", "xi"],
        answer: "si",
        explanation: "ㄙ on its own is spelled si, not shi.",
    },
    QuizQuestion {
        question: "Pinyin for 魚?",
        options: ["ü", "yu", "wu", "yi"],
        answer: "yu",
        explanation: "ㄩ on its own is spelled yu.",
    },
];

const TONE_PLACEMENT_QUIZ: &[QuizQuestion] = &[
    QuizQuestion {
        question: "Which letter carries the tone mark in hao?",
        options: ["a", "o", "h", "none"],
        answer: "a",
        explanation: "If there is an a, it takes the mark.",
    },
    QuizQuestion {
        question: "Which letter carries the tone mark in mei?",
        options: ["m", "e", "i", "none"],
        answer: "e",
        explanation: "If there is an e, it takes the mark.",
    },
    QuizQuestion {
        question: "Which letter carries the tone mark in liu?",
        options: ["l", "i", "u", "none"],
        answer: "u",
        explanation: "In iu the mark goes on the second vowel.",
    },
    QuizQuestion {
        question: "Which letter carries the tone mark in gui?",
        options: ["g", "u", "i", "none"],
        answer: "i",
        explanation: "In ui the mark goes on the second vowel.",
    },
    QuizQuestion {
        question: "Which letter carries the tone mark in gou?",
        options: ["g", "o", "u", "none"],
        answer: "o",
        explanation: "If there is an o and no a or e, it takes the mark.",
    },
];

/// A spelling-rule lesson from the rules phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleTopic {
    URule,
    WholeSyllable,
    TonePlacement,
    Confusion,
}

impl RuleTopic {
    pub const ALL: [RuleTopic; 4] = [
        RuleTopic::URule,
        RuleTopic::WholeSyllable,
        RuleTopic::TonePlacement,
        RuleTopic::Confusion,
    ];

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            RuleTopic::URule => "u-rule",
            RuleTopic::WholeSyllable => "whole-syllable",
            RuleTopic::TonePlacement => "tone-placement",
            RuleTopic::Confusion => "confusion",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|topic| topic.slug() == raw)
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            RuleTopic::URule => "Spelling ü",
            RuleTopic::WholeSyllable => "Whole syllables",
            RuleTopic::TonePlacement => "Where the tone mark goes",
            RuleTopic::Confusion => "Easily confused pairs",
        }
    }

    /// Short lesson text shown before the quiz.
    #[must_use]
    pub fn summary(self) -> &'static str {
        match self {
            RuleTopic::URule => {
                "After j, q, x and y the dots on ü are dropped (ju, qu, xu, yu). After n and l they stay (nü, lü)."
            }
            RuleTopic::WholeSyllable => {
                "zhi chi shi ri zi ci si yi wu yu are memorised as a whole; the i in zhi..si is not a real ㄧ."
            }
            RuleTopic::TonePlacement => {
                "The mark goes on a, else e, else o. In iu and ui it goes on the second vowel."
            }
            RuleTopic::Confusion => {
                "Pairs that learners mix up most often; drill them in the sounds phase."
            }
        }
    }

    /// Reference lines for the lesson, taken from the mapping table.
    ///
    /// Whole syllables list their zhuyin and pinyin; the confusion topic
    /// lists each pair with its hint. Other topics have none.
    #[must_use]
    pub fn lesson_lines(self, table: &MappingTable) -> Vec<String> {
        match self {
            RuleTopic::WholeSyllable => table
                .special_syllables
                .iter()
                .map(|entry| format!("{} {}", entry.zhuyin, entry.pinyin))
                .collect(),
            RuleTopic::Confusion => table
                .confusion_pairs
                .iter()
                .map(|pair| format!("{}: {}", pair.pair.join(" / "), pair.hint))
                .collect(),
            RuleTopic::URule | RuleTopic::TonePlacement => Vec::new(),
        }
    }

    fn questions(self) -> &'static [QuizQuestion] {
        match self {
            RuleTopic::URule => U_RULE_QUIZ,
            RuleTopic::WholeSyllable => WHOLE_SYLLABLE_QUIZ,
            RuleTopic::TonePlacement => TONE_PLACEMENT_QUIZ,
            RuleTopic::Confusion => &[],
        }
    }

    /// Quiz questions as multiple-choice items, options in their listed order.
    ///
    /// The explanation travels as the item hint. Topics without a quiz yield
    /// an empty list.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Item` if a question is blank.
    pub fn quiz_items(self) -> Result<Vec<DrillItem>, CatalogError> {
        self.questions()
            .iter()
            .enumerate()
            .map(|(idx, q)| {
                let item = DrillItem::new(
                    format!("{}-{}", self.slug(), idx + 1),
                    q.question,
                    q.answer,
                    ItemType::Rule,
                )?
                .with_group(self.slug())
                .with_hint(q.explanation)
                .with_options(q.options.iter().map(|o| (*o).to_string()).collect());
                Ok(item)
            })
            .collect()
    }
}

impl std::fmt::Display for RuleTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GroupFilter;

    #[test]
    fn bundled_table_has_the_full_sound_inventory() {
        let table = bundled_mappings().unwrap();
        assert_eq!(table.initials.len(), 21);
        assert!(table.finals.len() >= 35);
        assert_eq!(table.special_syllables.len(), 16);
        assert!(!table.confusion_pairs.is_empty());
        assert_eq!(table.sound_count(), table.initials.len() + table.finals.len());
    }

    #[test]
    fn lessons_list_whole_syllables_and_confusion_pairs() {
        let table = bundled_mappings().unwrap();

        let whole = RuleTopic::WholeSyllable.lesson_lines(&table);
        assert_eq!(whole.len(), table.special_syllables.len());
        assert_eq!(whole[0], "ㄓ zhi");

        let confusion = RuleTopic::Confusion.lesson_lines(&table);
        assert_eq!(confusion.len(), table.confusion_pairs.len());
        assert!(confusion[0].starts_with("zh / z: "));

        assert!(RuleTopic::URule.lesson_lines(&table).is_empty());
    }

    #[test]
    fn palatal_group_selects_j_q_x() {
        let table = bundled_mappings().unwrap();
        let items = table.select(&GroupFilter::parse("palatal")).unwrap();
        let mut answers: Vec<_> = items.iter().map(|i| i.expected_answer()).collect();
        answers.sort_unstable();
        assert_eq!(answers, vec!["j", "q", "x"]);
    }

    #[test]
    fn pinyin_spellings_are_unique_per_table() {
        let table = bundled_mappings().unwrap();
        for entries in [&table.initials, &table.finals] {
            let mut spellings: Vec<_> = entries.iter().map(|e| e.pinyin.as_str()).collect();
            let before = spellings.len();
            spellings.sort_unstable();
            spellings.dedup();
            assert_eq!(spellings.len(), before);
        }
    }

    #[test]
    fn characters_are_deduplicated() {
        let chars = common_characters();
        assert!(chars.len() >= 30);
        let mut sorted = chars.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), chars.len());
        assert_eq!(chars[0], '的');
    }

    #[test]
    fn words_cover_a_full_session() {
        let words = word_items().unwrap();
        assert!(words.len() >= 20);
        let hello = words.iter().find(|w| w.prompt() == "你好").unwrap();
        assert_eq!(hello.expected_answer(), "ni hao");
        assert_eq!(hello.item_type(), ItemType::Word);
    }

    #[test]
    fn quiz_answers_are_among_their_options() {
        for topic in RuleTopic::ALL {
            for item in topic.quiz_items().unwrap() {
                let options = item.options().unwrap();
                assert_eq!(options.len(), 4);
                assert!(options.iter().any(|o| o == item.expected_answer()));
                assert!(item.hint().is_some());
                assert_eq!(item.item_type(), ItemType::Rule);
            }
        }
    }

    #[test]
    fn confusion_topic_has_no_quiz() {
        assert!(RuleTopic::Confusion.quiz_items().unwrap().is_empty());
        assert_eq!(RuleTopic::URule.quiz_items().unwrap().len(), 6);
    }

    #[test]
    fn topics_parse_from_slug() {
        assert_eq!(RuleTopic::parse("u-rule"), Some(RuleTopic::URule));
        assert_eq!(RuleTopic::parse(" tone-placement "), Some(RuleTopic::TonePlacement));
        assert_eq!(RuleTopic::parse("tones"), None);
    }
}
