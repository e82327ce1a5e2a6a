//! Static reference data: the question catalog, the emotion table,
//! default tags and the keyword stopword list.

use ahash::AHashSet;
use once_cell::sync::Lazy;
use serde::Serialize;

pub const NEVER_AGAIN: &str = "never_again";
pub const ENERGY_DRAIN: &str = "energy_drain";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Pride,
    Avoidance,
    Growth,
    Energy,
    Relationship,
    Awareness,
}

impl QuestionCategory {
    pub fn label(self) -> &'static str {
        match self {
            QuestionCategory::Pride => "자랑스러움",
            QuestionCategory::Avoidance => "반복 방지",
            QuestionCategory::Growth => "성장",
            QuestionCategory::Energy => "에너지",
            QuestionCategory::Relationship => "관계",
            QuestionCategory::Awareness => "인지",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReflectionQuestion {
    pub id: &'static str,
    pub emoji: &'static str,
    pub question: &'static str,
    pub placeholder: &'static str,
    pub category: QuestionCategory,
}

pub const QUESTIONS: &[ReflectionQuestion] = &[
    ReflectionQuestion {
        id: "proud_moment",
        emoji: "🏆",
        question: "오늘 하루 중 너무나 뿌듯한 순간이 있었나요?\n그렇다면 언제였나요?",
        placeholder: "작은 성취도 좋아요. 어떤 순간이었는지 떠올려보세요...",
        category: QuestionCategory::Pride,
    },
    ReflectionQuestion {
        id: NEVER_AGAIN,
        emoji: "🚫",
        question: "다시 반복하고 싶지 않은 일이 있었나요?\n그렇다면 어떤 건가요?",
        placeholder: "불편했던 상황, 후회되는 선택, 시간 낭비...",
        category: QuestionCategory::Avoidance,
    },
    ReflectionQuestion {
        id: "self_praise",
        emoji: "⭐",
        question: "스스로 자랑스러운 순간이 있었나요?\n그렇다면 언제인가요?",
        placeholder: "남들은 모를 수 있지만, 나만 아는 나의 대단한 순간...",
        category: QuestionCategory::Pride,
    },
    ReflectionQuestion {
        id: ENERGY_DRAIN,
        emoji: "🔋",
        question: "에너지가 확 빠지는 순간이 있었나요?\n무엇이 그렇게 만들었나요?",
        placeholder: "어떤 사람, 상황, 업무가 에너지를 가져갔나요?",
        category: QuestionCategory::Energy,
    },
    ReflectionQuestion {
        id: "energy_charge",
        emoji: "⚡",
        question: "반대로 에너지가 확 차오른 순간은요?\n무엇이 나를 충전시켰나요?",
        placeholder: "신나는 대화, 몰입했던 작업, 좋은 소식...",
        category: QuestionCategory::Energy,
    },
    ReflectionQuestion {
        id: "kept_postponing",
        emoji: "⏰",
        question: "계속 미루고 있는 것이 있나요?\n왜 미루게 되는 걸까요?",
        placeholder: "미루는 이유를 솔직하게 적어보세요...",
        category: QuestionCategory::Awareness,
    },
    ReflectionQuestion {
        id: "surprised_self",
        emoji: "😲",
        question: "오늘 나 자신에 대해 새롭게 알게 된 것이 있나요?",
        placeholder: "예상 못한 반응, 새로운 취향, 의외의 감정...",
        category: QuestionCategory::Growth,
    },
    ReflectionQuestion {
        id: "relationship_moment",
        emoji: "🤝",
        question: "누군가와의 관계에서 인상 깊었던 순간이 있나요?",
        placeholder: "감사했던 것, 서운했던 것, 깊어진 대화...",
        category: QuestionCategory::Relationship,
    },
    ReflectionQuestion {
        id: "if_redo",
        emoji: "🔄",
        question: "오늘을 다시 살 수 있다면\n딱 하나 바꾸고 싶은 것은?",
        placeholder: "하나만 바꾼다면 무엇을 어떻게?",
        category: QuestionCategory::Avoidance,
    },
    ReflectionQuestion {
        id: "body_signal",
        emoji: "🧘",
        question: "몸이 보낸 신호가 있었나요?\n(피곤함, 통증, 긴장 등)",
        placeholder: "어깨가 뻣뻣, 눈이 피로, 소화가 안 됐다...",
        category: QuestionCategory::Awareness,
    },
    ReflectionQuestion {
        id: "decision_made",
        emoji: "🎯",
        question: "오늘 내린 결정 중\n가장 중요했던 것은 무엇인가요?",
        placeholder: "크든 작든, 의미 있었던 선택...",
        category: QuestionCategory::Growth,
    },
    ReflectionQuestion {
        id: "gratitude",
        emoji: "🙏",
        question: "오늘 감사한 것이 있다면\n무엇인가요?",
        placeholder: "당연하다고 넘겼지만, 사실 감사한 것...",
        category: QuestionCategory::Growth,
    },
];

pub fn question(id: &str) -> Option<&'static ReflectionQuestion> {
    QUESTIONS.iter().find(|q| q.id == id)
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Emotion {
    pub id: &'static str,
    pub emoji: &'static str,
    pub label: &'static str,
    pub is_negative: bool,
}

pub const EMOTIONS: &[Emotion] = &[
    Emotion { id: "frustrated", emoji: "😤", label: "답답함", is_negative: true },
    Emotion { id: "sad", emoji: "😔", label: "우울", is_negative: true },
    Emotion { id: "anxious", emoji: "😰", label: "불안", is_negative: true },
    Emotion { id: "tired", emoji: "😮‍💨", label: "지침", is_negative: true },
    Emotion { id: "neutral", emoji: "😐", label: "무감각", is_negative: false },
    Emotion { id: "thinking", emoji: "🤔", label: "고민", is_negative: false },
    Emotion { id: "calm", emoji: "😌", label: "평온", is_negative: false },
    Emotion { id: "happy", emoji: "😊", label: "기쁨", is_negative: false },
    Emotion { id: "fire", emoji: "🔥", label: "열정", is_negative: false },
    Emotion { id: "insight", emoji: "💡", label: "깨달음", is_negative: false },
];

/// Emotions that count as a strength signal. Neutral and thinking are neither.
pub const POSITIVE_EMOJIS: [&str; 4] = ["😊", "🔥", "💡", "😌"];

pub fn emotion_by_emoji(emoji: &str) -> Option<&'static Emotion> {
    EMOTIONS.iter().find(|e| e.emoji == emoji)
}

/// Accepts either the emoji itself or the emotion id (`tired`, `happy`, ...).
pub fn resolve_emotion(code: &str) -> Option<&'static Emotion> {
    EMOTIONS.iter().find(|e| e.emoji == code || e.id == code)
}

pub fn is_negative_emotion(emoji: &str) -> bool {
    emotion_by_emoji(emoji).map(|e| e.is_negative).unwrap_or(false)
}

pub fn is_positive_emotion(emoji: &str) -> bool {
    POSITIVE_EMOJIS.contains(&emoji)
}

pub const DEFAULT_TAGS: [&str; 12] = [
    "업무", "의사결정", "관계", "건강", "시간관리", "감정", "학습", "습관", "돈", "에너지", "창작", "루틴",
];

static STOPWORDS: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
    [
        "그리고", "하지만", "그래서", "이것", "저것", "그것", "오늘", "내가", "나는", "것이", "하는", "있는",
        "없는", "같은", "하고", "있다", "없다", "했다", "되는", "하면", "해서", "인데", "으로", "에서", "까지",
        "부터", "이다", "것은", "것을", "나도", "내일", "어제", "좀", "더", "잘", "못", "수", "거", "게", "건",
        "걸", "를", "을", "는", "은", "이", "가", "에", "도", "의", "과", "와", "로", "며", "고", "면", "때",
        "번", "중", "날", "것", "한", "안", "그", "저", "이런", "저런", "그런", "뭔가", "어떤", "이걸", "그걸",
    ]
    .into_iter()
    .collect()
});

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}
