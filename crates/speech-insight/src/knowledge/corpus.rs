use super::document::{Category, KnowledgeDocument};

/// Immutable catalog of categorized expert snippets.
///
/// Built once at startup and shared behind an `Arc`; nothing mutates it after
/// construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeCorpus {
    documents: Vec<KnowledgeDocument>,
}

impl KnowledgeCorpus {
    pub fn new(documents: Vec<KnowledgeDocument>) -> Self {
        Self { documents }
    }

    /// The twelve speech-analysis documents shipped with the crate.
    pub fn builtin() -> Self {
        let documents = BUILTIN_DOCUMENTS
            .iter()
            .map(|(id, category, content)| KnowledgeDocument::new(*id, *category, *content))
            .collect();
        Self { documents }
    }

    pub fn documents(&self) -> &[KnowledgeDocument] {
        &self.documents
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &KnowledgeDocument> {
        self.documents
            .iter()
            .filter(move |doc| doc.category == category)
    }

    pub fn get(&self, id: &str) -> Option<&KnowledgeDocument> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

const BUILTIN_DOCUMENTS: &[(&str, Category, &str)] = &[
    (
        "comm_001",
        Category::Communication,
        "Speech Rate Analysis Guidelines:
- Normal speech rate: 120-160 words per minute (WPM)
- Fast speech (>160 WPM): May indicate excitement, nervousness, or urgency
- Slow speech (<120 WPM): May indicate thoughtfulness, uncertainty, or emphasis
- Optimal presentation rate: 140-150 WPM for clarity and engagement
- Professional speakers typically maintain 130-150 WPM for maximum comprehension",
    ),
    (
        "comm_002",
        Category::Communication,
        "Clarity and Fluency Indicators:
- High clarity: Complete sentences, logical flow, minimal filler words
- Moderate clarity: Some incomplete thoughts, occasional hesitations
- Low clarity: Frequent restarts, unclear references, disorganized structure
- Fluency markers: Smooth transitions, consistent pacing, natural pauses
- Disfluency markers: Excessive 'um', 'uh', false starts, word repetitions",
    ),
    (
        "comm_003",
        Category::Communication,
        "Vocabulary and Speech Structure:
- Advanced vocabulary: Domain-specific terms, varied word choice, precise language
- Intermediate vocabulary: Common professional terms, adequate variety
- Basic vocabulary: Simple words, limited range, repetitive expressions
- Well-structured speech: Clear introduction, logical progression, strong conclusion
- Disorganized speech: Random topic jumps, missing transitions, unclear purpose",
    ),
    (
        "conf_001",
        Category::Confidence,
        "Vocal Confidence Indicators:
- High confidence: Steady pitch, consistent volume, decisive pauses
- Moderate confidence: Some pitch variation, adequate projection
- Low confidence: Pitch instability, volume drops, excessive hesitation
- Pitch variance 15-25 Hz: Normal, indicates engaged speaking
- Pitch variance >40 Hz: May indicate nervousness or emotional arousal
- Pitch variance <10 Hz: May indicate monotone delivery or disengagement",
    ),
    (
        "conf_002",
        Category::Confidence,
        "Pause Analysis for Confidence Assessment:
- Strategic pauses (0.5-1.5s): Indicate confidence and emphasis
- Hesitation pauses (>2s): May indicate uncertainty or searching for words
- Pause ratio <0.15: Good fluency, confident delivery
- Pause ratio 0.15-0.25: Normal conversational pauses
- Pause ratio >0.25: May indicate reduced fluency or nervousness
- Filler-free pauses suggest intentional emphasis and control",
    ),
    (
        "conf_003",
        Category::Confidence,
        "Energy Level and Emotional Tone:
- High energy: Strong projection, dynamic intonation, engaged delivery
- Medium energy: Adequate volume, some variation, professional tone
- Low energy: Soft voice, flat intonation, possible fatigue or disinterest
- Calm emotion: Steady baseline, controlled responses, measured delivery
- Engaged emotion: Appropriate enthusiasm, responsive to content
- Nervous emotion: Elevated baseline, rushed delivery, vocal tension",
    ),
    (
        "pers_001",
        Category::Personality,
        "Communication-Based Personality Indicators:
- Extroverted tendencies: Higher speech rate, more expressive, longer speaking turns
- Introverted tendencies: Measured pace, thoughtful pauses, concise responses
- Balanced personality: Adaptable style, moderate expressiveness, situational awareness
- Note: These are behavioral tendencies, not diagnostic classifications
- Communication style reflects situational behavior, not fixed personality traits",
    ),
    (
        "pers_002",
        Category::Personality,
        "Assertiveness in Speech Patterns:
- High assertiveness: Direct statements, clear opinions, confident tone
- Moderate assertiveness: Balanced approach, considers alternatives
- Low assertiveness: Hedging language, tentative statements, seeking approval
- Assertive markers: 'I believe', 'I recommend', definitive conclusions
- Non-assertive markers: 'Maybe', 'I think perhaps', 'if that's okay'",
    ),
    (
        "pers_003",
        Category::Personality,
        "Expressiveness and Communication Style:
- High expressiveness: Rich intonation, emotional variety, animated delivery
- Moderate expressiveness: Professional warmth, appropriate emphasis
- Low expressiveness: Monotone delivery, limited emotional range
- Expressive speakers connect better with audiences but may seem less formal
- Reserved speakers appear more professional but may seem distant
- Optimal expressiveness depends on context and communication goals",
    ),
    (
        "improve_001",
        Category::Improvement,
        "Speech Rate Improvement Tips:
- If too fast: Practice deliberate pausing, use breathing techniques
- If too slow: Record and review, focus on key message points
- Use varied pacing for emphasis - slow down for important points
- Practice with a metronome or pacing app for consistency
- Record practice sessions and compare to target rate",
    ),
    (
        "improve_002",
        Category::Improvement,
        "Confidence Building Techniques:
- Power posing before speaking can increase confidence hormones
- Preparation reduces uncertainty and builds natural confidence
- Start with strong opening statements to establish authority
- Practice diaphragmatic breathing for voice steadiness
- Record yourself to identify and address nervous habits
- Focus on message value rather than self-evaluation during delivery",
    ),
    (
        "improve_003",
        Category::Improvement,
        "Communication Clarity Enhancement:
- Use the PREP method: Point, Reason, Example, Point
- Eliminate filler words through awareness and practice
- Structure thoughts before speaking using mental outlines
- Practice transitional phrases for smooth topic changes
- Use concrete examples to illustrate abstract concepts
- Pause before complex explanations to organize thoughts",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn test_builtin_corpus_has_three_documents_per_category() {
        let corpus = KnowledgeCorpus::builtin();
        assert_eq!(corpus.len(), 12);
        for category in Category::iter() {
            assert_eq!(corpus.by_category(category).count(), 3, "{category}");
        }
    }

    #[test]
    fn test_builtin_ids_are_unique() {
        let corpus = KnowledgeCorpus::builtin();
        let ids: HashSet<_> = corpus.documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids.len(), corpus.len());
    }

    #[test]
    fn test_lookup_by_id() {
        let corpus = KnowledgeCorpus::builtin();
        let doc = corpus.get("conf_002").unwrap();
        assert_eq!(doc.category, Category::Confidence);
        assert!(doc.content.starts_with("Pause Analysis"));
        assert!(corpus.get("missing").is_none());
    }
}
