/// Input style of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionStyle {
    #[default]
    Short,
    Paragraph,
}

impl QuestionStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionStyle::Short => "Short",
            QuestionStyle::Paragraph => "Paragraph",
        }
    }

    pub fn parse(s: &str) -> QuestionStyle {
        match s {
            "Paragraph" => QuestionStyle::Paragraph,
            _ => QuestionStyle::Short,
        }
    }
}

/// An ordered form field attached to a ticket type, collected before the
/// ticket is created. Independent lifecycle from tickets: answers are
/// snapshotted into responses at creation time.
#[derive(Debug, Clone)]
pub struct Question {
    pub question_id: i64,
    pub ticket_type_id: i64,
    pub label: String,
    pub placeholder: Option<String>,
    pub style: QuestionStyle,
    pub required: bool,
    pub min_length: Option<i64>,
    pub max_length: Option<i64>,
    pub order_index: i64,
}

#[derive(Debug, Clone, Default)]
pub struct NewQuestion {
    pub ticket_type_id: i64,
    pub label: String,
    pub placeholder: Option<String>,
    pub style: Option<QuestionStyle>,
    pub required: Option<bool>,
    pub min_length: Option<i64>,
    pub max_length: Option<i64>,
}
