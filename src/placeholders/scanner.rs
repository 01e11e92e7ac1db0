#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    BackQuoted,
    LineComment,
    BlockComment(u32),
}

impl State {
    pub(super) fn quote_byte(self) -> Option<u8> {
        match self {
            State::SingleQuoted => Some(b'\''),
            State::DoubleQuoted => Some(b'"'),
            State::BackQuoted => Some(b'`'),
            _ => None,
        }
    }

    pub(super) fn describe(self) -> &'static str {
        match self {
            State::SingleQuoted => "unterminated string literal",
            State::DoubleQuoted | State::BackQuoted => "unterminated quoted identifier",
            State::BlockComment(_) => "unterminated block comment",
            State::Normal | State::LineComment => "complete statement",
        }
    }
}
