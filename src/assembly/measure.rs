/// Measures how much of the character budget a snippet consumes.
pub trait LengthMeter {
    fn measure(&self, content: &str) -> usize;
}

/// Unicode scalar values (`str::chars`).
#[derive(Debug, Default, Clone, Copy)]
pub struct CharCount;

impl LengthMeter for CharCount {
    fn measure(&self, content: &str) -> usize {
        content.chars().count()
    }
}

/// UTF-16 code units, the string length editors and JS hosts report.
///
/// The assembler's default: budgets arrive from the editor side, so both must
/// agree on astral-plane characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf16Len;

impl LengthMeter for Utf16Len {
    fn measure(&self, content: &str) -> usize {
        content.encode_utf16().count()
    }
}
