use super::GlyphString;

// Letters outside the panel fonts' glyph set, folded to their base ASCII letter.
const REPLACEMENTS: [(char, char); 36] = [
    // Polish
    ('ą', 'a'),
    ('ć', 'c'),
    ('ę', 'e'),
    ('ł', 'l'),
    ('ń', 'n'),
    ('ó', 'o'),
    ('ś', 's'),
    ('ź', 'z'),
    ('ż', 'z'),
    ('Ą', 'A'),
    ('Ć', 'C'),
    ('Ę', 'E'),
    ('Ł', 'L'),
    ('Ń', 'N'),
    ('Ó', 'O'),
    ('Ś', 'S'),
    ('Ź', 'Z'),
    ('Ż', 'Z'),
    // Czech
    ('ř', 'r'),
    ('Ř', 'R'),
    ('č', 'c'),
    ('Č', 'C'),
    ('š', 's'),
    ('Š', 'S'),
    ('ž', 'z'),
    ('Ž', 'Z'),
    ('ů', 'u'),
    ('Ů', 'U'),
    ('ě', 'e'),
    ('Ě', 'E'),
    // Turkish
    ('ğ', 'g'),
    ('Ğ', 'G'),
    ('ı', 'i'),
    ('İ', 'I'),
    ('ş', 's'),
    ('Ş', 'S'),
];

/// Folds unsupported Latin-extended letters to ASCII; everything else passes through.
///
/// Input longer than [`super::GLYPH_STRING_BYTES`] is cut at the last whole character that fits.
pub fn transliterate(text: &str) -> GlyphString {
    let mut out = GlyphString::new();
    for ch in text.chars() {
        let mapped = REPLACEMENTS
            .iter()
            .find(|(from, _)| *from == ch)
            .map_or(ch, |(_, to)| *to);
        if out.push(mapped).is_err() {
            break;
        }
    }
    out
}
