/// Canonicalizes a free-text drug or compound name for comparison.
///
/// Lowercases, folds common Latin diacritics to ASCII, drops every character
/// other than ASCII alphanumerics, hyphen and space, and collapses runs of
/// whitespace. Idempotent, total, never panics; empty input yields `""`.
pub(crate) fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    let mut push = |ch: char, out: &mut String, pending_space: &mut bool| {
        let ch = ch.to_ascii_lowercase();
        if ch.is_whitespace() {
            *pending_space = true;
            return;
        }
        if !ch.is_ascii_alphanumeric() && ch != '-' {
            return;
        }
        if *pending_space {
            if !out.is_empty() {
                out.push(' ');
            }
            *pending_space = false;
        }
        out.push(ch);
    };

    for ch in text.chars() {
        match fold_diacritic(ch) {
            Some(folded) => {
                for ch in folded.chars() {
                    push(ch, &mut out, &mut pending_space);
                }
            }
            None => push(ch, &mut out, &mut pending_space),
        }
    }

    out
}

/// Maps accented Latin characters onto their ASCII base letters. Characters
/// outside the table fall through to the alphanumeric filter in [`normalize`].
fn fold_diacritic(ch: char) -> Option<&'static str> {
    Some(match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ñ' | 'Ñ' => "n",
        'ç' | 'Ç' => "c",
        'ß' => "ss",
        'æ' | 'Æ' => "ae",
        'ø' | 'Ø' => "o",
        'œ' | 'Œ' => "oe",
        _ => return None,
    })
}
