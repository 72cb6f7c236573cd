//! Slug derivation and validation.
//!
//! Slugs are the public address of a note. Client-supplied slugs are kept
//! verbatim once they pass [`is_valid_slug`]; otherwise one is derived from
//! the title with [`slugify`].

/// Longest slug a note may carry, derived or supplied.
pub const SLUG_MAX_LENGTH: usize = 100;

/// Return `true` when `value` may be stored as a note slug.
///
/// Accepts ASCII letters, digits, hyphens and underscores, up to
/// [`SLUG_MAX_LENGTH`] characters.
pub fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= SLUG_MAX_LENGTH
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

/// Derive a URL-safe slug from arbitrary text.
///
/// The text is lowercased and transliterated to ASCII. Letters and digits are
/// kept; every run of whitespace, hyphens or punctuation becomes a single `-`.
/// Leading and trailing hyphens are dropped and the result is cut to
/// [`SLUG_MAX_LENGTH`]. Characters with no transliteration are dropped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            push_word(&mut slug, &mut pending_separator, ch.encode_utf8(&mut [0; 4]));
        } else if let Some(latin) = transliterate(ch) {
            // Soft and hard signs transliterate to nothing and must not split words.
            if !latin.is_empty() {
                push_word(&mut slug, &mut pending_separator, latin);
            }
        } else if ch.is_whitespace() || ch.is_ascii_punctuation() || is_dash(ch) {
            pending_separator = true;
        }
    }

    if slug.len() > SLUG_MAX_LENGTH {
        slug.truncate(SLUG_MAX_LENGTH);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// Why a title and optional client slug could not produce a storable slug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    #[error("slug may only contain latin letters, digits, hyphens and underscores (at most 100 characters)")]
    Invalid,
    #[error("could not derive a slug from the title; please provide one")]
    Underivable,
}

/// Pick the slug to persist for a new note.
///
/// A non-blank `supplied` slug wins and is kept verbatim if valid. Otherwise
/// the slug is derived from `title`. Uniqueness is not checked here; the
/// storage layer rejects collisions when the note is written.
pub fn resolve_slug(title: &str, supplied: Option<&str>) -> Result<String, SlugError> {
    match supplied.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) if is_valid_slug(slug) => Ok(slug.to_string()),
        Some(_) => Err(SlugError::Invalid),
        None => {
            let derived = slugify(title);
            if derived.is_empty() {
                Err(SlugError::Underivable)
            } else {
                Ok(derived)
            }
        }
    }
}

fn push_word(slug: &mut String, pending_separator: &mut bool, chunk: &str) {
    if *pending_separator && !slug.is_empty() {
        slug.push('-');
    }
    *pending_separator = false;
    slug.push_str(chunk);
}

fn is_dash(ch: char) -> bool {
    matches!(ch, '–' | '—' | '‒' | '−' | '«' | '»' | '“' | '”' | '‘' | '’' | '…' | '№')
}

/// ASCII rendering of a lowercase non-ASCII letter.
fn transliterate(ch: char) -> Option<&'static str> {
    let latin = match ch {
        // Russian
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "yi",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        // Ukrainian and Belarusian extras
        'і' => "i",
        'ї' => "yi",
        'є' => "ye",
        'ґ' => "g",
        'ў' => "u",
        // Latin with diacritics
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'ł' | 'ľ' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(latin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transliterates_russian_titles() {
        assert_eq!(slugify("Тестовая заметка"), "testovaya-zametka");
        assert_eq!(slugify("Заметка без slug"), "zametka-bez-slug");
        assert_eq!(slugify("Первая заметка"), "pervaya-zametka");
        assert_eq!(slugify("Щука и ёж"), "schuka-i-yozh");
    }

    #[test]
    fn drops_soft_and_hard_signs_without_splitting() {
        assert_eq!(slugify("Объявление"), "obyavlenie");
        assert_eq!(slugify("Съешь"), "sesh");
    }

    #[test]
    fn collapses_punctuation_and_whitespace() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  a -- b  "), "a-b");
        assert_eq!(slugify("Итоги — 2024"), "itogi-2024");
        assert_eq!(slugify("snake_case title"), "snake-case-title");
    }

    #[test]
    fn folds_latin_diacritics() {
        assert_eq!(slugify("Crème brûlée"), "creme-brulee");
        assert_eq!(slugify("Straße"), "strasse");
    }

    #[test]
    fn drops_characters_without_transliteration() {
        assert_eq!(slugify("日本 notes"), "notes");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn truncates_long_titles_without_trailing_hyphen() {
        let title = format!("{} tail", "a".repeat(SLUG_MAX_LENGTH - 1));
        let slug = slugify(&title);
        assert!(slug.len() <= SLUG_MAX_LENGTH);
        assert!(!slug.ends_with('-'));

        let long = "word ".repeat(40);
        assert!(slugify(&long).len() <= SLUG_MAX_LENGTH);
    }

    #[test]
    fn supplied_slug_is_kept_verbatim() {
        assert_eq!(
            resolve_slug("Тестовая заметка", Some("test_note")),
            Ok("test_note".to_string())
        );
        assert_eq!(resolve_slug("Title", Some("Mixed-Case_1")), Ok("Mixed-Case_1".to_string()));
    }

    #[test]
    fn blank_slug_falls_back_to_title() {
        assert_eq!(
            resolve_slug("Заметка без slug", None),
            Ok("zametka-bez-slug".to_string())
        );
        assert_eq!(resolve_slug("Моя заметка", Some("   ")), Ok("moya-zametka".to_string()));
    }

    #[test]
    fn rejects_invalid_or_underivable_slugs() {
        assert_eq!(resolve_slug("Title", Some("not valid!")), Err(SlugError::Invalid));
        assert_eq!(resolve_slug("???", None), Err(SlugError::Underivable));
    }

    #[test]
    fn slug_validation() {
        assert!(is_valid_slug("test_note"));
        assert!(is_valid_slug("Note-1"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("заметка"));
        assert!(!is_valid_slug(&"a".repeat(SLUG_MAX_LENGTH + 1)));
    }
}
