use std::cmp::Ordering;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Page-eligible image extensions (lowercase, without the dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif"];

/// Archive entry path prefixes that mark metadata/system entries rather than
/// pages (resource forks, AppleDouble files, hidden entries).
const METADATA_PREFIXES: &[&str] = &["__MACOSX", ".", "._"];

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Returns true when an archive entry path denotes a metadata/system entry.
/// Only meaningful for archive members; plain directories have no such
/// concept.
pub fn is_metadata_entry(name: &str) -> bool {
    METADATA_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Strip `./` components and reject paths escaping the archive root.
pub fn sanitize_zip_path(path: &Path) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) | Component::RootDir => return None,
        }
    }
    if clean.as_os_str().is_empty() { None } else { Some(clean) }
}

/// Case-insensitive natural comparison of entry names.
pub fn natural_cmp_name(a: &str, b: &str) -> Ordering {
    natural_cmp(&a.to_lowercase(), &b.to_lowercase())
}

/// Natural ("numeric-aware") string comparison: embedded digit runs compare
/// as integers, so `page2` sorts before `page10`. Ties on numeric value fall
/// back to digit count (fewer leading zeros first), then to the full string.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_tokens = tokenize(a).into_iter();
    let mut b_tokens = tokenize(b).into_iter();

    loop {
        match (a_tokens.next(), b_tokens.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a_tok), Some(b_tok)) => {
                let order = match (&a_tok, &b_tok) {
                    (Token::Number(a_digits, a_val), Token::Number(b_digits, b_val)) => {
                        a_val.cmp(b_val).then_with(|| a_digits.len().cmp(&b_digits.len()))
                    }
                    (Token::Text(a_text), Token::Text(b_text)) => a_text.cmp(b_text),
                    // A numeric run sorts ahead of text starting at the same
                    // position.
                    (Token::Number(..), Token::Text(..)) => Ordering::Less,
                    (Token::Text(..), Token::Number(..)) => Ordering::Greater,
                };
                if order != Ordering::Equal {
                    return order;
                }
            }
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Token<'a> {
    Text(&'a str),
    Number(&'a str, u128),
}

/// Split a name into alternating text and digit-run tokens.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let digits = bytes[pos].is_ascii_digit();
        while pos < bytes.len() && bytes[pos].is_ascii_digit() == digits {
            pos += 1;
        }
        let run = &input[start..pos];
        if digits {
            // Overlong runs saturate rather than fail; ordering among such
            // runs falls back to digit count.
            tokens.push(Token::Number(run, run.parse::<u128>().unwrap_or(u128::MAX)));
        } else {
            tokens.push(Token::Text(run));
        }
    }

    tokens
}
