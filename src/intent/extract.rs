// Amount and recipient extraction for payment commands

use super::RecipientRef;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b0x[0-9a-fA-F]{40}\b").expect("address pattern is valid"));

// Anything that looks like hex, so address digits never count as an amount
static HEX_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b0[xX]\w*").expect("hex token pattern is valid"));

static THOUSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d),(\d{3})\b").expect("thousands pattern is valid"));

// First number not glued to a preceding word; a leading '-' is kept so negatives get rejected later
static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w.\-])(-?(?:\d+(?:\.\d+)?|\.\d+))").expect("amount pattern is valid")
});

static TO_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bto\s+@?([a-z0-9_][a-z0-9_.\-]*)").expect("to-word pattern is valid"));

const NOT_A_RECIPIENT: [&str; 14] = [
    "usdc", "usd", "dollar", "dollars", "bucks", "my", "me", "the", "a", "an", "someone", "him",
    "her", "them",
];

/// First decimal number in `text`, thousands separators removed
pub fn amount(text: &str) -> Option<String> {
    let mut normalized = HEX_TOKEN.replace_all(text, " ").into_owned();
    loop {
        let next = THOUSANDS.replace_all(&normalized, "${1}${2}").into_owned();
        if next == normalized {
            break;
        }
        normalized = next;
    }

    let raw = AMOUNT.captures(&normalized).and_then(|c| c.get(1))?.as_str();
    // ".5" is read as "0.5"
    Some(match raw.strip_prefix('-') {
        Some(rest) if rest.starts_with('.') => format!("-0{}", rest),
        _ if raw.starts_with('.') => format!("0{}", raw),
        _ => raw.to_string(),
    })
}

/// Literal address, else a known alias, else the word after "to"
pub fn recipient(text: &str, aliases: &BTreeSet<String>) -> Option<RecipientRef> {
    if let Some(m) = ADDRESS.find(text) {
        return Some(RecipientRef::Address(m.as_str().to_string()));
    }

    let lower = text.to_lowercase();
    if let Some(alias) = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .find(|token| aliases.contains(*token))
    {
        return Some(RecipientRef::Name(alias.to_string()));
    }

    let word = TO_WORD
        .captures(&lower)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_end_matches(&['.', '-'][..]))?;

    if word.is_empty() || NOT_A_RECIPIENT.contains(&word) || word.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if word.starts_with("0x") {
        return Some(RecipientRef::Address(word.to_string()));
    }
    Some(RecipientRef::Name(word.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases() -> BTreeSet<String> {
        ["alice", "bob", "merchant"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_amount_extraction() {
        assert_eq!(amount("send 10 USDC to bob").as_deref(), Some("10"));
        assert_eq!(amount("send $5.25").as_deref(), Some("5.25"));
        assert_eq!(amount("send 12usdc").as_deref(), Some("12"));
        assert_eq!(amount("send -5 to bob").as_deref(), Some("-5"));
        assert_eq!(amount("send 2,500,000 to bob").as_deref(), Some("2500000"));
        assert_eq!(amount("send .5 to bob").as_deref(), Some("0.5"));
        assert_eq!(amount("send -.5 to bob").as_deref(), Some("-0.5"));
        assert_eq!(amount("upgrade v1.2 now"), None);
        assert_eq!(amount("pay bob2 nothing"), None);
        assert_eq!(amount("send to 0xabc123 now"), None);
    }

    #[test]
    fn test_recipient_prefers_literal_address() {
        let addr = "0xf37a740f4c3f7afd7269cec210525f85cb03e57a";
        let text = format!("send bob 1 at {}", addr);
        assert_eq!(recipient(&text, &aliases()), Some(RecipientRef::Address(addr.into())));
    }

    #[test]
    fn test_recipient_to_word() {
        assert_eq!(
            recipient("pay 5 to @Dave.", &aliases()),
            Some(RecipientRef::Name("dave".into()))
        );
        assert_eq!(
            recipient("send 5 to 0x12", &aliases()),
            Some(RecipientRef::Address("0x12".into()))
        );
        assert_eq!(recipient("send 5 to my friend", &aliases()), None);
        assert_eq!(recipient("send 5 usdc today", &aliases()), None);
        assert_eq!(recipient("transfer 5 into savings", &aliases()), None);
    }
}
