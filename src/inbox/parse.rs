//! Alert extraction from notification text

use super::{Alert, MailMessage};
use crate::signal::Direction;

const LONG_WORDS: &[&str] = &["buy", "bullish", "upgrade", "upgraded", "breakout"];
const SHORT_WORDS: &[&str] = &["sell", "bearish", "downgrade", "downgraded", "breakdown"];

const MAIL_HEADERS: &[&str] = &["from", "to", "subject", "date", "message-id"];

/// Split a raw message file into subject and body
///
/// A leading block of `Name: value` lines ending at the first blank line is
/// a header block when it names at least one standard mail header. Anything
/// else is all body.
pub fn split_message(raw: &str) -> (String, String) {
    let block: Vec<&str> = raw.lines().take_while(|l| !l.trim().is_empty()).collect();
    let headers: Option<Vec<(&str, &str)>> = block
        .iter()
        .map(|line| line.split_once(':').filter(|(name, _)| is_header_name(name)))
        .collect();

    let headers = match headers {
        Some(h)
            if h
                .iter()
                .any(|(name, _)| MAIL_HEADERS.contains(&name.to_ascii_lowercase().as_str())) =>
        {
            h
        }
        _ => return (String::new(), raw.trim().to_string()),
    };

    let subject = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("subject"))
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_default();
    let body: Vec<&str> = raw.lines().skip(block.len()).collect();
    (subject, body.join("\n").trim().to_string())
}

fn is_header_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Whether `s` looks like an exchange ticker: `AAPL`, `BRK.B`, `BF-B`
pub fn is_ticker(s: &str) -> bool {
    let (base, class) = match s.split_once(['.', '-']) {
        Some((base, class)) => (base, Some(class)),
        None => (s, None),
    };
    let upper = |part: &str, max: usize| {
        !part.is_empty() && part.len() <= max && part.chars().all(|c| c.is_ascii_uppercase())
    };
    upper(base, 6) && class.map_or(true, |c| upper(c, 2))
}

fn trim_token(token: &str) -> &str {
    let token = token.trim_end_matches(['.', ':', ',', ';', '!', '?', ')', '"']);
    let token = token
        .strip_suffix("'s")
        .or_else(|| token.strip_suffix("\u{2019}s"))
        .unwrap_or(token);
    token.trim_end_matches(['\'', '\u{2019}'])
}

/// Direction implied by the wording, if unambiguous
fn direction_hint(text: &str) -> Option<Direction> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|w| !w.is_empty())
        .collect();
    let long = words.iter().any(|w| LONG_WORDS.contains(w));
    let short = words.iter().any(|w| SHORT_WORDS.contains(w));
    match (long, short) {
        (true, false) => Some(Direction::Long),
        (false, true) => Some(Direction::Short),
        _ => None,
    }
}

/// Extract ticker alerts from a notification
///
/// Symbols come from `$TICKER` cashtags and from `Symbol:` or `Ticker:`
/// lines. Every alert from one message shares its direction hint.
pub fn parse_alerts(message: &MailMessage) -> Vec<Alert> {
    let text = format!("{}\n{}", message.subject, message.body);
    let hint = direction_hint(&text);
    let mut symbols: Vec<String> = Vec::new();
    let mut push = |symbol: String| {
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    };

    for token in text.split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '(' | '"')) {
        if let Some(tag) = token.strip_prefix('$') {
            let tag = trim_token(tag);
            if is_ticker(tag) {
                push(tag.to_string());
            }
        }
    }

    for line in text.lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if !(name.eq_ignore_ascii_case("symbol") || name.eq_ignore_ascii_case("ticker")) {
            continue;
        }
        let Some(first) = value.split_whitespace().next() else {
            continue;
        };
        let candidate = trim_token(first.trim_start_matches('$')).to_uppercase();
        if is_ticker(&candidate) {
            push(candidate);
        }
    }

    symbols
        .into_iter()
        .map(|symbol| Alert { symbol, hint })
        .collect()
}
