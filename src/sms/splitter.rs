//! Message splitting into transport-sized parts.
//!
//! GSM segmentation: texts in the GSM 03.38 default alphabet are measured in
//! septets (160 single / 153 per part when a concatenation header is needed),
//! everything else in UCS-2 code units (70 / 67). Characters from the
//! extension table take two septets and are never cut in half, nor are
//! surrogate pairs.
//!
//! CHANGELOG:
//! - 03/02/2026 - Initial implementation

/// Divides an outbound text into ordered parts.
pub trait MessageSplitter: Send + Sync {
    fn split(&self, text: &str) -> Vec<String>;
}

pub const GSM7_SINGLE_LIMIT: usize = 160;
pub const GSM7_PART_LIMIT: usize = 153;
pub const UCS2_SINGLE_LIMIT: usize = 70;
pub const UCS2_PART_LIMIT: usize = 67;

const GSM7_BASIC: &str = "@£$¥èéùìòÇ\nØø\rÅåΔ_ΦΓΛΩΠΨΣΘΞÆæßÉ !\"#¤%&'()*+,-./0123456789:;<=>?\
¡ABCDEFGHIJKLMNOPQRSTUVWXYZÄÖÑÜ§¿abcdefghijklmnopqrstuvwxyzäöñüà";

const GSM7_EXTENSION: &str = "\u{0C}^{}\\[~]|€";

/// Text encoding chosen for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Gsm7,
    Ucs2,
}

/// Septets needed for `c` in the GSM alphabet, `None` if not representable.
fn gsm7_cost(c: char) -> Option<usize> {
    if GSM7_BASIC.contains(c) {
        Some(1)
    } else if GSM7_EXTENSION.contains(c) {
        Some(2)
    } else {
        None
    }
}

pub fn encoding_for(text: &str) -> Encoding {
    if text.chars().all(|c| gsm7_cost(c).is_some()) {
        Encoding::Gsm7
    } else {
        Encoding::Ucs2
    }
}

/// GSM 03.38 / UCS-2 splitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct GsmSplitter;

impl GsmSplitter {
    fn split_by<F>(text: &str, single_limit: usize, part_limit: usize, cost: F) -> Vec<String>
    where
        F: Fn(char) -> usize,
    {
        let total: usize = text.chars().map(&cost).sum();
        if total <= single_limit {
            return vec![text.to_string()];
        }

        let mut parts = Vec::new();
        let mut current = String::new();
        let mut used = 0;
        for c in text.chars() {
            let c_cost = cost(c);
            if used + c_cost > part_limit {
                parts.push(std::mem::take(&mut current));
                used = 0;
            }
            current.push(c);
            used += c_cost;
        }
        if !current.is_empty() {
            parts.push(current);
        }
        parts
    }
}

impl MessageSplitter for GsmSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        let encoding = encoding_for(text);
        let parts = match encoding {
            Encoding::Gsm7 => Self::split_by(text, GSM7_SINGLE_LIMIT, GSM7_PART_LIMIT, |c| {
                gsm7_cost(c).unwrap_or(2)
            }),
            Encoding::Ucs2 => {
                Self::split_by(text, UCS2_SINGLE_LIMIT, UCS2_PART_LIMIT, char::len_utf16)
            }
        };
        tracing::debug!(?encoding, parts = parts.len(), "split message");
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_one_empty_part() {
        assert_eq!(GsmSplitter.split(""), vec![String::new()]);
    }

    #[test]
    fn test_single_part_limits() {
        let text = "a".repeat(160);
        assert_eq!(GsmSplitter.split(&text).len(), 1);

        let text = "ж".repeat(70);
        assert_eq!(GsmSplitter.split(&text).len(), 1);
    }

    #[test]
    fn test_gsm7_multipart() {
        let text = "a".repeat(161);
        let parts = GsmSplitter.split(&text);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 153);
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn test_ucs2_multipart() {
        let text = "ж".repeat(71);
        let parts = GsmSplitter.split(&text);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].chars().count(), 67);
        assert_eq!(parts[1].chars().count(), 4);
    }

    #[test]
    fn test_extension_chars_cost_two_and_stay_whole() {
        // 80 euro signs = 160 septets, still one part
        assert_eq!(GsmSplitter.split(&"€".repeat(80)).len(), 1);

        // 152 septets of 'a' then a euro sign: the euro does not fit in part one
        let text = format!("{}€{}", "a".repeat(152), "b".repeat(10));
        let parts = GsmSplitter.split(&text);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], "a".repeat(152));
        assert!(parts[1].starts_with('€'));
    }

    #[test]
    fn test_surrogate_pairs_not_split() {
        // Each emoji is two UTF-16 units; 67 is odd so a pair must move over
        let text = "😀".repeat(40);
        let parts = GsmSplitter.split(&text);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].chars().count(), 33);
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn test_encoding_detection() {
        assert_eq!(encoding_for("Running late"), Encoding::Gsm7);
        assert_eq!(encoding_for("Grüße"), Encoding::Gsm7);
        assert_eq!(encoding_for("Привет"), Encoding::Ucs2);
    }
}
