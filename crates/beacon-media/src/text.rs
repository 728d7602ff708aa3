// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text layout and time formatting for cards and narration.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Clock format used on cards and in narration, e.g. `3:04 PM`.
const CLOCK_FORMAT: &str = "%-I:%M %p";

/// Greedy word-wrap at `columns` characters, keeping at most `max_lines`.
///
/// A single word longer than `columns` stays on its own line unbroken.
pub fn wrap_text(text: &str, columns: usize, max_lines: usize) -> Vec<String> {
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return vec![String::new()];
    };

    let mut lines = Vec::new();
    let mut current = first.to_string();
    for word in words {
        if current.chars().count() + 1 + word.chars().count() <= columns {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
    lines.truncate(max_lines);
    lines
}

/// `h:mm AM TZ - h:mm PM TZ` in the display timezone.
pub fn time_range(start: DateTime<Utc>, end: DateTime<Utc>, tz: Tz) -> String {
    let fmt = format!("{CLOCK_FORMAT} %Z");
    format!(
        "{} - {}",
        start.with_timezone(&tz).format(&fmt),
        end.with_timezone(&tz).format(&fmt)
    )
}

/// Spoken form of an instant, `h:mm AM`, in the display timezone.
pub fn spoken_time(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format(CLOCK_FORMAT).to_string()
}

/// Fills the narration template's `{end}` and `{message}` placeholders.
pub fn narration_text(template: &str, end: &str, message: &str) -> String {
    template.replace("{end}", end).replace("{message}", message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text("Please do not disturb, I am presenting to the board", 30, 5);
        assert_eq!(lines, vec!["Please do not disturb, I am", "presenting to the board"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 30));
    }

    #[test]
    fn caps_line_count() {
        let long = "word ".repeat(100);
        assert_eq!(wrap_text(&long, 10, 5).len(), 5);
    }

    #[test]
    fn empty_message_yields_one_blank_line() {
        assert_eq!(wrap_text("   ", 30, 5), vec![String::new()]);
    }

    #[test]
    fn overlong_word_is_kept_whole() {
        let lines = wrap_text("a supercalifragilisticexpialidocious b", 10, 5);
        assert_eq!(lines, vec!["a", "supercalifragilisticexpialidocious", "b"]);
    }

    #[test]
    fn formats_range_in_display_zone() {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 19, 4, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 15, 20, 30, 0).unwrap();
        let tz: Tz = "America/New_York".parse().unwrap();
        assert_eq!(time_range(start, end, tz), "2:04 PM EST - 3:30 PM EST");
        assert_eq!(spoken_time(end, tz), "3:30 PM");
    }

    #[test]
    fn fills_template() {
        let text = narration_text("Busy until {end}. Note: {message}", "3:30 PM", "call me");
        assert_eq!(text, "Busy until 3:30 PM. Note: call me");
    }

    mod props {
        use super::super::wrap_text;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn wrapped_lines_fit_and_keep_word_order(
                words in prop::collection::vec("[a-zA-Z]{1,12}", 0..40),
                columns in 5usize..40,
                max_lines in 1usize..8,
            ) {
                let text = words.join(" ");
                let lines = wrap_text(&text, columns, max_lines);

                prop_assert!(!lines.is_empty());
                prop_assert!(lines.len() <= max_lines);
                for line in &lines {
                    prop_assert!(line.chars().count() <= columns || !line.contains(' '));
                }
                let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split_whitespace()).collect();
                prop_assert_eq!(&rejoined[..], &words[..rejoined.len()]);
            }
        }
    }
}
