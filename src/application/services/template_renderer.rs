use chrono::{Datelike, NaiveDate, Weekday};

use crate::domain::value_objects::calendar_day::format_day;
use crate::domain::value_objects::weekday_format::WeekdayFormat;

/// Ceiling on conditional resolution passes. Each pass collapses every
/// currently-innermost block, so this bounds nesting depth, not block count;
/// markup nested deeper simply stops changing.
const MAX_CONDITIONAL_PASSES: usize = 16;

const IF_OPEN: &str = "{{if:";
const IF_CLOSE: &str = "{{/if}}";
const DATE_OPEN: &str = "{{date:";
const TAG_END: &str = "}}";

// Format codes, longest first per family so "MMMM" is never read as "MM"+"MM".
const FORMAT_CODES: &[&str] = &[
    "YYYY", "YY", "MMMM", "MMM", "MM", "M", "dddd", "ddd", "DD", "D",
];

/// Expands a template against one reference calendar date. Two constructs:
/// `{{date:FORMAT}}` tokens and `{{if:COND}}...{{/if}}` blocks. Rendering
/// never fails; malformed markup is left verbatim or collapsed, and empty
/// input renders to an empty string.
pub fn render_template(input: &str, reference: NaiveDate) -> String {
    if input.is_empty() {
        return String::new();
    }
    let resolved = resolve_conditionals(input, reference);
    expand_date_tokens(&resolved, reference)
}

fn expand_date_tokens(input: &str, reference: NaiveDate) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find(DATE_OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + DATE_OPEN.len()..];
        match after_open.find(TAG_END) {
            Some(end) => {
                out.push_str(&expand_format(&after_open[..end], reference));
                rest = &after_open[end + TAG_END.len()..];
            }
            None => {
                // Unterminated token stays as-is.
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Substitutes each recognized format code independently; anything else in
/// the FORMAT string passes through unchanged.
fn expand_format(format: &str, reference: NaiveDate) -> String {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;

    'outer: while !rest.is_empty() {
        for code in FORMAT_CODES {
            if let Some(tail) = rest.strip_prefix(code) {
                out.push_str(&expand_code(code, reference));
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

fn expand_code(code: &str, reference: NaiveDate) -> String {
    match code {
        "YYYY" => format!("{:04}", reference.year()),
        "YY" => format!("{:02}", reference.year().rem_euclid(100)),
        "MMMM" => reference.format("%B").to_string(),
        "MMM" => reference.format("%b").to_string(),
        "MM" => format!("{:02}", reference.month()),
        "M" => reference.month().to_string(),
        "DD" => format!("{:02}", reference.day()),
        "D" => reference.day().to_string(),
        "dddd" => reference.weekday().to_long_en().to_string(),
        "ddd" => reference.weekday().to_short_en().to_string(),
        _ => code.to_string(),
    }
}

/// Collapses conditional blocks innermost-first until the text stops
/// changing. Unbalanced markup stabilizes early and is not an error.
fn resolve_conditionals(input: &str, reference: NaiveDate) -> String {
    let mut current = input.to_string();
    for _ in 0..MAX_CONDITIONAL_PASSES {
        match collapse_innermost_blocks(&current, reference) {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

/// One left-to-right sweep collapsing every resolvable `{{if:}}...{{/if}}`
/// pair: each close marker is paired with the nearest open marker before
/// it, which is always an innermost block. A close whose open marker was
/// already emitted belongs to an outer block and is left for the next pass.
/// Returns `None` when the sweep collapsed nothing.
fn collapse_innermost_blocks(text: &str, reference: NaiveDate) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut collapsed = false;

    while let Some(close) = rest.find(IF_CLOSE) {
        if let Some(open) = rest[..close].rfind(IF_OPEN) {
            let cond_start = open + IF_OPEN.len();
            if let Some(cond_len) = rest[cond_start..close].find(TAG_END) {
                let condition = &rest[cond_start..cond_start + cond_len];
                let body = &rest[cond_start + cond_len + TAG_END.len()..close];

                out.push_str(&rest[..open]);
                if evaluate_condition(condition, reference) {
                    out.push_str(body);
                }
                rest = &rest[close + IF_CLOSE.len()..];
                collapsed = true;
                continue;
            }
        }
        if out.contains(IF_OPEN) {
            // Outer block spanning already-emitted text; next pass sees it.
            break;
        }
        // True orphan close marker stays verbatim.
        out.push_str(&rest[..close + IF_CLOSE.len()]);
        rest = &rest[close + IF_CLOSE.len()..];
    }

    if !collapsed {
        return None;
    }
    out.push_str(rest);
    Some(out)
}

/// `key=value` clauses joined by `&` (logical AND). An unrecognized key or a
/// clause without `=` makes the whole condition false, so malformed
/// directives hide content instead of leaking syntax into the output.
fn evaluate_condition(condition: &str, reference: NaiveDate) -> bool {
    condition.split('&').all(|clause| {
        let Some((key, value)) = clause.split_once('=') else {
            return false;
        };
        let value = value.trim();
        match key.trim().to_lowercase().as_str() {
            "day" => matches_weekday(value, reference),
            "month" => matches_month(value, reference),
            "dom" => value.parse::<u32>() == Ok(reference.day()),
            "year" => value.parse::<i32>() == Ok(reference.year()),
            "date" => value == format_day(reference),
            _ => false,
        }
    })
}

fn matches_weekday(value: &str, reference: NaiveDate) -> bool {
    if let Ok(n) = value.parse::<u32>() {
        // Numeric weekdays count from Sunday = 0.
        return n == reference.weekday().num_days_from_sunday();
    }
    <Weekday as WeekdayFormat>::from_str(value) == Some(reference.weekday())
}

fn matches_month(value: &str, reference: NaiveDate) -> bool {
    if let Ok(n) = value.parse::<u32>() {
        return n == reference.month();
    }
    month_number(value) == Some(reference.month())
}

fn month_number(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sep" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}
