//! Value ordering for record listings.
//!
//! Empty values (missing, `null`, blank text) always sort last, whatever the
//! direction. Text compares ignoring case and accents, with digit runs
//! compared as numbers, so `Turma 2` sorts before `Turma 10` and `Álvaro`
//! before `Bruno`.

use crate::model::Document;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static BR_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,2})/(\d{1,2})/(\d{1,4})\s*$").expect("valid br date regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompareOptions {
    /// Compare values as `dd/mm/yyyy` dates.
    pub date: bool,
}

/// Parses a `dd/mm/yyyy` date. Impossible dates such as `31/02/2024` are
/// rejected.
pub fn parse_br_date(value: &str) -> Option<NaiveDate> {
    let captures = BR_DATE_RE.captures(value)?;
    let day = captures[1].parse().ok()?;
    let month = captures[2].parse().ok()?;
    let year = captures[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn compare_values(a: &Value, b: &Value, order: SortOrder, options: CompareOptions) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    match (is_empty(a), is_empty(b)) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    if options.date {
        let left = a.as_str().and_then(parse_br_date);
        let right = b.as_str().and_then(parse_br_date);
        return match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(left), Some(right)) => directed(left.cmp(&right), order),
        };
    }

    let ordering = match (a, b) {
        (Value::Number(left), Value::Number(right)) => {
            let left = left.as_f64().unwrap_or_default();
            let right = right.as_f64().unwrap_or_default();
            left.partial_cmp(&right).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(left), Value::Bool(right)) => left.cmp(right),
        _ => natural_cmp(&as_text(a), &as_text(b)),
    };
    directed(ordering, order)
}

/// Stable sort of `documents` by `field`.
pub fn sort_documents(
    documents: &mut [Document],
    field: &str,
    order: SortOrder,
    options: CompareOptions,
) {
    documents.sort_by(|left, right| {
        compare_values(
            left.get(field).unwrap_or(&Value::Null),
            right.get(field).unwrap_or(&Value::Null),
            order,
            options,
        )
    });
}

/// Case- and accent-insensitive comparison with embedded numbers ordered
/// numerically.
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
    let left = fold(left);
    let right = fold(right);
    let mut left = Chunks::new(&left);
    let mut right = Chunks::new(&right);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => {
                let ordering = match (a, b) {
                    (Chunk::Digits(a), Chunk::Digits(b)) => cmp_digits(a, b),
                    (a, b) => a.text().cmp(b.text()),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// Lowercases and strips diacritics: `Émerson` folds to `emerson`.
fn fold(value: &str) -> String {
    value
        .trim()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect::<String>()
        .to_lowercase()
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn cmp_digits(left: &str, right: &str) -> Ordering {
    let left = left.trim_start_matches('0');
    let right = right.trim_start_matches('0');
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}

#[derive(Debug, Clone, Copy)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

impl<'a> Chunk<'a> {
    fn text(self) -> &'a str {
        match self {
            Self::Digits(text) | Self::Text(text) => text,
        }
    }
}

struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(value: &'a str) -> Self {
        Self { rest: value }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|ch: char| ch.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if digits {
            Chunk::Digits(chunk)
        } else {
            Chunk::Text(chunk)
        })
    }
}
