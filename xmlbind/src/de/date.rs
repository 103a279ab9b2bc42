use crate::context::{DateOrder, Locale};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// A custom date pattern compiled into a chrono format string.
///
/// Patterns use the `dd`/`MMM`/`yyyy`/`hh`/`tt`/`zzz` vocabulary; text in
/// quotes and characters after `\` are literals.
///
/// Fractions written after a `.` take any number of digits (or none);
/// fractions without one take exactly 3, 6 or 9. `K` accepts `Z`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DateFormat {
    pattern: String,
    chrono: String,
    has_time: bool,
    has_offset: bool,
    /// `t`: a one-letter `A`/`P` designator.
    short_designator: bool,
}

impl DateFormat {
    pub(crate) fn compile(pattern: &str) -> Self {
        let mut chrono = String::with_capacity(pattern.len() * 2);
        let mut has_time = false;
        let mut has_offset = false;
        let mut short_designator = false;
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            let mut run = 1;
            if c.is_ascii_alphabetic() {
                while chars.peek() == Some(&c) {
                    chars.next();
                    run += 1;
                }
            }
            let specifier = match c {
                'd' => match run {
                    1 | 2 => "%d",
                    3 => "%a",
                    _ => "%A",
                },
                'M' => match run {
                    1 | 2 => "%m",
                    3 => "%b",
                    _ => "%B",
                },
                'y' => {
                    if run <= 2 {
                        "%y"
                    } else {
                        "%Y"
                    }
                }
                'h' | 'H' | 'm' | 's' | 't' => {
                    has_time = true;
                    short_designator |= c == 't' && run == 1;
                    match c {
                        'h' => "%I",
                        'H' => "%H",
                        'm' => "%M",
                        's' => "%S",
                        _ => "%p",
                    }
                }
                'f' | 'F' => {
                    has_time = true;
                    if chrono.ends_with('.') && !chrono.ends_with("%.") {
                        chrono.pop();
                        "%.f"
                    } else if run <= 3 {
                        "%3f"
                    } else if run <= 6 {
                        "%6f"
                    } else {
                        "%9f"
                    }
                }
                'z' | 'K' => {
                    has_offset = true;
                    if c == 'z' && run >= 3 {
                        "%:z"
                    } else {
                        "%#z"
                    }
                }
                '\'' | '"' => {
                    for literal in chars.by_ref().take_while(|&q| q != c) {
                        push_literal(&mut chrono, literal);
                    }
                    continue;
                }
                '\\' => {
                    if let Some(literal) = chars.next() {
                        push_literal(&mut chrono, literal);
                    }
                    continue;
                }
                '%' => continue,
                _ => {
                    for _ in 0..run {
                        push_literal(&mut chrono, c);
                    }
                    continue;
                }
            };
            chrono.push_str(specifier);
        }

        DateFormat {
            pattern: pattern.to_owned(),
            chrono,
            has_time,
            has_offset,
            short_designator,
        }
    }

    pub(crate) fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Strict parse; an offset in the text is kept as written, not converted.
    pub(crate) fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        let parsed = self.parse_exact(text);
        if parsed.is_some() || !self.short_designator {
            return parsed;
        }
        // widen a lone `A`/`P` to `AM`/`PM` and retry
        text.char_indices()
            .filter(|&(i, c)| {
                matches!(c, 'A' | 'P' | 'a' | 'p')
                    && !text[i + 1..].starts_with(|next: char| next == 'M' || next == 'm')
            })
            .find_map(|(i, c)| {
                self.parse_exact(&format!("{}{}M{}", &text[..i], c, &text[i + 1..]))
            })
    }

    fn parse_exact(&self, text: &str) -> Option<NaiveDateTime> {
        if self.has_offset {
            DateTime::parse_from_str(text, &self.chrono)
                .ok()
                .map(|date| date.naive_local())
        } else if self.has_time {
            NaiveDateTime::parse_from_str(text, &self.chrono).ok()
        } else {
            NaiveDate::parse_from_str(text, &self.chrono)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        }
    }
}

fn push_literal(chrono: &mut String, c: char) {
    if c == '%' {
        chrono.push_str("%%");
    } else {
        chrono.push(c);
    }
}

const ISO_DATE_TIMES: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIMES: &[&str] = &[" %I:%M:%S %p", " %I:%M %p", " %H:%M:%S", " %H:%M"];

/// Date-time parsing without a custom pattern: ISO 8601/RFC 3339, RFC 2822,
/// then the locale's short date with an optional time.
pub(crate) fn parse_default(text: &str, locale: &Locale) -> Option<NaiveDateTime> {
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.naive_local());
    }
    if let Some(date) = ISO_DATE_TIMES
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(text) {
        return Some(date.naive_local());
    }

    for date_format in short_dates(locale.date_order) {
        if let Ok(date) = NaiveDate::parse_from_str(text, date_format) {
            return date.and_hms_opt(0, 0, 0);
        }
        let found = TIMES.iter().find_map(|time_format| {
            NaiveDateTime::parse_from_str(text, &format!("{}{}", date_format, time_format)).ok()
        });
        if found.is_some() {
            return found;
        }
    }
    None
}

fn short_dates(order: DateOrder) -> &'static [&'static str] {
    match order {
        DateOrder::MonthDayYear => &["%m/%d/%Y", "%m-%d-%Y"],
        DateOrder::DayMonthYear => &["%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y"],
        DateOrder::YearMonthDay => &["%Y/%m/%d", "%Y.%m.%d"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn compiles_custom_patterns() {
        let format = DateFormat::compile("dd yyyy MMM, hh:mm ss tt zzz");
        assert_eq!(format.chrono, "%d %Y %b, %I:%M %S %p %:z");
        assert!(format.has_time);
        assert!(format.has_offset);

        let format = DateFormat::compile(r"yyyy-MM-dd'T'HH\h 100%");
        assert_eq!(format.chrono, "%Y-%m-%dT%Hh 100");
        assert!(!format.has_offset);

        assert_eq!(DateFormat::compile("dddd d MMMM yy").chrono, "%A %d %B %y");
        assert_eq!(DateFormat::compile("HH:mm:ss.FFF").chrono, "%H:%M:%S%.f");
        assert_eq!(DateFormat::compile("HHmmssfff").chrono, "%H%M%S%3f");
        assert_eq!(DateFormat::compile("yyyy-MM-ddTHH:mmK").chrono, "%Y-%m-%dT%H:%M%#z");
    }

    #[test]
    fn fractions_designators_and_zulu() {
        let format = DateFormat::compile("yyyy-MM-dd HH:mm:ss.FFF");
        assert_eq!(format.parse("2010-02-21 09:35:00"), Some(at(2010, 2, 21, 9, 35, 0)));
        assert_eq!(
            format.parse("2010-02-21 09:35:00.5"),
            NaiveDate::from_ymd_opt(2010, 2, 21).and_then(|d| d.and_hms_milli_opt(9, 35, 0, 500))
        );

        let format = DateFormat::compile("d/M/yyyy h:mm t");
        assert_eq!(format.parse("21/2/2010 9:35 P"), Some(at(2010, 2, 21, 21, 35, 0)));
        assert_eq!(format.parse("21/2/2010 9:35 AM"), Some(at(2010, 2, 21, 9, 35, 0)));
        assert_eq!(format.parse("21/2/2010 9:35 X"), None);

        let format = DateFormat::compile("yyyy-MM-ddTHH:mm:ssK");
        assert_eq!(format.parse("2010-02-21T09:35:00Z"), Some(at(2010, 2, 21, 9, 35, 0)));
        assert_eq!(format.parse("2010-02-21T09:35:00+05:30"), Some(at(2010, 2, 21, 9, 35, 0)));
    }

    #[test]
    fn custom_pattern_keeps_wall_clock() {
        let format = DateFormat::compile("dd yyyy MMM, hh:mm ss tt zzz");
        assert_eq!(
            format.parse("08 2010 Feb, 11:11 11 AM -08:00"),
            Some(at(2010, 2, 8, 11, 11, 11))
        );
        assert_eq!(
            format.parse("08 2010 Feb, 11:11 11 PM +05:30"),
            Some(at(2010, 2, 8, 23, 11, 11))
        );
        assert_eq!(format.parse("2010-02-08T11:11:11"), None);
    }

    #[test]
    fn date_only_pattern() {
        let format = DateFormat::compile("dd.MM.yyyy");
        assert_eq!(format.parse("21.02.2010"), Some(at(2010, 2, 21, 0, 0, 0)));
    }

    #[test]
    fn default_parsing() {
        let locale = Locale::invariant();
        let expected = at(2009, 9, 25, 0, 6, 1);
        assert_eq!(parse_default("2009-09-25T00:06:01", &locale), Some(expected));
        assert_eq!(parse_default("2009-09-25T00:06:01-07:00", &locale), Some(expected));
        assert_eq!(parse_default("2009-09-25 00:06:01", &locale), Some(expected));
        assert_eq!(
            parse_default("2/21/2010 9:35:00 AM", &locale),
            Some(at(2010, 2, 21, 9, 35, 0))
        );
        assert_eq!(parse_default("2010-02-21", &locale), Some(at(2010, 2, 21, 0, 0, 0)));
        assert_eq!(
            parse_default("Sun, 21 Feb 2010 09:35:00 +0000", &locale),
            Some(at(2010, 2, 21, 9, 35, 0))
        );
        assert_eq!(parse_default("yesterday", &locale), None);
    }

    #[test]
    fn default_parsing_follows_locale_order() {
        let locale = Locale::invariant().date_order(DateOrder::DayMonthYear);
        assert_eq!(
            parse_default("21/02/2010 09:35", &locale),
            Some(at(2010, 2, 21, 9, 35, 0))
        );
        assert_eq!(parse_default("2/21/2010", &locale), None);
    }
}
