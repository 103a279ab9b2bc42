use crate::de::date::DateFormat;
use crate::name::DEFAULT_SEPARATOR;

/// Order of day, month and year in the locale's short date form.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DateOrder {
    MonthDayYear,
    DayMonthYear,
    YearMonthDay,
}

/// Culture used for numeric and default date parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub decimal_separator: char,
    pub group_separator: Option<char>,
    pub date_order: DateOrder,
}

impl Locale {
    /// `.` decimals, `,` groups, month/day/year dates.
    #[must_use]
    pub fn invariant() -> Self {
        Locale {
            decimal_separator: '.',
            group_separator: Some(','),
            date_order: DateOrder::MonthDayYear,
        }
    }

    /// Clears the group separator when it is the same character.
    #[must_use]
    pub fn decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        if self.group_separator == Some(separator) {
            self.group_separator = None;
        }
        self
    }

    /// A group separator equal to the decimal separator is ignored.
    #[must_use]
    pub fn group_separator(mut self, separator: Option<char>) -> Self {
        self.group_separator = separator.filter(|&c| c != self.decimal_separator);
        self
    }

    #[must_use]
    pub fn date_order(mut self, order: DateOrder) -> Self {
        self.date_order = order;
        self
    }

    /// Rewrites a localized floating or decimal number into the form
    /// Rust's parsers accept. Integers are parsed as written.
    pub(crate) fn normalize_number(&self, text: &str) -> String {
        let group = self
            .group_separator
            .filter(|&c| c != self.decimal_separator);
        text.chars()
            .filter(|&c| Some(c) != group)
            .map(|c| if c == self.decimal_separator { '.' } else { c })
            .collect()
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::invariant()
    }
}

/// Per-call configuration threaded through every recursive step.
///
/// A context is immutable once handed to the engine; concurrent calls
/// with different configurations each carry their own.
#[derive(Debug, Clone)]
pub struct Context {
    pub(crate) date_format: Option<DateFormat>,
    pub(crate) locale: Locale,
    pub(crate) separator: char,
    pub(crate) root_element: Option<String>,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Context::default()
    }

    /// Parses every date-time strictly with `pattern` (`dd yyyy MMM, hh:mm ss tt zzz`).
    #[must_use]
    pub fn with_date_format(mut self, pattern: &str) -> Self {
        self.date_format = Some(DateFormat::compile(pattern));
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    #[must_use]
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Starts mapping at the first element named `name` instead of the document root.
    #[must_use]
    pub fn with_root_element(mut self, name: impl Into<String>) -> Self {
        self.root_element = Some(name.into());
        self
    }

    #[must_use]
    pub fn date_format(&self) -> Option<&str> {
        self.date_format.as_ref().map(DateFormat::pattern)
    }

    #[must_use]
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    #[must_use]
    pub fn separator(&self) -> char {
        self.separator
    }

    #[must_use]
    pub fn root_element(&self) -> Option<&str> {
        self.root_element.as_deref()
    }
}

impl Default for Context {
    fn default() -> Self {
        Context {
            date_format: None,
            locale: Locale::invariant(),
            separator: DEFAULT_SEPARATOR,
            root_element: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_localized_numbers() {
        let locale = Locale::invariant()
            .decimal_separator(',')
            .group_separator(Some('.'));
        assert_eq!(locale.normalize_number("1.234.567,89"), "1234567.89");
        assert_eq!(Locale::invariant().normalize_number("1,234.5"), "1234.5");
    }

    #[test]
    fn decimal_comma_does_not_double_as_group() {
        let locale = Locale::invariant().decimal_separator(',');
        assert_eq!(locale.group_separator, None);
        assert_eq!(locale.normalize_number("99,5"), "99.5");

        let locale = Locale::invariant()
            .decimal_separator(',')
            .group_separator(Some(','));
        assert_eq!(locale.group_separator, None);

        let colliding = Locale {
            decimal_separator: ',',
            group_separator: Some(','),
            date_order: DateOrder::DayMonthYear,
        };
        assert_eq!(colliding.normalize_number("99,5"), "99.5");
    }

    #[test]
    fn builder_keeps_settings() {
        let context = Context::new()
            .with_date_format("yyyy-MM-dd")
            .with_separator('-')
            .with_root_element("venues");
        assert_eq!(context.date_format(), Some("yyyy-MM-dd"));
        assert_eq!(context.separator(), '-');
        assert_eq!(context.root_element(), Some("venues"));
        assert_eq!(context.locale(), &Locale::invariant());
    }
}
