//! Member/node name matching.
//!
//! Names are folded to a canonical form before comparison: the separator
//! character is dropped and every remaining character is upper-cased. A
//! member `StartDate` therefore matches `StartDate`, `startdate`,
//! `Start_Date` and `START_DATE`.

/// Separator ignored when none is configured.
pub const DEFAULT_SEPARATOR: char = '_';

/// Canonical form of `name`.
#[must_use]
pub fn canonical(name: &str, separator: char) -> String {
    folded(name, separator).collect()
}

/// Whether `member` and `node` have the same canonical form.
#[inline]
#[must_use]
pub fn matches(member: &str, node: &str, separator: char) -> bool {
    folded(member, separator).eq(folded(node, separator))
}

fn folded(name: &str, separator: char) -> impl Iterator<Item = char> + '_ {
    name.chars()
        .filter(move |&c| c != separator)
        .flat_map(char::to_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case_and_separator() {
        for node in &["StartDate", "startdate", "Start_Date", "START_DATE", "_start_date_"] {
            assert!(matches("StartDate", node, DEFAULT_SEPARATOR), "{}", node);
        }
        assert_eq!(canonical("Is_Cool", DEFAULT_SEPARATOR), "ISCOOL");
    }

    #[test]
    fn no_partial_matches() {
        assert!(!matches("StartDate", "Start", DEFAULT_SEPARATOR));
        assert!(!matches("StartDate", "StartDates", DEFAULT_SEPARATOR));
        assert!(!matches("Start-Date", "StartDate", DEFAULT_SEPARATOR));
    }

    #[test]
    fn custom_separator() {
        assert!(matches("StartDate", "start-date", '-'));
        assert!(!matches("StartDate", "start_date", '-'));
    }
}
