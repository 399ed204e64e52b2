/// Lower-cases the input, then upper-cases the first character of every
/// whitespace-separated word. Separators are kept as-is.
pub fn title_case(s: Option<&str>) -> String {
    let Some(s) = s.filter(|s| !s.is_empty()) else {
        return String::new();
    };
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.to_lowercase().chars() {
        if c.is_whitespace() {
            out.push(c);
            word_start = true;
        } else if word_start {
            out.extend(c.to_uppercase());
            word_start = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Digits only, with a hyphen after the fifth digit when a ZIP+4 suffix is present.
pub fn format_zip(s: Option<&str>) -> String {
    let digits: String = s
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.len() > 5 {
        format!("{}-{}", &digits[..5], &digits[5..])
    } else {
        digits
    }
}

pub fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_words() {
        assert_eq!(title_case(Some("JOHN")), "John");
        assert_eq!(title_case(Some("mary ann")), "Mary Ann");
        assert_eq!(title_case(Some("sAN  fRANCISCO")), "San  Francisco");
        assert_eq!(title_case(Some("o'brien")), "O'brien");
    }

    #[test]
    fn title_case_any_whitespace() {
        assert_eq!(title_case(Some("SAINT\tPAUL")), "Saint\tPaul");
        assert_eq!(title_case(Some("new\nYORK")), "New\nYork");
        assert_eq!(title_case(Some(" leading")), " Leading");
    }

    #[test]
    fn title_case_empty() {
        assert_eq!(title_case(None), "");
        assert_eq!(title_case(Some("")), "");
    }

    #[test]
    fn zip_formats() {
        assert_eq!(format_zip(Some("123456789")), "12345-6789");
        assert_eq!(format_zip(Some("12345")), "12345");
        assert_eq!(format_zip(Some("")), "");
        assert_eq!(format_zip(None), "");
        assert_eq!(format_zip(Some("02139-4307")), "02139-4307");
        assert_eq!(format_zip(Some("1234")), "1234");
    }

    #[test]
    fn non_empty_drops_blank() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("x".into())), Some("x".into()));
        assert_eq!(non_empty(None), None);
    }
}
