pub type Result<T> = std::result::Result<T, String>;

pub fn handle_error_and_exit(err: String) -> ! {
    log::error!("{}", err);
    std::process::exit(1);
}

/// Word-wraps `names` into lines no wider than `width`, each continuation
/// line indented by a single space.
pub fn wrap_names(names: &[String], width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for name in names {
        if !line.is_empty() && line.len() + name.len() + 1 > width {
            lines.push(std::mem::take(&mut line));
        }
        if line.is_empty() {
            line.push(' ');
        }
        line.push_str(name);
        line.push(' ');
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        singular.to_string()
    } else {
        plural.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_names_breaks_long_lists() {
        let names: Vec<String> = (0..30).map(|i| format!("marker{:02}", i)).collect();
        let lines = wrap_names(&names, 79);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= 80));
        assert!(lines.iter().all(|l| l.starts_with(' ')));
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split_whitespace()).collect();
        assert_eq!(rejoined.len(), 30);
    }

    #[test]
    fn wrap_names_empty() {
        assert!(wrap_names(&[], 79).is_empty());
    }

    #[test]
    fn plural_picks_form() {
        assert_eq!(plural(1, "pair", "pairs"), "pair");
        assert_eq!(plural(0, "pair", "pairs"), "pairs");
        assert_eq!(plural(3, "pair", "pairs"), "pairs");
    }
}
