/// Makes a column name safe for use inside a file name.
///
/// Alphanumerics (any script), `.`, `_` and `-` are kept; everything else
/// becomes `_`. The mapping is pure so artifact names are stable across runs.
pub fn sanitize_file_component(name: &str) -> String {
    let clean: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // "." and ".." would escape or alias the output directory
    if clean.is_empty() || clean.chars().all(|c| c == '.') {
        format!("col{}", "_".repeat(clean.len()))
    } else {
        clean
    }
}

/// Makes header names unique, naming blanks after their position.
///
/// Used for spreadsheet headers, where the file format does not enforce
/// unique or non-empty column names.
pub fn unique_header_names(names: &[String]) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(names.len());
    let mut seen = std::collections::HashSet::new();

    for (i, name) in names.iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("column_{}", i + 1)
        } else {
            name.trim().to_owned()
        };
        let mut candidate = base.clone();
        let mut count = 0;
        while seen.contains(&candidate) {
            count += 1;
            candidate = format!("{base}_{count}");
        }
        seen.insert(candidate.clone());
        result.push(candidate);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_component() {
        assert_eq!(sanitize_file_component("price"), "price");
        assert_eq!(sanitize_file_component("unit price ($)"), "unit_price____");
        assert_eq!(sanitize_file_component("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_file_component("şehir-adı.v2"), "şehir-adı.v2");
        assert_eq!(sanitize_file_component(""), "col");
        assert_eq!(sanitize_file_component(".."), "col__");
    }

    #[test]
    fn test_unique_header_names() {
        let names = vec![
            "id".to_owned(),
            String::new(),
            "id".to_owned(),
            " value ".to_owned(),
            "id".to_owned(),
        ];
        assert_eq!(
            unique_header_names(&names),
            vec!["id", "column_2", "id_1", "value", "id_2"]
        );
    }
}
