use regex::Regex;

/// File names become the suffix of storage identifiers, so anything that
/// could escape the storage root is rejected before a storage call is made.
pub fn is_valid_file_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 255 || name == "." || name == ".." {
        return false;
    }
    if name.contains(['/', '\\']) {
        return false;
    }
    !name.chars().any(|c| c.is_control())
}

/// File ids are `<16-byte-random-hex>-<original name>`.
pub fn is_valid_file_id(file_id: &str) -> bool {
    let re = Regex::new(r"^[0-9a-f]{32}-.+$").unwrap();
    if !re.is_match(file_id) {
        return false;
    }
    match file_id.split_once('-') {
        Some((_, name)) => is_valid_file_name(name),
        None => false,
    }
}
