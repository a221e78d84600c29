/// Sui addresses are `0x` followed by 64 hex characters.
pub fn is_valid_sui_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(hex) => hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

pub fn normalize(address: &str) -> String {
    address.to_lowercase()
}
