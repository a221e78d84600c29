//! Display helpers for terminal and API consumers.

pub fn format_apy(apy: f64) -> String {
    if !apy.is_finite() {
        return "0.0%".to_string();
    }
    format!("{:.1}%", apy)
}

/// `$1,234.56` style, two decimals, thousands separators.
pub fn format_currency(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

pub fn format_tvl(tvl: u64) -> String {
    let n = tvl as f64;
    if tvl >= 1_000_000_000 {
        format!("${:.1}B", n / 1e9)
    } else if tvl >= 1_000_000 {
        format!("${:.1}M", n / 1e6)
    } else if tvl >= 1_000 {
        format!("${:.1}K", n / 1e3)
    } else {
        format!("${}", tvl)
    }
}

pub fn shorten_address(address: &str, head: usize, tail: usize) -> String {
    if !address.is_ascii() || address.len() <= head + tail {
        return address.to_string();
    }
    format!("{}...{}", &address[..head], &address[address.len() - tail..])
}
