//! Indonesian formatting helpers used by the printed documents.

use chrono::{Datelike, NaiveDate};

pub const MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Indonesian month name for a 1-based month, or `"-"` when out of range.
pub fn month_name(month: u32) -> &'static str {
    match month {
        1..=12 => MONTHS[(month - 1) as usize],
        _ => "-",
    }
}

/// Format an amount the way `id-ID` currency formatting does: `Rp 1.500.000`.
pub fn format_rupiah(amount: i64) -> String {
    let digits = group_thousands(amount.unsigned_abs());
    if amount < 0 {
        format!("-Rp {}", digits)
    } else {
        format!("Rp {}", digits)
    }
}

/// `1500000` -> `1.500.000`
pub fn group_thousands(value: u64) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Parse a currency-formatted string back to an integer by keeping only the
/// digits. `"Rp 1.500.000"` -> `1500000`, `""` -> `0`.
pub fn parse_rupiah(text: &str) -> i64 {
    text.chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(d as i64))
}

/// Sum amounts, clamping at the `i64` bounds instead of wrapping.
pub fn sum_amounts(amounts: impl IntoIterator<Item = i64>) -> i64 {
    amounts.into_iter().fold(0, i64::saturating_add)
}

/// Roman numeral for `value` (1..=3999). Zero yields an empty string.
pub fn to_roman(mut value: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (amount, symbol) in TABLE {
        while value >= amount {
            out.push_str(symbol);
            value -= amount;
        }
    }
    out
}

/// Long Indonesian date with a two-digit day: `05 Maret 2024`.
pub fn format_date_long(date: NaiveDate) -> String {
    format!(
        "{:02} {} {}",
        date.day(),
        month_name(date.month()),
        date.year()
    )
}

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp (first ten characters).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let head = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// [`format_date_long`] for a stored date string, `"-"` when unparseable.
pub fn format_date_text(text: &str) -> String {
    parse_date(text)
        .map(format_date_long)
        .unwrap_or_else(|| "-".to_string())
}

const UNITS: [&str; 10] = [
    "", "satu", "dua", "tiga", "empat", "lima", "enam", "tujuh", "delapan", "sembilan",
];
const TEENS: [&str; 10] = [
    "sepuluh",
    "sebelas",
    "dua belas",
    "tiga belas",
    "empat belas",
    "lima belas",
    "enam belas",
    "tujuh belas",
    "delapan belas",
    "sembilan belas",
];
const SCALES: [&str; 5] = ["", "ribu", "juta", "miliar", "triliun"];

fn hundreds_in_words(num: u64) -> String {
    match num {
        0 => String::new(),
        1..=9 => UNITS[num as usize].to_string(),
        10..=19 => TEENS[(num - 10) as usize].to_string(),
        20..=99 => {
            let mut out = format!("{} puluh", UNITS[(num / 10) as usize]);
            if num % 10 != 0 {
                out.push(' ');
                out.push_str(UNITS[(num % 10) as usize]);
            }
            out
        }
        _ => {
            let mut out = if num < 200 {
                "seratus".to_string()
            } else {
                format!("{} ratus", UNITS[(num / 100) as usize])
            };
            if num % 100 != 0 {
                out.push(' ');
                out.push_str(&hundreds_in_words(num % 100));
            }
            out
        }
    }
}

/// Spell out an amount in Indonesian ("terbilang"), capitalised:
/// `1500` -> `Seribu lima ratus`.
///
/// Amounts of a thousand trillion or more are spelled with "triliun" as the
/// largest scale word.
pub fn terbilang(amount: u64) -> String {
    if amount == 0 {
        return "Nol".to_string();
    }

    let mut chunks = Vec::new();
    let mut num = amount;
    let mut scale = 0;
    while num > 0 {
        let chunk = if scale == SCALES.len() - 1 { num } else { num % 1000 };
        if chunk != 0 {
            let words = if scale == 1 && chunk == 1 {
                "seribu".to_string()
            } else if scale > 0 {
                let head = if chunk >= 1000 {
                    terbilang(chunk).to_lowercase()
                } else {
                    hundreds_in_words(chunk)
                };
                format!("{} {}", head, SCALES[scale])
            } else {
                hundreds_in_words(chunk)
            };
            chunks.push(words);
        }
        if scale == SCALES.len() - 1 {
            break;
        }
        num /= 1000;
        scale += 1;
    }
    chunks.reverse();

    let text = chunks.join(" ");
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rupiah_grouping() {
        assert_eq!(format_rupiah(0), "Rp 0");
        assert_eq!(format_rupiah(950), "Rp 950");
        assert_eq!(format_rupiah(1_500_000), "Rp 1.500.000");
        assert_eq!(format_rupiah(-25_000), "-Rp 25.000");
    }

    #[test]
    fn rupiah_parsing_keeps_digits_only() {
        assert_eq!(parse_rupiah("Rp 1.500.000"), 1_500_000);
        assert_eq!(parse_rupiah("12,5 jt"), 125);
        assert_eq!(parse_rupiah(""), 0);
        assert_eq!(parse_rupiah("-"), 0);
    }

    #[test]
    fn oversized_amounts_clamp() {
        let huge = parse_rupiah("99999999999999999999");
        assert_eq!(huge, i64::MAX);
        assert_eq!(sum_amounts([huge, huge]), i64::MAX);
        assert_eq!(sum_amounts([i64::MIN, -1]), i64::MIN);
        assert_eq!(sum_amounts([1_000, 2_500]), 3_500);
    }

    #[test]
    fn roman_months() {
        let expected = [
            "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII",
        ];
        for (i, roman) in expected.iter().enumerate() {
            assert_eq!(to_roman(i as u32 + 1), *roman);
        }
        assert_eq!(to_roman(2024), "MMXXIV");
    }

    #[test]
    fn long_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_date_long(date), "05 Maret 2024");
        assert_eq!(format_date_text("2024-12-18T08:30:00.000Z"), "18 Desember 2024");
        assert_eq!(format_date_text("bukan tanggal"), "-");
    }

    #[test]
    fn number_words() {
        assert_eq!(terbilang(0), "Nol");
        assert_eq!(terbilang(11), "Sebelas");
        assert_eq!(terbilang(115), "Seratus lima belas");
        assert_eq!(terbilang(1_000), "Seribu");
        assert_eq!(terbilang(1_500), "Seribu lima ratus");
        assert_eq!(terbilang(21_000), "Dua puluh satu ribu");
        assert_eq!(
            terbilang(2_750_000),
            "Dua juta tujuh ratus lima puluh ribu"
        );
        assert_eq!(terbilang(1_000_000_000), "Satu miliar");
    }
}
