//! Listing header shown above a chat

use serde::{Deserialize, Deserializer, Serialize};

/// The part of a rental listing a chat needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Monthly rent as the server sent it
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: Option<f64>,
    #[serde(default, rename = "imageUrl")]
    pub image_url: Option<String>,
}

impl ListingSummary {
    /// Rent formatted like `₹12,500/month`
    pub fn price_label(&self) -> Option<String> {
        self.price.map(|p| format!("₹{}/month", group_thousands(p)))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawPrice>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawPrice::Number(n)) => Some(n),
        Some(RawPrice::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// `12500.0` -> `12,500`, `999.5` -> `999.5`
fn group_thousands(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let frac = cents % 100;
    if frac > 0 {
        let frac = format!("{:02}", frac);
        grouped.push('.');
        grouped.push_str(frac.trim_end_matches('0'));
    }

    if value < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
