use alloy_primitives::{utils, Address, U256};
use chrono::{DateTime, Utc};

use crate::models::MarketState;

/// Prices on chain carry 8 decimals; display keeps 2
const PRICE_ROUNDING_UNIT: u64 = 1_000_000;
const HALF_PRICE_ROUNDING_UNIT: u64 = PRICE_ROUNDING_UNIT / 2;

const MINUTES_PER_HOUR: u64 = 60;
const MINUTES_PER_DAY: u64 = 1_440;
const MINUTES_PER_MONTH: u64 = 43_200;

/// Render an 8-decimal fixed-point price with exactly two decimals.
///
/// Uses integer arithmetic with half-up rounding, so large values keep every
/// digit.
pub fn format_price(value: U256) -> String {
    let cents = value.saturating_add(U256::from(HALF_PRICE_ROUNDING_UNIT))
        / U256::from(PRICE_ROUNDING_UNIT);
    let whole = cents / U256::from(100u64);
    let fraction = (cents % U256::from(100u64)).saturating_to::<u64>();

    format!("{}.{:02}", whole, fraction)
}

/// Render a wei amount in ether without trailing zeros ("0.5", "12", "0")
pub fn format_ether(wei: U256) -> String {
    let formatted = utils::format_ether(wei);

    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted
    }
}

/// "Ended" once the window has passed or the market left Open, otherwise a
/// relative distance such as "in about 2 hours"
pub fn time_remaining(end_time: u64, state: MarketState, now: DateTime<Utc>) -> String {
    if !state.is_open() {
        return "Ended".to_string();
    }

    let end = i64::try_from(end_time).unwrap_or(i64::MAX);
    let remaining = end.saturating_sub(now.timestamp());

    if remaining <= 0 {
        return "Ended".to_string();
    }

    format!("in {}", humanize_distance(remaining as u64))
}

/// Approximate, human-friendly length of a duration in seconds
pub fn humanize_distance(seconds: u64) -> String {
    let minutes = div_round(seconds, 60);

    if minutes == 0 {
        return "less than a minute".to_string();
    }
    if minutes < 45 {
        return plural(minutes, "minute");
    }
    if minutes < 90 {
        return "about 1 hour".to_string();
    }
    if minutes < MINUTES_PER_DAY {
        return format!("about {}", plural(div_round(minutes, MINUTES_PER_HOUR), "hour"));
    }
    if minutes < 2_520 {
        return "1 day".to_string();
    }
    if minutes < MINUTES_PER_MONTH {
        return plural(div_round(minutes, MINUTES_PER_DAY), "day");
    }
    if minutes < 2 * MINUTES_PER_MONTH {
        return format!("about {}", plural(div_round(minutes, MINUTES_PER_MONTH), "month"));
    }

    let months = minutes / MINUTES_PER_MONTH;
    if months < 12 {
        return plural(div_round(minutes, MINUTES_PER_MONTH), "month");
    }

    let years = months / 12;
    match months % 12 {
        0..=2 => format!("about {}", plural(years, "year")),
        3..=8 => format!("over {}", plural(years, "year")),
        _ => format!("almost {}", plural(years + 1, "year")),
    }
}

/// "0x1234...abcd"
pub fn short_address(address: Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

fn div_round(value: u64, divisor: u64) -> u64 {
    (value + divisor / 2) / divisor
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}
