use chrono::{NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Asia::Shanghai;
use core_types::{AppError, BookLevels, Quote};

/// Parse one `var hq_str_<code>="<csv>";` line into `(code, csv_body)`.
pub fn split_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim().trim_end_matches(';');
    let eq = line.find('=')?;
    let (lhs, rhs) = line.split_at(eq);
    let code = lhs.trim().strip_prefix("var hq_str_")?;
    let csv = rhs[1..].trim().trim_matches('"');
    Some((code, csv))
}

/// Decode one CSV body into a [`Quote`]. Field layout follows the
/// classic comma-separated realtime quote format this vendor family
/// uses: name, open, pre_close, price, high, low, best bid/ask, volume,
/// amount, five levels of bid size/price, five levels of ask
/// size/price, date, time.
pub fn parse_record(symbol: &str, csv: &str) -> Result<Quote, AppError> {
    let fields: Vec<&str> = csv.split(',').collect();
    if fields.len() < 32 {
        return Err(AppError::InvalidArgument(format!(
            "vendor s record for {symbol} has {} fields, expected >= 32",
            fields.len()
        )));
    }

    let parse_f = |idx: usize| -> Result<f64, AppError> {
        fields[idx]
            .parse::<f64>()
            .map_err(|e| AppError::InvalidArgument(format!("field {idx}: {e}")))
    };
    let parse_u = |idx: usize| -> Result<u64, AppError> {
        fields[idx]
            .parse::<f64>()
            .map(|v| v as u64)
            .map_err(|e| AppError::InvalidArgument(format!("field {idx}: {e}")))
    };

    let name = fields[0].to_string();
    let open = parse_f(1)?;
    let pre_close = parse_f(2)?;
    let price = parse_f(3)?;
    let high = parse_f(4)?;
    let low = parse_f(5)?;
    let volume = parse_u(8)?;
    let amount = parse_f(9)?;

    let mut bid_v = [0u64; 5];
    let mut bid_p = [0f64; 5];
    let mut ask_v = [0u64; 5];
    let mut ask_p = [0f64; 5];
    for level in 0..5 {
        bid_v[level] = parse_u(10 + level * 2)?;
        bid_p[level] = parse_f(11 + level * 2)?;
        ask_v[level] = parse_u(20 + level * 2)?;
        ask_p[level] = parse_f(21 + level * 2)?;
    }

    let date = NaiveDate::parse_from_str(fields[30], "%Y-%m-%d")
        .map_err(|e| AppError::InvalidArgument(format!("field 30 date: {e}")))?;
    let time = NaiveTime::parse_from_str(fields[31], "%H:%M:%S")
        .map_err(|e| AppError::InvalidArgument(format!("field 31 time: {e}")))?;
    let timestamp = Shanghai
        .from_local_datetime(&date.and_time(time))
        .single()
        .ok_or_else(|| AppError::InvalidArgument("ambiguous local timestamp".to_string()))?
        .with_timezone(&chrono::Utc);

    let change = price - pre_close;
    let change_pct = if pre_close != 0.0 {
        change / pre_close * 100.0
    } else {
        0.0
    };
    let amplitude = if pre_close != 0.0 {
        (high - low) / pre_close * 100.0
    } else {
        0.0
    };

    Ok(Quote {
        symbol: symbol.to_string(),
        name,
        price,
        prev_close: pre_close,
        change,
        change_pct,
        volume,
        turnover: amount,
        open,
        high,
        low,
        bid: BookLevels {
            prices: bid_p,
            volumes: bid_v,
        },
        ask: BookLevels {
            prices: ask_p,
            volumes: ask_v,
        },
        inner_disc: 0,
        outer_disc: 0,
        pe: 0.0,
        pb: 0.0,
        amplitude,
        turnover_rate: 0.0,
        circulation: 0.0,
        market_value: 0.0,
        limit_up: 0.0,
        limit_down: 0.0,
        timestamp,
    })
}
