//! Value rollups for pipeline stages.
//!
//! A stage's right-most lane (highest order) is its closing lane. Tickets
//! there count toward closed value; tickets in every other lane count toward
//! the open total. A stage with a single lane reports an open total of zero.

use serde::Serialize;

use crate::types::LaneDetail;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageValueSummary {
    pub open_value: f64,
    pub closed_value: f64,
    pub ticket_count: usize,
}

/// Parses a monetary ticket value: digits with an optional dot and at most
/// two decimal places. Anything else contributes zero to the rollup.
pub fn parse_currency(value: &str) -> Option<f64> {
    let mut chars = value.chars();
    let mut saw_digit = false;
    let mut decimals: Option<usize> = None;

    for c in chars.by_ref() {
        match c {
            '0'..='9' => {
                saw_digit = true;
                if let Some(n) = decimals.as_mut() {
                    *n += 1;
                    if *n > 2 {
                        return None;
                    }
                }
            }
            '.' if saw_digit && decimals.is_none() => decimals = Some(0),
            _ => return None,
        }
    }

    if !saw_digit || decimals == Some(0) {
        return None;
    }

    value.parse().ok()
}

pub fn stage_value_summary(lanes: &[LaneDetail]) -> StageValueSummary {
    let closing_lane_id = lanes
        .iter()
        .max_by_key(|detail| detail.lane.order)
        .map(|detail| detail.lane.id.clone());

    let mut summary = StageValueSummary {
        open_value: 0.0,
        closed_value: 0.0,
        ticket_count: 0,
    };

    for detail in lanes {
        let closing = Some(&detail.lane.id) == closing_lane_id.as_ref();
        for ticket in &detail.tickets {
            summary.ticket_count += 1;
            let value = ticket
                .ticket
                .value
                .as_deref()
                .and_then(parse_currency)
                .unwrap_or(0.0);
            if closing {
                summary.closed_value += value;
            } else {
                summary.open_value += value;
            }
        }
    }

    // A single lane is the closing lane, so no open pipeline exists.
    if lanes.len() <= 1 {
        summary.open_value = 0.0;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::types::{Lane, Ticket, TicketWithRelations};

    fn lane(id: &str, order: i64, values: &[Option<&str>]) -> LaneDetail {
        let now = Utc::now();
        let tickets = values
            .iter()
            .enumerate()
            .map(|(i, value)| TicketWithRelations {
                ticket: Ticket {
                    id: format!("{id}-t{i}"),
                    lane_id: id.to_string(),
                    name: format!("ticket {i}"),
                    description: None,
                    value: value.map(String::from),
                    order: i as i64,
                    assigned_user_id: None,
                    customer_id: None,
                    created_at: now,
                    updated_at: now,
                },
                tags: vec![],
                assigned: None,
                customer: None,
            })
            .collect();

        LaneDetail {
            lane: Lane {
                id: id.to_string(),
                stage_id: "stage-1".to_string(),
                name: id.to_string(),
                order,
                created_at: now,
                updated_at: now,
            },
            tickets,
        }
    }

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_currency("100"), Some(100.0));
        assert_eq!(parse_currency("100.5"), Some(100.5));
        assert_eq!(parse_currency("100.50"), Some(100.5));
        assert_eq!(parse_currency("0.99"), Some(0.99));
        assert_eq!(parse_currency("100.500"), None);
        assert_eq!(parse_currency("100."), None);
        assert_eq!(parse_currency(".5"), None);
        assert_eq!(parse_currency("-5"), None);
        assert_eq!(parse_currency("1,000"), None);
        assert_eq!(parse_currency(""), None);
        assert_eq!(parse_currency("abc"), None);
    }

    #[test]
    fn test_highest_order_lane_is_closing() {
        let lanes = vec![
            lane("open", 0, &[Some("100"), Some("50")]),
            lane("won", 1, &[Some("200")]),
        ];
        let summary = stage_value_summary(&lanes);
        assert_eq!(summary.open_value, 150.0);
        assert_eq!(summary.closed_value, 200.0);
        assert_eq!(summary.ticket_count, 3);
    }

    #[test]
    fn test_closing_lane_by_order_not_position() {
        // The slice is not sorted; order decides.
        let lanes = vec![
            lane("won", 2, &[Some("300")]),
            lane("open", 0, &[Some("10")]),
            lane("middle", 1, &[Some("20")]),
        ];
        let summary = stage_value_summary(&lanes);
        assert_eq!(summary.open_value, 30.0);
        assert_eq!(summary.closed_value, 300.0);
    }

    #[test]
    fn test_single_lane_reports_zero_open() {
        let lanes = vec![lane("only", 0, &[Some("100"), Some("25")])];
        let summary = stage_value_summary(&lanes);
        assert_eq!(summary.open_value, 0.0);
        assert_eq!(summary.closed_value, 125.0);
    }

    #[test]
    fn test_unparseable_values_count_zero() {
        let lanes = vec![
            lane("open", 0, &[Some("garbage"), None, Some("40")]),
            lane("won", 1, &[Some("1,000")]),
        ];
        let summary = stage_value_summary(&lanes);
        assert_eq!(summary.open_value, 40.0);
        assert_eq!(summary.closed_value, 0.0);
        assert_eq!(summary.ticket_count, 4);
    }

    #[test]
    fn test_empty_stage() {
        let summary = stage_value_summary(&[]);
        assert_eq!(summary.open_value, 0.0);
        assert_eq!(summary.closed_value, 0.0);
        assert_eq!(summary.ticket_count, 0);
    }
}
