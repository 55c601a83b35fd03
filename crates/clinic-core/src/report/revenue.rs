//! Daily revenue series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::percentage_of;
use crate::models::{Invoice, Vnd};

/// One day of the revenue table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    /// Invoices dated that day
    pub patient_count: u32,
    pub revenue: Vnd,
    /// Share of the period's revenue, whole percent
    pub percentage: i64,
}

/// Bucket invoices into one row per day of `[start, end]`.
///
/// Days without invoices are present with zeros. Invoices outside the range
/// are ignored. Empty when `start > end`.
pub fn build_revenue_report(invoices: &[Invoice], start: NaiveDate, end: NaiveDate) -> Vec<DailyRevenue> {
    let mut days: Vec<DailyRevenue> = start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| DailyRevenue {
            date,
            patient_count: 0,
            revenue: 0,
            percentage: 0,
        })
        .collect();

    for invoice in invoices {
        if invoice.exam_date < start || invoice.exam_date > end {
            continue;
        }
        let offset = (invoice.exam_date - start).num_days() as usize;
        if let Some(day) = days.get_mut(offset) {
            day.patient_count += 1;
            day.revenue += invoice.total_amount;
        }
    }

    let total: Vnd = days.iter().map(|d| d.revenue).sum();
    for day in &mut days {
        day.percentage = percentage_of(day.revenue, total);
    }

    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn invoice(day: u32, total: Vnd) -> Invoice {
        Invoice {
            id: format!("inv-{}-{}", day, total),
            patient_id: "p-1".into(),
            patient_name: "An".into(),
            exam_date: date(day),
            consultation_fee: total,
            medicine_fee: 0,
            other_fees: 0,
            total_amount: total,
            is_paid: false,
            payment_date: None,
            payment_method: None,
        }
    }

    #[test]
    fn test_empty_range_is_zero_filled() {
        let days = build_revenue_report(&[], date(1), date(31));
        assert_eq!(days.len(), 31);
        assert!(days.iter().all(|d| d.revenue == 0 && d.patient_count == 0 && d.percentage == 0));
        assert_eq!(days[0].date, date(1));
        assert_eq!(days[30].date, date(31));
    }

    #[test]
    fn test_reversed_range_is_empty() {
        assert!(build_revenue_report(&[invoice(3, 1)], date(5), date(1)).is_empty());
    }

    #[test]
    fn test_buckets_and_percentages() {
        let invoices = vec![
            invoice(1, 250_000),
            invoice(1, 250_000),
            invoice(2, 300_000),
            invoice(3, 200_000),
        ];
        let days = build_revenue_report(&invoices, date(1), date(3));

        assert_eq!(days[0].patient_count, 2);
        assert_eq!(days[0].revenue, 500_000);
        assert_eq!(days[0].percentage, 50);
        assert_eq!(days[1].percentage, 30);
        assert_eq!(days[2].percentage, 20);
    }

    #[test]
    fn test_five_day_range_with_two_busy_days() {
        let invoices = vec![invoice(1, 600_000), invoice(1, 400_000), invoice(3, 500_000)];
        let days = build_revenue_report(&invoices, date(1), date(5));

        assert_eq!(days.len(), 5);
        assert_eq!(days[0].patient_count, 2);
        assert_eq!(days[0].revenue, 1_000_000);
        assert_eq!(days[2].patient_count, 1);
        assert_eq!(days[2].revenue, 500_000);
        assert_eq!(days[0].percentage, 67);
        assert_eq!(days[2].percentage, 33);
        assert_eq!(days[0].percentage + days[2].percentage, 100);

        for idle in [1, 3, 4] {
            assert_eq!(days[idle].patient_count, 0);
            assert_eq!(days[idle].revenue, 0);
            assert_eq!(days[idle].percentage, 0);
        }
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let invoices = vec![invoice(1, 100), invoice(10, 100), invoice(11, 100)];
        let days = build_revenue_report(&invoices, date(1), date(10));

        let counted: u32 = days.iter().map(|d| d.patient_count).sum();
        assert_eq!(counted, 2);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 1/8 = 12.5%, 7/8 = 87.5%
        let days = build_revenue_report(&[invoice(1, 1), invoice(2, 7)], date(1), date(2));
        assert_eq!(days[0].percentage, 13);
        assert_eq!(days[1].percentage, 88);
    }
}
