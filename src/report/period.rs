use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Reporting period selected by the caller. Unknown tokens fall back to a week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    Year,
}

impl Period {
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "month" => Self::Month,
            "year" => Self::Year,
            _ => Self::Week,
        }
    }
}

/// Inclusive time window of a period with one label per bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportWindow {
    pub period: Period,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub labels: Vec<String>,
}

impl ReportWindow {
    pub fn resolve(period: Period, now: NaiveDateTime) -> Self {
        let today = now.date();

        let (first_day, days, labels) = match period {
            Period::Week => {
                let monday =
                    today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
                let labels = (0..7)
                    .map(|offset| day_label(monday + Duration::days(offset)))
                    .collect::<Vec<_>>();
                (monday, 7, labels)
            }
            Period::Month => {
                let first = today - Duration::days(i64::from(today.day0()));
                let labels = first
                    .iter_days()
                    .take_while(|day| day.month() == first.month())
                    .map(day_label)
                    .collect::<Vec<_>>();
                let days = labels.len() as i64;
                (first, days, labels)
            }
            Period::Year => {
                let first = today - Duration::days(i64::from(today.ordinal0()));
                let days = first
                    .iter_days()
                    .take_while(|day| day.year() == first.year())
                    .count() as i64;
                let labels = (1..=12)
                    .map(|month| format!("{:04}-{month:02}", first.year()))
                    .collect::<Vec<_>>();
                (first, days, labels)
            }
        };

        let start = first_day.and_time(NaiveTime::MIN);
        let end = start + Duration::days(days) - Duration::milliseconds(1);

        Self {
            period,
            start,
            end,
            labels,
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at <= self.end
    }

    /// Day offset from the window start for week and month, month offset for year.
    /// Returns `None` for instants outside the window.
    pub fn bucket_index(&self, at: NaiveDateTime) -> Option<usize> {
        if !self.contains(at) {
            return None;
        }

        let index = match self.period {
            Period::Week | Period::Month => (at - self.start).num_days(),
            Period::Year => {
                i64::from(at.year() - self.start.year()) * 12 + i64::from(at.month0())
                    - i64::from(self.start.month0())
            }
        };

        usize::try_from(index)
            .ok()
            .filter(|index| *index < self.labels.len())
    }

    pub fn day_count(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }
}

/// Parses stored timestamps and dates into local wall-clock time.
///
/// RFC 3339 values are converted to the local zone; the naive shapes
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD` are taken as local.
pub fn parse_record_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Local).naive_local());
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

fn day_label(day: NaiveDate) -> String {
    day.format("%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").expect("valid test timestamp")
    }

    #[test]
    fn week_runs_monday_through_sunday() {
        // 2026-10-16 is a Friday.
        let window = ReportWindow::resolve(Period::Week, at("2026-10-16 15:30:00"));

        assert_eq!(window.start, at("2026-10-12 00:00:00"));
        assert_eq!(window.end.date(), NaiveDate::from_ymd_opt(2026, 10, 18).expect("date"));
        assert_eq!(window.labels.len(), 7);
        assert_eq!(window.labels.first().map(String::as_str), Some("10-12"));
        assert_eq!(window.labels.last().map(String::as_str), Some("10-18"));
        assert!(window.contains(at("2026-10-18 23:59:59")));
        assert!(!window.contains(at("2026-10-19 00:00:00")));
    }

    #[test]
    fn sunday_belongs_to_the_week_that_started_on_monday() {
        let window = ReportWindow::resolve(Period::Week, at("2026-10-18 09:00:00"));
        assert_eq!(window.start, at("2026-10-12 00:00:00"));
    }

    #[test]
    fn month_labels_match_days_in_month() {
        let cases = [
            ("2026-02-10 12:00:00", 28),
            ("2028-02-29 12:00:00", 29),
            ("2026-04-01 00:00:00", 30),
            ("2026-12-31 23:00:00", 31),
        ];

        for (now, expected) in cases {
            let window = ReportWindow::resolve(Period::Month, at(now));
            assert_eq!(window.labels.len(), expected, "month of {now}");
            assert_eq!(window.day_count(), expected, "month of {now}");
            assert_eq!(window.labels[0], format!("{}-01", &now[5..7]));
        }
    }

    #[test]
    fn year_has_twelve_monthly_buckets() {
        let window = ReportWindow::resolve(Period::Year, at("2026-06-15 08:00:00"));

        assert_eq!(window.labels.len(), 12);
        assert_eq!(window.labels[0], "2026-01");
        assert_eq!(window.labels[11], "2026-12");
        assert_eq!(window.start, at("2026-01-01 00:00:00"));
        assert_eq!(window.day_count(), 365);
        assert_eq!(window.bucket_index(at("2026-03-31 23:00:00")), Some(2));
        assert_eq!(window.bucket_index(at("2026-12-31 23:59:59")), Some(11));
        assert_eq!(window.bucket_index(at("2027-01-01 00:00:00")), None);
    }

    #[test]
    fn unknown_period_token_falls_back_to_week() {
        assert_eq!(Period::parse("fortnight"), Period::Week);
        assert_eq!(Period::parse(" Month "), Period::Month);
        assert_eq!(Period::parse("year"), Period::Year);
    }

    #[test]
    fn bucket_index_uses_day_offsets_and_drops_outside_values() {
        let window = ReportWindow::resolve(Period::Week, at("2026-10-16 15:30:00"));

        assert_eq!(window.bucket_index(at("2026-10-12 00:00:00")), Some(0));
        assert_eq!(window.bucket_index(at("2026-10-14 23:59:59")), Some(2));
        assert_eq!(window.bucket_index(at("2026-10-11 23:59:59")), None);
        assert_eq!(window.bucket_index(at("2026-10-19 00:00:00")), None);
    }

    #[test]
    fn parses_supported_date_shapes() {
        assert_eq!(
            parse_record_date("2026-10-12"),
            Some(at("2026-10-12 00:00:00"))
        );
        assert_eq!(
            parse_record_date("2026-10-12 08:15:00"),
            Some(at("2026-10-12 08:15:00"))
        );
        assert_eq!(
            parse_record_date("2026-10-12T08:15:00"),
            Some(at("2026-10-12 08:15:00"))
        );
        assert!(parse_record_date("2026-10-12T08:15:00Z").is_some());
        assert_eq!(parse_record_date(""), None);
        assert_eq!(parse_record_date("not a date"), None);
    }
}
