use super::*;
use std::time::{SystemTime, UNIX_EPOCH};

const MS_PER_DAY: i64 = 86_400_000;

impl Page {
    pub(crate) fn stamp_footer_year(&mut self) -> Result<()> {
        let Some(year_el) = self.bindings.year else {
            return Ok(());
        };
        let year = self.config.current_year.unwrap_or_else(current_utc_year);
        self.dom.set_text_content(year_el, &year.to_string())?;
        Ok(())
    }
}

fn current_utc_year() -> i64 {
    let epoch_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0);
    year_from_epoch_ms(epoch_ms)
}

fn year_from_epoch_ms(epoch_ms: i64) -> i64 {
    let (year, _, _) = civil_from_days(epoch_ms.div_euclid(MS_PER_DAY));
    year
}

/// Proleptic Gregorian date for a day count relative to 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096).div_euclid(365);
    let mut year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2).div_euclid(153);
    let day = (doy - (153 * mp + 2).div_euclid(5) + 1) as u32;
    let month = (mp + if mp < 10 { 3 } else { -9 }) as u32;
    if month <= 2 {
        year += 1;
    }
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn civil_dates_around_epoch() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(-1), (1969, 12, 31));
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
    }

    #[test]
    fn year_boundary_uses_utc_days() {
        // 2024-12-31T23:59:59.999Z and 2025-01-01T00:00:00Z
        assert_eq!(year_from_epoch_ms(1_735_689_599_999), 2024);
        assert_eq!(year_from_epoch_ms(1_735_689_600_000), 2025);
    }

    #[test]
    fn configured_year_is_stamped() -> Result<()> {
        let config = PageConfig::new().with_current_year(2031);
        let page = Page::from_html_with_config(r#"<footer>© <span id="year"></span></footer>"#, config)?;
        page.assert_text("#year", "2031")?;
        Ok(())
    }

    #[test]
    fn clock_year_is_plausible() -> Result<()> {
        let page = Page::from_html(r#"<span id="year">2000</span>"#)?;
        let year = page.text("#year")?.parse::<i64>().map_err(|err| Error::Runtime(err.to_string()))?;
        assert!(year >= 2024, "year {year}");
        Ok(())
    }
}
