use tracing::{info, warn};

use crate::error::{GpaError, Result};
use crate::gpa::compute::compute_at;
use crate::gpa::types::{GpaCategory, GpaReport, GpaResult, OnEmpty, PeriodFilter, ScaleReport};
use crate::transcript::{Period, Transcript};

/// Computes every scale × category GPA into a [`GpaReport`].
///
/// Scales appear in configuration order, categories as Overall, BCPM, AO.
/// Cells with no courses are handled according to `on_empty`; with
/// [`OnEmpty::Omit`] a scale whose every cell was omitted is dropped too.
#[tracing::instrument(skip(transcript, periods), fields(periods = periods.map_or(0, PeriodFilter::len)))]
pub fn report(
    transcript: &Transcript,
    periods: Option<&PeriodFilter>,
    round_to: Option<u32>,
    on_empty: OnEmpty,
) -> Result<GpaReport> {
    let mut scales = Vec::with_capacity(transcript.scales().len());

    for (scale_index, scale) in transcript.scales().iter().enumerate() {
        let mut categories = Vec::with_capacity(GpaCategory::ALL.len());

        for category in GpaCategory::ALL {
            match compute_at(transcript, scale_index, category, periods, round_to) {
                Ok(result) => categories.push((category, result)),
                Err(GpaError::NoMatchingCourses { .. }) if on_empty != OnEmpty::Fail => {
                    warn!(scale = scale.name(), %category, ?on_empty, "No matching courses");
                    if on_empty == OnEmpty::Zero {
                        categories.push((category, GpaResult::ZERO));
                    }
                }
                Err(e) => return Err(e),
            }
        }

        if !categories.is_empty() {
            scales.push(ScaleReport {
                scale: scale.name().to_string(),
                categories,
            });
        }
    }

    info!(scales = scales.len(), "GPA report assembled");
    Ok(GpaReport { scales })
}

/// One report per period in the transcript, in first-appearance order.
pub fn report_by_period(
    transcript: &Transcript,
    round_to: Option<u32>,
    on_empty: OnEmpty,
) -> Result<Vec<(Period, GpaReport)>> {
    transcript
        .periods()
        .into_iter()
        .map(|period| {
            let filter: PeriodFilter = std::iter::once(period.clone()).collect();
            report(transcript, Some(&filter), round_to, on_empty).map(|r| (period, r))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scales::ScaleSet;
    use crate::transcript::LoadOptions;

    fn load(csv: &str) -> Transcript {
        Transcript::from_reader(
            csv.as_bytes(),
            ScaleSet::builtin().unwrap(),
            &LoadOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_full_cross_product_in_order() {
        let t = load("Credit_Hours,Grade,Type\n3,A,BCPM\n4,B+,AO\n");
        let r = report(&t, None, Some(3), OnEmpty::Fail).unwrap();

        let scales: Vec<_> = r.scales.iter().map(|s| s.scale.as_str()).collect();
        assert_eq!(scales, vec!["University", "AMCAS", "TMDSAS"]);
        for s in &r.scales {
            let cats: Vec<_> = s.categories.iter().map(|(c, _)| *c).collect();
            assert_eq!(cats, GpaCategory::ALL.to_vec());
        }

        assert_eq!(r.get("University", GpaCategory::Overall).unwrap().gpa, 3.617);
        assert_eq!(r.get("AMCAS", GpaCategory::Ao).unwrap().gpa, 3.3);
        assert_eq!(r.get("TMDSAS", GpaCategory::Overall).unwrap().point_sum, 24.0);
    }

    #[test]
    fn test_empty_cell_fails_by_default() {
        let t = load("Credit_Hours,Grade,Type\n3,A,AO\n");
        assert!(matches!(
            report(&t, None, None, OnEmpty::Fail),
            Err(GpaError::NoMatchingCourses { category, .. }) if category == "BCPM"
        ));
    }

    #[test]
    fn test_empty_cell_zero() {
        let t = load("Credit_Hours,Grade,Type\n3,A,AO\n");
        let r = report(&t, None, None, OnEmpty::Zero).unwrap();
        assert_eq!(r.get("AMCAS", GpaCategory::Bcpm), Some(&GpaResult::ZERO));
        assert_eq!(r.get("AMCAS", GpaCategory::Ao).unwrap().gpa, 4.0);
    }

    #[test]
    fn test_empty_cell_omit() {
        let t = load("Credit_Hours,Grade,Type\n3,A,AO\n");
        let r = report(&t, None, None, OnEmpty::Omit).unwrap();
        assert_eq!(r.scales.len(), 3);
        assert!(r.get("University", GpaCategory::Bcpm).is_none());
        assert_eq!(r.scales[0].categories.len(), 2);
    }

    #[test]
    fn test_omit_drops_empty_scales() {
        let t = load("Year,Semester,Credit_Hours,Grade,Type\n2018,Fall,3,A,AO\n");
        let filter: PeriodFilter = [Period::new(2030, "Fall")].into_iter().collect();
        let r = report(&t, Some(&filter), None, OnEmpty::Omit).unwrap();
        assert!(r.is_empty());
    }

    #[test]
    fn test_report_is_deterministic() {
        let t = load("Credit_Hours,Grade,Type\n3,A-,BCPM\n4,C+,AO\n2,CR,AO\n");
        let a = serde_json::to_string(&report(&t, None, Some(3), OnEmpty::Fail).unwrap()).unwrap();
        let b = serde_json::to_string(&report(&t, None, Some(3), OnEmpty::Fail).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_report_by_period() {
        let t = load(
            "Year,Semester,Credit_Hours,Grade,Type\n\
             2018,Fall,3,A,BCPM\n\
             2019,Spring,4,B,AO\n",
        );
        let reports = report_by_period(&t, Some(3), OnEmpty::Zero).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].0, Period::new(2018, "Fall"));
        assert_eq!(reports[0].1.get("University", GpaCategory::Overall).unwrap().gpa, 4.0);
        assert_eq!(reports[1].1.get("University", GpaCategory::Overall).unwrap().gpa, 3.0);
        assert_eq!(
            reports[1].1.get("University", GpaCategory::Bcpm),
            Some(&GpaResult::ZERO)
        );
    }
}
