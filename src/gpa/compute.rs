use tracing::debug;

use crate::error::{GpaError, Result};
use crate::gpa::types::{GpaCategory, GpaResult, PeriodFilter};
use crate::gpa::utility::round_half_even;
use crate::transcript::Transcript;

/// Computes one GPA from a loaded transcript.
///
/// Selects courses in `periods` (all courses when `None` or empty), drops
/// CR/NC grades, restricts to `category`, then divides the summed weighted
/// points by the summed credit hours. `round_to` rounds the point sum and
/// the GPA, never the credit hours, and only after summation.
///
/// # Errors
///
/// - [`GpaError::InvalidScale`] if `scale` is not one of the transcript's scales.
/// - [`GpaError::InvalidCategory`] unless `category` is `Overall`, `BCPM` or `AO`.
/// - [`GpaError::NoMatchingCourses`] if the selection carries zero credit hours.
pub fn compute(
    transcript: &Transcript,
    scale: &str,
    category: &str,
    periods: Option<&PeriodFilter>,
    round_to: Option<u32>,
) -> Result<GpaResult> {
    let scale_index = transcript.scales().index_of(scale)?;
    let category: GpaCategory = category.parse()?;
    compute_at(transcript, scale_index, category, periods, round_to)
}

/// [`compute`] with the scale and category already resolved.
pub(crate) fn compute_at(
    transcript: &Transcript,
    scale_index: usize,
    category: GpaCategory,
    periods: Option<&PeriodFilter>,
    round_to: Option<u32>,
) -> Result<GpaResult> {
    let scale_name = transcript
        .scales()
        .iter()
        .nth(scale_index)
        .map(|s| s.name().to_string())
        .ok_or_else(|| GpaError::InvalidScale(format!("#{scale_index}")))?;

    let (point_sum, credit_hours) = transcript
        .records()
        .iter()
        .filter(|r| periods.is_none_or(|f| f.matches(r.period.as_ref())))
        .filter(|r| r.grade.counts_toward_gpa())
        .filter(|r| category.includes(r.category))
        .try_fold((0.0, 0.0), |(points, hours), r| {
            let row_points = r
                .points(scale_index)
                .ok_or_else(|| GpaError::InvalidScale(scale_name.clone()))?;
            Ok::<_, GpaError>((points + row_points, hours + r.credit_hours))
        })?;

    if credit_hours == 0.0 {
        return Err(GpaError::NoMatchingCourses {
            scale: scale_name,
            category: category.to_string(),
        });
    }

    let gpa = point_sum / credit_hours;
    debug!(scale = %scale_name, %category, point_sum, credit_hours, gpa, "GPA computed");

    Ok(match round_to {
        Some(places) => GpaResult {
            point_sum: round_half_even(point_sum, places),
            credit_hours,
            gpa: round_half_even(gpa, places),
        },
        None => GpaResult {
            point_sum,
            credit_hours,
            gpa,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scales::ScaleSet;
    use crate::transcript::{LoadOptions, Period};

    fn load(csv: &str) -> Transcript {
        Transcript::from_reader(
            csv.as_bytes(),
            ScaleSet::builtin().unwrap(),
            &LoadOptions::default(),
        )
        .unwrap()
    }

    fn two_courses() -> Transcript {
        load("Credit_Hours,Grade,Type\n3,A,BCPM\n4,B+,AO\n")
    }

    #[test]
    fn test_overall_university() {
        let r = compute(&two_courses(), "University", "Overall", None, Some(3)).unwrap();
        assert_eq!(r.point_sum, 25.32);
        assert_eq!(r.credit_hours, 7.0);
        assert_eq!(r.gpa, 3.617);
    }

    #[test]
    fn test_bcpm_and_ao_university() {
        let t = two_courses();
        let bcpm = compute(&t, "University", "BCPM", None, Some(3)).unwrap();
        assert_eq!(bcpm.point_sum, 12.0);
        assert_eq!(bcpm.credit_hours, 3.0);
        assert_eq!(bcpm.gpa, 4.0);

        let ao = compute(&t, "University", "AO", None, Some(3)).unwrap();
        assert_eq!(ao.point_sum, 13.32);
        assert_eq!(ao.credit_hours, 4.0);
        assert_eq!(ao.gpa, 3.33);
    }

    #[test]
    fn test_unrounded_uses_exact_sums() {
        let r = compute(&two_courses(), "University", "Overall", None, None).unwrap();
        assert!((r.point_sum - 25.32).abs() < 1e-9);
        assert!((r.gpa - 25.32 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_tmdsas_collapses_plus_minus() {
        let r = compute(&two_courses(), "TMDSAS", "AO", None, None).unwrap();
        assert_eq!(r.gpa, 3.0);
    }

    #[test]
    fn test_invalid_scale() {
        let err = compute(&two_courses(), "Oxford", "Overall", None, None).unwrap_err();
        assert!(matches!(err, GpaError::InvalidScale(s) if s == "Oxford"));
    }

    #[test]
    fn test_invalid_category() {
        let err = compute(&two_courses(), "University", "Science", None, None).unwrap_err();
        assert!(matches!(err, GpaError::InvalidCategory(c) if c == "Science"));
    }

    #[test]
    fn test_no_bcpm_courses() {
        let t = load("Credit_Hours,Grade,Type\n3,A,AO\n");
        let err = compute(&t, "University", "BCPM", None, None).unwrap_err();
        assert!(matches!(err, GpaError::NoMatchingCourses { .. }));
    }

    #[test]
    fn test_zero_credit_courses_do_not_produce_nan() {
        let t = load("Credit_Hours,Grade,Type\n0,A,AO\n");
        let err = compute(&t, "AMCAS", "Overall", None, None).unwrap_err();
        assert!(matches!(err, GpaError::NoMatchingCourses { .. }));
    }

    #[test]
    fn test_credit_markers_are_ignored() {
        let with = load("Credit_Hours,Grade,Type\n3,A,BCPM\n4,B+,AO\n5,CR,AO\n2,NC,BCPM\n");
        let without = two_courses();
        for scale in ["University", "AMCAS", "TMDSAS"] {
            for category in ["Overall", "BCPM", "AO"] {
                assert_eq!(
                    compute(&with, scale, category, None, None).unwrap(),
                    compute(&without, scale, category, None, None).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_only_credit_markers_is_empty() {
        let t = load("Credit_Hours,Grade,Type\n3,CR,AO\n");
        assert!(matches!(
            compute(&t, "University", "AO", None, None),
            Err(GpaError::NoMatchingCourses { .. })
        ));
    }

    #[test]
    fn test_period_filter() {
        let t = load(
            "Year,Semester,Credit_Hours,Grade,Type\n\
             2018,Fall,3,A,BCPM\n\
             2018,Fall,3,C,AO\n\
             2019,Spring,4,B,BCPM\n\
             2019,Fall,2,F,AO\n",
        );
        let fall: PeriodFilter = [Period::new(2018, "Fall")].into_iter().collect();
        let r = compute(&t, "University", "Overall", Some(&fall), None).unwrap();
        assert_eq!(r.credit_hours, 6.0);
        assert_eq!(r.gpa, 3.0);

        let two: PeriodFilter = [Period::new(2018, "Fall"), Period::new(2019, "Spring")]
            .into_iter()
            .collect();
        let r = compute(&t, "University", "BCPM", Some(&two), None).unwrap();
        assert_eq!(r.credit_hours, 7.0);
        assert_eq!(r.point_sum, 24.0);
    }

    #[test]
    fn test_period_filter_with_no_matches() {
        let t = load("Year,Semester,Credit_Hours,Grade,Type\n2018,Fall,3,A,BCPM\n");
        let filter: PeriodFilter = [Period::new(2020, "Fall")].into_iter().collect();
        assert!(matches!(
            compute(&t, "University", "Overall", Some(&filter), None),
            Err(GpaError::NoMatchingCourses { .. })
        ));
    }

    #[test]
    fn test_period_filter_without_period_columns() {
        let filter: PeriodFilter = [Period::new(2018, "Fall")].into_iter().collect();
        assert!(matches!(
            compute(&two_courses(), "University", "Overall", Some(&filter), None),
            Err(GpaError::NoMatchingCourses { .. })
        ));
    }

    #[test]
    fn test_empty_period_filter_selects_everything() {
        let filter = PeriodFilter::new();
        let r = compute(&two_courses(), "University", "Overall", Some(&filter), None).unwrap();
        assert_eq!(r.credit_hours, 7.0);
    }

    #[test]
    fn test_gpa_within_scale_bounds() {
        let t = load(
            "Credit_Hours,Grade,Type\n\
             1,A+,BCPM\n2.5,D-,AO\n3,F,AO\n4,C+,BCPM\n0.5,B-,AO\n",
        );
        for scale in ["University", "AMCAS", "TMDSAS"] {
            for category in ["Overall", "BCPM", "AO"] {
                let r = compute(&t, scale, category, None, None).unwrap();
                assert!((0.0..=4.0).contains(&r.gpa), "{scale}/{category}: {}", r.gpa);
            }
        }
    }

    #[test]
    fn test_rounding_just_below_a_tie() {
        // (4.00 + 3.67) / 2 is stored just below 3.835.
        let t = load("Credit_Hours,Grade,Type\n1,A,BCPM\n1,A-,AO\n");
        let r = compute(&t, "University", "Overall", None, Some(2)).unwrap();
        assert_eq!(r.gpa, 3.83);
        assert_eq!(r.point_sum, 7.67);
    }

    #[test]
    fn test_unknown_scale_index() {
        let err = compute_at(&two_courses(), 3, GpaCategory::Overall, None, None).unwrap_err();
        assert!(matches!(err, GpaError::InvalidScale(_)));
    }

    #[test]
    fn test_rounding_leaves_credit_hours_alone() {
        let t = load("Credit_Hours,Grade,Type\n1.2345,A-,AO\n");
        let r = compute(&t, "University", "Overall", None, Some(1)).unwrap();
        assert_eq!(r.credit_hours, 1.2345);
        assert_eq!(r.gpa, 3.7);
    }
}
